//! Bucket-name and key validation.

use mocks3_model::{S3Error, S3ErrorCode};

/// Maximum object key length in bytes.
pub const KEY_SIZE_LIMIT: usize = 1024;

/// Validate a bucket name against the DNS-label rules S3 enforces:
/// 3–63 characters of lowercase letters, digits, `-`, and `.`; no leading
/// or trailing `-` or `.`; not an IPv4 literal.
///
/// # Errors
///
/// Returns `InvalidBucketName` describing the violated rule.
pub fn validate_bucket_name(name: &str) -> Result<(), S3Error> {
    if name.len() < 3 || name.len() > 63 {
        return Err(invalid_name(name, "must be between 3 and 63 characters"));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid_name(
            name,
            "may only contain lowercase letters, digits, hyphens, and dots",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[name.len() - 1];
    if first == b'-' || first == b'.' || last == b'-' || last == b'.' {
        return Err(invalid_name(
            name,
            "must start and end with a letter or digit",
        ));
    }

    if is_ipv4_literal(name) {
        return Err(invalid_name(name, "must not be formatted as an IP address"));
    }

    Ok(())
}

/// Validate an object key's length.
///
/// # Errors
///
/// Returns `KeyTooLong` when the key exceeds [`KEY_SIZE_LIMIT`] bytes.
pub fn validate_key(key: &str) -> Result<(), S3Error> {
    if key.len() > KEY_SIZE_LIMIT {
        return Err(S3Error::resource_error(S3ErrorCode::KeyTooLong, key));
    }
    Ok(())
}

fn invalid_name(name: &str, reason: &str) -> S3Error {
    S3Error::with_message(
        S3ErrorCode::InvalidBucketName,
        format!("invalid bucket name {name:?}: {reason}"),
    )
}

fn is_ipv4_literal(name: &str) -> bool {
    let octets: Vec<&str> = name.split('.').collect();
    octets.len() == 4
        && octets
            .iter()
            .all(|octet| !octet.is_empty() && octet.chars().all(|c| c.is_ascii_digit()))
}
