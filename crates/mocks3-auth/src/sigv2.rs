//! Legacy AWS Signature Version 2 verification.
//!
//! The SigV2 `Authorization` header has the form `AWS <AccessKeyId>:<Signature>`
//! with `Signature = Base64(HMAC-SHA1(SecretKey, StringToSign))` over:
//!
//! ```text
//! HTTP-Verb + "\n" +
//! Content-MD5 + "\n" +
//! Content-Type + "\n" +
//! Date + "\n" +
//! CanonicalizedAmzHeaders +
//! CanonicalizedResource
//! ```
//!
//! Old SDKs and a few third-party clients still send this scheme, so the
//! gateway accepts it as a fallback when the V4 verifier reports an
//! unsupported algorithm.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AuthError;
use crate::keystore::KeyStore;

type HmacSha1 = Hmac<Sha1>;

/// Whether the `Authorization` header uses the SigV2 format.
#[must_use]
pub fn is_sigv2(auth_header: &str) -> bool {
    auth_header.starts_with("AWS ") && !auth_header.starts_with("AWS4-")
}

/// Verify a SigV2-signed request.
///
/// # Errors
///
/// Returns an [`AuthError`] when the header is malformed, the access key is
/// unknown, or the signature does not match.
pub fn verify_header(parts: &http::request::Parts, keys: &KeyStore) -> Result<String, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AuthError::MissingFields("Authorization header".to_owned()))?;

    let (access_key_id, provided) = parse_sigv2_header(auth_header)?;

    let secret_key = keys
        .secret_key(&access_key_id)
        .ok_or_else(|| AuthError::InvalidAccessKeyId(access_key_id.clone()))?;

    let string_to_sign = build_string_to_sign(parts);
    debug!(?string_to_sign, "built SigV2 string to sign");

    let expected = compute_signature(&secret_key, &string_to_sign);

    if expected.as_bytes().ct_eq(provided.as_bytes()).into() {
        Ok(access_key_id)
    } else {
        debug!(%expected, %provided, "SigV2 signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

/// Compute a SigV2 signature: Base64 of HMAC-SHA1 over the string to sign.
#[must_use]
pub fn compute_signature(secret_key: &str, string_to_sign: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Parse `AWS <AccessKeyId>:<Signature>`.
fn parse_sigv2_header(header: &str) -> Result<(String, String), AuthError> {
    let rest = header
        .strip_prefix("AWS ")
        .ok_or(AuthError::AccessDenied)?;

    let (access_key_id, signature) = rest
        .split_once(':')
        .ok_or_else(|| AuthError::MissingFields("SigV2 signature".to_owned()))?;

    if access_key_id.is_empty() || signature.is_empty() {
        return Err(AuthError::MissingFields("SigV2 credentials".to_owned()));
    }

    Ok((access_key_id.to_owned(), signature.to_owned()))
}

/// Build the SigV2 string to sign from the request.
fn build_string_to_sign(parts: &http::request::Parts) -> String {
    let method = parts.method.as_str();
    let content_md5 = header_or_empty(parts, "content-md5");
    let content_type = header_or_empty(parts, "content-type");

    // When x-amz-date is present, the Date field in the string to sign is
    // empty; the timestamp is carried by the canonicalized amz headers.
    let date = if parts.headers.contains_key("x-amz-date") {
        String::new()
    } else {
        header_or_empty(parts, "date")
    };

    let amz_headers = build_canonicalized_amz_headers(parts);
    let resource = build_canonicalized_resource(parts);

    format!("{method}\n{content_md5}\n{content_type}\n{date}\n{amz_headers}{resource}")
}

/// Sort and fold all `x-amz-*` headers into `name:value\n` lines.
fn build_canonicalized_amz_headers(parts: &http::request::Parts) -> String {
    let mut amz_headers: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, value) in &parts.headers {
        let name = name.as_str();
        if name.starts_with("x-amz-") {
            let value = value.to_str().unwrap_or("").trim().to_owned();
            amz_headers.entry(name.to_owned()).or_default().push(value);
        }
    }

    let mut result = String::new();
    for (name, values) in &amz_headers {
        result.push_str(name);
        result.push(':');
        result.push_str(&values.join(","));
        result.push('\n');
    }
    result
}

/// The canonicalized resource: the raw path plus the S3 sub-resource query
/// keys that participate in signing.
fn build_canonicalized_resource(parts: &http::request::Parts) -> String {
    const SIGNED_SUBRESOURCES: &[&str] = &[
        "acl",
        "delete",
        "location",
        "partNumber",
        "uploadId",
        "uploads",
        "versionId",
        "versioning",
        "versions",
    ];

    let mut resource = parts.uri.path().to_owned();

    let query = parts.uri.query().unwrap_or("");
    let mut signed: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            SIGNED_SUBRESOURCES.contains(&key)
        })
        .collect();
    signed.sort_unstable();

    if !signed.is_empty() {
        resource.push('?');
        resource.push_str(&signed.join("&"));
    }

    resource
}

/// Read a header value, defaulting to the empty string.
fn header_or_empty(parts: &http::request::Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned()
}
