//! MD5 hashing for ETags and `Content-MD5` verification.
//!
//! Every stored body gets an MD5 for its ETag regardless of the integrity
//! setting. Multipart objects carry the composite form
//! `"hex(MD5(MD5(p1) ∥ … ∥ MD5(pn)))-n"`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use digest::Digest;

use mocks3_model::{S3Error, S3ErrorCode};

/// Raw MD5 digest of a body.
#[must_use]
pub fn compute_md5(data: &[u8]) -> Vec<u8> {
    md5::Md5::digest(data).to_vec()
}

/// Unquoted hex MD5 of a body.
#[must_use]
pub fn compute_md5_hex(data: &[u8]) -> String {
    hex::encode(md5::Md5::digest(data))
}

/// Quoted single-part ETag for a body.
///
/// # Examples
///
/// ```
/// use mocks3_core::checksums::compute_etag;
///
/// assert_eq!(
///     compute_etag(b"Hello, world\n"),
///     "\"a7966bf58e23583c9a5a4059383ff850\"",
/// );
/// ```
#[must_use]
pub fn compute_etag(data: &[u8]) -> String {
    format!("\"{}\"", compute_md5_hex(data))
}

/// Quoted multipart ETag: the MD5 of the concatenated binary part digests,
/// suffixed with the part count.
///
/// Each entry of `part_md5_hexes` is the unquoted hex MD5 of one part, in
/// part-number order.
#[must_use]
pub fn compute_multipart_etag(part_md5_hexes: &[impl AsRef<str>], part_count: usize) -> String {
    let mut combined = Vec::with_capacity(part_md5_hexes.len() * 16);
    for part in part_md5_hexes {
        if let Ok(raw) = hex::decode(part.as_ref()) {
            combined.extend_from_slice(&raw);
        }
    }
    let final_md5 = hex::encode(md5::Md5::digest(&combined));
    format!("\"{final_md5}-{part_count}\"")
}

/// Verify a base64 `Content-MD5` header value against the received body.
///
/// # Errors
///
/// Returns `InvalidDigest` when the header does not decode to an MD5 and
/// `BadDigest` when the decoded digest does not match the body.
pub fn verify_content_md5(data: &[u8], content_md5: &str) -> Result<(), S3Error> {
    let expected = BASE64
        .decode(content_md5)
        .map_err(|_| S3Error::new(S3ErrorCode::InvalidDigest))?;
    if expected.len() != 16 {
        return Err(S3Error::new(S3ErrorCode::InvalidDigest));
    }

    if expected == compute_md5(data) {
        Ok(())
    } else {
        Err(S3Error::new(S3ErrorCode::BadDigest))
    }
}
