//! User-metadata capture from requests.
//!
//! An object's metadata is the set of request headers whose names start
//! with `x-amz-` or `content-`, plus `cache-control`, augmented with a
//! server-stamped `last-modified`. Browser-upload form fields go through
//! the same filter. Total size (keys plus values) is bounded by the
//! configured limit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use mocks3_model::{S3Error, S3ErrorCode};

/// The metadata key carrying the server-stamped modification time.
pub const LAST_MODIFIED_KEY: &str = "last-modified";

/// Format a timestamp the way S3 stamps `Last-Modified` headers:
/// `Mon, 02 Jan 2006 15:04:05 GMT`.
#[must_use]
pub fn format_header_time(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Whether a header (or form field) name is captured as user metadata.
fn is_metadata_key(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("x-amz-") || lower.starts_with("content-") || lower == "cache-control"
}

/// Capture user metadata from request headers.
///
/// # Errors
///
/// Returns `MetadataTooLarge` when the captured set exceeds `size_limit`
/// bytes (a zero limit disables the check).
pub fn metadata_headers(
    headers: &http::HeaderMap,
    at: DateTime<Utc>,
    size_limit: usize,
) -> Result<HashMap<String, String>, S3Error> {
    let pairs = headers.iter().filter_map(|(name, value)| {
        let name = name.as_str();
        if is_metadata_key(name) {
            value.to_str().ok().map(|v| (name.to_owned(), v.to_owned()))
        } else {
            None
        }
    });
    collect_metadata(pairs, at, size_limit)
}

/// Capture user metadata from browser-upload form fields.
///
/// # Errors
///
/// Returns `MetadataTooLarge` when the captured set exceeds `size_limit`.
pub fn metadata_from_fields(
    fields: &[(String, String)],
    at: DateTime<Utc>,
    size_limit: usize,
) -> Result<HashMap<String, String>, S3Error> {
    let pairs = fields.iter().filter_map(|(name, value)| {
        if is_metadata_key(name) {
            Some((name.to_ascii_lowercase(), value.clone()))
        } else {
            None
        }
    });
    collect_metadata(pairs, at, size_limit)
}

fn collect_metadata(
    pairs: impl Iterator<Item = (String, String)>,
    at: DateTime<Utc>,
    size_limit: usize,
) -> Result<HashMap<String, String>, S3Error> {
    let mut meta: HashMap<String, String> = pairs.collect();
    meta.insert(LAST_MODIFIED_KEY.to_owned(), format_header_time(at));

    if size_limit > 0 && metadata_size(&meta) > size_limit {
        return Err(S3Error::new(S3ErrorCode::MetadataTooLarge));
    }

    Ok(meta)
}

/// Total size of a metadata set: the sum of key and value lengths.
#[must_use]
pub fn metadata_size(meta: &HashMap<String, String>) -> usize {
    meta.iter().map(|(k, v)| k.len() + v.len()).sum()
}
