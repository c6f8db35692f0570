//! Canonical request construction for AWS Signature Version 4.
//!
//! The canonical request is the structured string both the client and the
//! server hash and sign:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Each component is normalized per the AWS rules. Two details matter for
//! compatibility with real clients:
//!
//! - Multiple consecutive slashes in the URI path are preserved, because the
//!   client signed them as they appear.
//! - Query string values are kept exactly as the client sent them rather
//!   than being decoded and re-encoded; different SDKs disagree on which
//!   characters to percent-encode and the server must match whatever was
//!   signed.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters percent-encoded in URI path segments: everything except the
/// RFC 3986 unreserved set.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the full canonical request string.
#[must_use]
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    query_string: &str,
    headers: &[(&str, &str)],
    signed_headers: &[&str],
    payload_hash: &str,
) -> String {
    let canonical_uri = build_canonical_uri(uri);
    let canonical_query = build_canonical_query_string(query_string);
    let canonical_headers = build_canonical_headers(headers, signed_headers);
    let signed_headers_str = build_signed_headers_string(signed_headers);

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers_str}\n{payload_hash}"
    )
}

/// Canonicalize the URI path: each segment is decoded then re-encoded with
/// the SigV4 encode set. Slashes separate segments and are never encoded;
/// empty segments (from `//`) survive, so multiple slashes are preserved.
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            // Decode then re-encode so an already-encoded path does not get
            // double-encoded.
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            uri_encode(&decoded)
        })
        .collect::<Vec<String>>()
        .join("/")
}

/// Percent-encode a string with the SigV4 URI encode set.
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Canonicalize a raw query string: parameters sorted by key, then by value
/// for duplicate keys, joined with `&`. Keys and values are preserved
/// byte-for-byte as the client sent them.
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    build_canonical_query_string_except(query, &[])
}

/// Like [`build_canonical_query_string`], but with the named parameters
/// removed. Presigned verification excludes `X-Amz-Signature` this way.
#[must_use]
pub fn build_canonical_query_string_except(query: &str, exclude: &[&str]) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut pairs: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .filter(|(key, _)| !exclude.contains(key))
        .collect();

    pairs.sort_unstable();

    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<String>>()
        .join("&")
}

/// Build the canonical headers block: for each signed header, the lowercase
/// name, a colon, and the trimmed value, one per line. The signed-header
/// list determines order, so the caller must pass it sorted (AWS clients
/// always do).
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], signed_headers: &[&str]) -> String {
    signed_headers
        .iter()
        .filter_map(|name| {
            headers
                .iter()
                .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
                .map(|(_, value)| format!("{}:{}", name.to_ascii_lowercase(), value.trim()))
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// Join the signed header names with semicolons.
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    signed_headers.join(";")
}
