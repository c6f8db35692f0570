//! AWS signature verification for the mocks3 gateway.
//!
//! This crate verifies inbound requests against AWS Signature Version 4
//! (header-signed and presigned) with a fallback to the legacy Signature
//! Version 2 scheme:
//!
//! - **Canonicalization** ([`canonical`]): canonical request construction —
//!   URI encoding with multiple slashes preserved, sorted query strings,
//!   canonical headers.
//! - **SigV4** ([`sigv4`]): `Authorization`-header verification, signing-key
//!   derivation, and the ±15 minute request-time window.
//! - **Presigned URLs** ([`presigned`]): query-parameter verification with
//!   `X-Amz-Expires` expiry checking.
//! - **SigV2** ([`sigv2`]): the legacy `AWS <key>:<sig>` HMAC-SHA1 scheme.
//! - **Key management** ([`keystore`]): the process-wide access-key table
//!   behind a readers/writer lock.
//!
//! The top-level entry point is [`verify_request`], which picks the right
//! scheme and runs the V4 → V2 fallback. All time reads go through the
//! caller-supplied clock so tests can freeze time.

pub mod canonical;
pub mod error;
pub mod keystore;
pub mod presigned;
pub mod sigv2;
pub mod sigv4;

use chrono::{DateTime, Utc};

pub use error::AuthError;
pub use keystore::KeyStore;

/// Verify an inbound request against the registered auth keys.
///
/// Scheme selection:
///
/// 1. Requests carrying `X-Amz-Algorithm` in the query string verify as
///    presigned V4 URLs.
/// 2. Otherwise the `Authorization` header verifies as SigV4.
/// 3. If either path reports an unsupported algorithm, verification falls
///    back to SigV2.
///
/// Returns the verified access key ID on success.
///
/// # Errors
///
/// Returns an [`AuthError`] describing why verification failed; callers map
/// it onto the S3 error taxonomy via [`AuthError::into_s3_error`].
pub fn verify_request(
    parts: &http::request::Parts,
    body: &[u8],
    keys: &KeyStore,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let query = parts.uri.query().unwrap_or("");

    let v4_result = if query.contains("X-Amz-Algorithm") {
        presigned::verify_presigned(parts, keys, now)
    } else {
        sigv4::verify_header(parts, body, keys, now)
    };

    match v4_result {
        Err(AuthError::UnsupportedAlgorithm(_)) => sigv2::verify_header(parts, keys),
        other => other,
    }
}
