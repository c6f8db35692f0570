//! Per-operation handlers, grouped the way the API groups them.
//!
//! Each module adds methods to [`MockS3`](crate::provider::MockS3):
//! bucket CRUD and versioning configuration in [`bucket`], object listings
//! in [`list`], object CRUD in [`object`], and the multipart operations in
//! [`multipart`].

mod bucket;
mod list;
mod multipart;
mod object;

use mocks3_model::{S3Error, S3ErrorCode};

/// Parse an optional integer query parameter, clamping the result to
/// `0..=max` and substituting `default` when the parameter is absent or
/// empty.
pub(crate) fn parse_clamped(value: Option<&str>, default: u64, max: u64) -> Result<u64, S3Error> {
    match value {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse::<u64>()
            .map(|parsed| parsed.min(max))
            .map_err(|_| {
                S3Error::with_message(
                    S3ErrorCode::InvalidArgument,
                    format!("expected an integer, got {raw:?}"),
                )
            }),
    }
}
