//! `Range` header parsing and resolution.
//!
//! The gateway accepts the single-range forms S3 supports: `bytes=a-b`
//! (inclusive), `bytes=a-` (open end), and `bytes=-n` (suffix). A parsed
//! [`ObjectRangeRequest`] resolves against a concrete object size into an
//! [`ObjectRange`], which backends apply when slicing the body.

use mocks3_model::{S3Error, S3ErrorCode};

/// A parsed but not yet size-resolved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRangeRequest {
    /// Start offset, or the suffix length when `from_end` is set.
    pub start: u64,
    /// Inclusive end offset; `None` leaves the range open.
    pub end: Option<u64>,
    /// Whether this is a `bytes=-n` suffix request.
    pub from_end: bool,
}

/// A concrete byte range within an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRange {
    /// First byte offset.
    pub start: u64,
    /// Number of bytes.
    pub length: u64,
}

impl ObjectRange {
    /// The `Content-Range` header value for this range of an object of
    /// `size` bytes.
    #[must_use]
    pub fn content_range(&self, size: u64) -> String {
        let end = self.start + self.length.saturating_sub(1);
        format!("bytes {}-{end}/{size}", self.start)
    }
}

/// Parse a `Range` header value. Absent or empty headers mean no range.
///
/// # Errors
///
/// Returns `InvalidRange` for anything but a single well-formed
/// `bytes=`-range.
pub fn parse_range_header(header: Option<&str>) -> Result<Option<ObjectRangeRequest>, S3Error> {
    let Some(header) = header.filter(|h| !h.is_empty()) else {
        return Ok(None);
    };

    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(|| invalid_range(header))?;

    // Multiple ranges are not supported.
    if spec.contains(',') {
        return Err(invalid_range(header));
    }

    let (start_raw, end_raw) = spec.split_once('-').ok_or_else(|| invalid_range(header))?;

    let request = match (start_raw.is_empty(), end_raw.is_empty()) {
        // bytes=-n
        (true, false) => ObjectRangeRequest {
            start: parse_offset(end_raw, header)?,
            end: None,
            from_end: true,
        },
        // bytes=a-
        (false, true) => ObjectRangeRequest {
            start: parse_offset(start_raw, header)?,
            end: None,
            from_end: false,
        },
        // bytes=a-b
        (false, false) => {
            let start = parse_offset(start_raw, header)?;
            let end = parse_offset(end_raw, header)?;
            if end < start {
                return Err(invalid_range(header));
            }
            ObjectRangeRequest {
                start,
                end: Some(end),
                from_end: false,
            }
        }
        (true, true) => return Err(invalid_range(header)),
    };

    Ok(Some(request))
}

impl ObjectRangeRequest {
    /// Resolve the request against an object of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when the range does not overlap the object.
    pub fn resolve(&self, size: u64) -> Result<ObjectRange, S3Error> {
        if self.from_end {
            // bytes=-n: the last n bytes, clamped to the object.
            let length = self.start.min(size);
            return Ok(ObjectRange {
                start: size - length,
                length,
            });
        }

        if self.start >= size {
            return Err(S3Error::new(S3ErrorCode::InvalidRange));
        }

        let end = self.end.map_or(size - 1, |end| end.min(size - 1));
        Ok(ObjectRange {
            start: self.start,
            length: end - self.start + 1,
        })
    }
}

fn parse_offset(raw: &str, header: &str) -> Result<u64, S3Error> {
    raw.parse().map_err(|_| invalid_range(header))
}

fn invalid_range(header: &str) -> S3Error {
    S3Error::with_message(
        S3ErrorCode::InvalidRange,
        format!("invalid range specification: {header}"),
    )
}
