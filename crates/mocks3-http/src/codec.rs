//! Decoder for the AWS streaming-chunk body framing.
//!
//! Clients that sign payloads progressively declare
//! `x-amz-content-sha256: STREAMING-AWS4-HMAC-SHA256-PAYLOAD` (or
//! `Content-Encoding: aws-chunked`) and frame the body as:
//!
//! ```text
//! <hex-size>;chunk-signature=<hex>\r\n
//! <data>\r\n
//! ...
//! 0;chunk-signature=<hex>\r\n
//! \r\n
//! ```
//!
//! The chunk signatures are parsed structurally but not verified; the outer
//! request signature already authenticated the sender, and verifying the
//! chain adds nothing for a gateway that stores the decoded payload. The
//! decoded length is validated by the caller against
//! `x-amz-decoded-content-length`.

use bytes::{Bytes, BytesMut};

use mocks3_model::{S3Error, S3ErrorCode};

/// The payload-hash literal marking a streaming-signed body.
pub const STREAMING_SHA256_PAYLOAD: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD";

/// Whether the request body uses the AWS chunked framing.
#[must_use]
pub fn is_aws_chunked(parts: &http::request::Parts) -> bool {
    if let Some(encoding) = parts.headers.get(http::header::CONTENT_ENCODING) {
        if encoding
            .to_str()
            .is_ok_and(|s| s.contains("aws-chunked"))
        {
            return true;
        }
    }

    parts
        .headers
        .get("x-amz-content-sha256")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|s| s.starts_with("STREAMING-"))
}

/// Decode an AWS-chunked body into the raw payload.
///
/// # Errors
///
/// Returns `IncompleteBody` when the framing is malformed or truncated.
pub fn decode_aws_chunked(body: &[u8]) -> Result<Bytes, S3Error> {
    let mut output = BytesMut::with_capacity(body.len());
    let mut pos = 0;

    loop {
        let line_end = find_crlf(body, pos).ok_or_else(|| {
            chunk_error("missing chunk size line")
        })?;
        let size_line = &body[pos..line_end];

        // "<hex-size>[;chunk-signature=<sig>]" — extensions after the first
        // semicolon are parsed off and ignored.
        let hex_part = size_line
            .iter()
            .position(|&b| b == b';')
            .map_or(size_line, |semi| &size_line[..semi]);

        let hex_str = std::str::from_utf8(hex_part)
            .map_err(|_| chunk_error("chunk size is not valid UTF-8"))?;
        let chunk_size = usize::from_str_radix(hex_str.trim(), 16)
            .map_err(|_| chunk_error("chunk size is not valid hex"))?;

        pos = line_end + 2;

        if chunk_size == 0 {
            // Terminal chunk.
            break;
        }

        if pos + chunk_size > body.len() {
            return Err(chunk_error("chunk data truncated"));
        }
        output.extend_from_slice(&body[pos..pos + chunk_size]);
        pos += chunk_size;

        if pos + 2 > body.len() || body[pos] != b'\r' || body[pos + 1] != b'\n' {
            return Err(chunk_error("missing CRLF after chunk data"));
        }
        pos += 2;
    }

    Ok(output.freeze())
}

fn chunk_error(detail: &str) -> S3Error {
    S3Error::with_message(
        S3ErrorCode::IncompleteBody,
        format!("malformed aws-chunked body: {detail}"),
    )
}

/// Find the next `\r\n` at or after `start`.
fn find_crlf(data: &[u8], start: usize) -> Option<usize> {
    (start..data.len().saturating_sub(1)).find(|&i| data[i] == b'\r' && data[i + 1] == b'\n')
}
