//! `multipart/form-data` parsing for browser-based POST uploads.
//!
//! S3's POST Object operation accepts an HTML form: metadata fields first,
//! then exactly one `file` part. This parser works over the collected body
//! bytes; the handler validates field cardinality (one `key`, one file) and
//! treats the remaining fields as metadata sources.

use bytes::Bytes;

use mocks3_model::{S3Error, S3ErrorCode};

/// A parsed multipart form submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    /// Non-file fields in document order, duplicates preserved.
    pub fields: Vec<(String, String)>,
    /// Every file part found, in document order.
    pub files: Vec<FilePart>,
}

/// One file part of a multipart form.
#[derive(Debug)]
pub struct FilePart {
    /// The part's field name (normally `file`).
    pub name: String,
    /// The client-side filename, when given.
    pub filename: Option<String>,
    /// The part's `Content-Type`, when given.
    pub content_type: Option<String>,
    /// The file bytes.
    pub data: Bytes,
}

impl MultipartForm {
    /// All values submitted for a field name.
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Extract the boundary from a `multipart/form-data` Content-Type.
///
/// # Errors
///
/// Returns `MalformedPOSTRequest` when the Content-Type is absent, not
/// multipart, or missing its boundary.
pub fn extract_boundary(content_type: &str) -> Result<String, S3Error> {
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return Err(S3Error::new(S3ErrorCode::MalformedPOSTRequest));
    }

    for part in content_type.split(';') {
        if let Some(value) = part.trim().strip_prefix("boundary=") {
            let boundary = value.trim_matches('"');
            if !boundary.is_empty() {
                return Ok(boundary.to_owned());
            }
        }
    }

    Err(S3Error::new(S3ErrorCode::MalformedPOSTRequest))
}

/// Parse a multipart body into fields and file parts.
///
/// # Errors
///
/// Returns `MalformedPOSTRequest` when the body does not follow the
/// multipart framing.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<MultipartForm, S3Error> {
    let delimiter = format!("--{boundary}");
    let mut form = MultipartForm::default();

    for part in split_parts(body, delimiter.as_bytes()) {
        let (header_block, content) = split_headers_body(part)
            .ok_or_else(|| S3Error::new(S3ErrorCode::MalformedPOSTRequest))?;

        let disposition = parse_content_disposition(header_block);
        let Some(name) = disposition.name else {
            return Err(S3Error::new(S3ErrorCode::MalformedPOSTRequest));
        };

        if name == "file" || disposition.filename.is_some() {
            form.files.push(FilePart {
                name,
                filename: disposition.filename,
                content_type: parse_part_content_type(header_block),
                data: Bytes::copy_from_slice(content),
            });
        } else {
            form.fields
                .push((name, String::from_utf8_lossy(content).into_owned()));
        }
    }

    Ok(form)
}

/// Split the body into part slices between boundary delimiters, stripping
/// the leading CRLF each part carries and the trailing CRLF before the next
/// delimiter.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut pos = 0;

    while let Some(found) = find(body, delimiter, pos) {
        let content_start = found + delimiter.len();

        // "--" after the delimiter closes the stream.
        if body[content_start..].starts_with(b"--") {
            break;
        }
        // Skip the CRLF that follows the delimiter line.
        let content_start = if body[content_start..].starts_with(b"\r\n") {
            content_start + 2
        } else {
            content_start
        };

        let Some(next) = find(body, delimiter, content_start) else {
            break;
        };
        // Trim the CRLF immediately before the next delimiter.
        let content_end = next.saturating_sub(2).max(content_start);
        parts.push(&body[content_start..content_end]);
        pos = next;
    }

    parts
}

/// Split one part into its header block and content.
fn split_headers_body(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let split_at = find(part, b"\r\n\r\n", 0)?;
    Some((&part[..split_at], &part[split_at + 4..]))
}

#[derive(Debug, Default)]
struct ContentDisposition {
    name: Option<String>,
    filename: Option<String>,
}

/// Parse the `Content-Disposition` header of one part.
fn parse_content_disposition(header_block: &[u8]) -> ContentDisposition {
    let mut result = ContentDisposition::default();

    for line in header_lines(header_block) {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        if !header.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        for param in value.split(';') {
            let param = param.trim();
            if let Some(v) = param.strip_prefix("name=") {
                result.name = Some(v.trim_matches('"').to_owned());
            } else if let Some(v) = param.strip_prefix("filename=") {
                result.filename = Some(v.trim_matches('"').to_owned());
            }
        }
    }

    result
}

/// Parse the `Content-Type` header of one part, when present.
fn parse_part_content_type(header_block: &[u8]) -> Option<String> {
    for line in header_lines(header_block) {
        let (header, value) = line.split_once(':')?;
        if header.trim().eq_ignore_ascii_case("content-type") {
            return Some(value.trim().to_owned());
        }
    }
    None
}

fn header_lines(block: &[u8]) -> impl Iterator<Item = &str> {
    block
        .split(|&b| b == b'\n')
        .filter_map(|line| std::str::from_utf8(line).ok())
        .map(|line| line.trim_end_matches('\r'))
}

/// Find `needle` in `haystack` at or after `start`.
fn find(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || start >= haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|found| start + found)
}
