//! Response construction helpers.
//!
//! All XML responses carry `Content-Type: application/xml`. Errors render as
//! the standard `<Error>` body except on HEAD requests, which carry the
//! status code alone.

use http::header::HeaderValue;

use mocks3_model::S3Error;
use mocks3_xml::S3Serialize;

use crate::body::S3ResponseBody;

/// Build a 200 response with a serialized XML body.
///
/// # Errors
///
/// Returns [`S3Error`] when serialization fails.
pub fn xml_ok<T: S3Serialize>(
    root: &str,
    value: &T,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let body = mocks3_xml::to_xml(root, value)
        .map_err(|e| S3Error::internal_error(format!("xml serialization failed: {e}")))?;

    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/xml")
        .body(S3ResponseBody::from_xml(body))
        .map_err(|e| S3Error::internal_error(format!("failed to build response: {e}")))
}

/// Build a bodiless response with the given status.
///
/// # Errors
///
/// Returns [`S3Error`] when the response cannot be constructed.
pub fn empty_response(
    status: http::StatusCode,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    http::Response::builder()
        .status(status)
        .body(S3ResponseBody::empty())
        .map_err(|e| S3Error::internal_error(format!("failed to build response: {e}")))
}

/// Render an error as an HTTP response: the mapped status plus the XML
/// `<Error>` body, or status alone for HEAD requests.
pub fn error_to_response(
    err: &S3Error,
    request_id: &str,
    head: bool,
) -> http::Response<S3ResponseBody> {
    let status = err.status_code();

    if head {
        return http::Response::builder()
            .status(status)
            .body(S3ResponseBody::empty())
            .unwrap_or_default_response();
    }

    let body = mocks3_xml::error_body(err, request_id).unwrap_or_default();
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/xml")
        .body(S3ResponseBody::from_xml(body))
        .unwrap_or_default_response()
}

/// Set a header when the value is present.
#[must_use]
pub fn set_opt_header(
    builder: http::response::Builder,
    name: &'static str,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Fallible-response escape hatch: a builder failure collapses to a bare
/// 500. Builder inputs are static in practice, so this path is unreachable.
trait OrDefaultResponse {
    fn unwrap_or_default_response(self) -> http::Response<S3ResponseBody>;
}

impl OrDefaultResponse for Result<http::Response<S3ResponseBody>, http::Error> {
    fn unwrap_or_default_response(self) -> http::Response<S3ResponseBody> {
        self.unwrap_or_else(|_| {
            let mut resp = http::Response::new(S3ResponseBody::empty());
            *resp.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
    }
}
