//! Request routing: URI parsing and operation identification.
//!
//! The path parses into `(bucket?, key?)` where the key is everything after
//! the second slash and may itself contain slashes. Whether a non-empty key
//! is present is what distinguishes bucket operations from object
//! operations. Sub-resources are selected by the presence of specific query
//! keys; where several could apply, precedence is: `delete`, `uploads`,
//! `uploadId` (+`partNumber`), `versioning`, `versions`, `location`,
//! `list-type=2`, then the plain listing / object operation.
//!
//! Virtual-host-style requests are rewritten to path-style by the service
//! layer before they reach this module.

use http::Method;
use percent_encoding::percent_decode_str;

use mocks3_model::{S3Error, S3ErrorCode, S3Operation};

/// The result of routing a request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// The bucket, when the path names one.
    pub bucket: Option<String>,
    /// The object key, when the path names one. May contain slashes.
    pub key: Option<String>,
    /// The identified operation.
    pub operation: S3Operation,
    /// Decoded query parameters, in request order.
    pub query: Vec<(String, String)>,
}

impl RoutingContext {
    /// Whether the query contains the given key (with or without a value).
    #[must_use]
    pub fn has_query(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }

    /// The first value of the given query key.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Resolve a request to its operation and addressing context.
///
/// # Errors
///
/// Returns `MethodNotAllowed` for method/target combinations outside the
/// dispatch table, and `InvalidArgument` for structurally impossible paths.
pub fn resolve<B>(req: &http::Request<B>) -> Result<RoutingContext, S3Error> {
    let query = parse_query(req.uri().query().unwrap_or(""));
    let (bucket, key) = parse_path(req.uri().path());

    let operation = match (&bucket, &key) {
        (None, None) => {
            if req.method() == Method::GET {
                S3Operation::ListBuckets
            } else {
                return Err(S3Error::method_not_allowed(req.method().as_str()));
            }
        }
        (None, Some(_)) => {
            return Err(S3Error::with_message(
                S3ErrorCode::InvalidArgument,
                "object key specified without a bucket",
            ));
        }
        (Some(_), None) => identify_bucket_operation(req.method(), &query)?,
        (Some(_), Some(_)) => identify_object_operation(req.method(), &query, req.headers())?,
    };

    Ok(RoutingContext {
        bucket,
        key,
        operation,
        query,
    })
}

/// Split `/bucket/key...` into its components, percent-decoding both.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    match trimmed.split_once('/') {
        Some((bucket, key)) if !key.is_empty() => {
            (Some(decode(bucket)), Some(decode(key)))
        }
        Some((bucket, _)) => (Some(decode(bucket)), None),
        None => (Some(decode(trimmed)), None),
    }
}

/// Percent-decode a path or query component.
fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into decoded key/value pairs. `+` decodes to a
/// space in values, form-style, matching what S3 accepts.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(&value.replace('+', " "))),
            None => (decode(pair), String::new()),
        })
        .collect()
}

fn has_key(query: &[(String, String)], name: &str) -> bool {
    query.iter().any(|(k, _)| k == name)
}

fn value<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Identify a bucket-level operation (bucket present, no key).
fn identify_bucket_operation(
    method: &Method,
    query: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    match *method {
        Method::GET => Ok(identify_bucket_get(query)),
        Method::PUT => {
            if has_key(query, "versioning") {
                Ok(S3Operation::PutBucketVersioning)
            } else {
                Ok(S3Operation::CreateBucket)
            }
        }
        Method::DELETE => Ok(S3Operation::DeleteBucket),
        Method::HEAD => Ok(S3Operation::HeadBucket),
        Method::POST => {
            if has_key(query, "delete") {
                Ok(S3Operation::DeleteObjects)
            } else {
                Ok(S3Operation::PostObject)
            }
        }
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}

/// Identify a GET operation on a bucket, in sub-resource precedence order.
fn identify_bucket_get(query: &[(String, String)]) -> S3Operation {
    if has_key(query, "uploads") {
        return S3Operation::ListMultipartUploads;
    }
    if has_key(query, "versioning") {
        return S3Operation::GetBucketVersioning;
    }
    if has_key(query, "versions") {
        return S3Operation::ListObjectVersions;
    }
    if has_key(query, "location") {
        return S3Operation::GetBucketLocation;
    }
    if value(query, "list-type") == Some("2") {
        return S3Operation::ListObjectsV2;
    }
    S3Operation::ListObjects
}

/// Identify an object-level operation (bucket and key present).
fn identify_object_operation(
    method: &Method,
    query: &[(String, String)],
    headers: &http::HeaderMap,
) -> Result<S3Operation, S3Error> {
    let has_upload_id = has_key(query, "uploadId");

    match *method {
        Method::GET => {
            if has_upload_id {
                Ok(S3Operation::ListParts)
            } else {
                Ok(S3Operation::GetObject)
            }
        }
        Method::HEAD => Ok(S3Operation::HeadObject),
        Method::PUT => {
            if has_upload_id && has_key(query, "partNumber") {
                Ok(S3Operation::UploadPart)
            } else if headers.contains_key("x-amz-copy-source") {
                Ok(S3Operation::CopyObject)
            } else {
                Ok(S3Operation::PutObject)
            }
        }
        Method::POST => {
            if has_key(query, "uploads") {
                Ok(S3Operation::CreateMultipartUpload)
            } else if has_upload_id {
                Ok(S3Operation::CompleteMultipartUpload)
            } else {
                Err(S3Error::method_not_allowed(method.as_str()))
            }
        }
        Method::DELETE => {
            if has_upload_id {
                Ok(S3Operation::AbortMultipartUpload)
            } else {
                Ok(S3Operation::DeleteObject)
            }
        }
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}
