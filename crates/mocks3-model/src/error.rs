//! The S3 error model.
//!
//! Errors are values from a closed taxonomy. Each [`S3ErrorCode`] knows its
//! wire name, HTTP status, and default message; an [`S3Error`] pairs a code
//! with an optional custom message and the resource it refers to. The HTTP
//! layer serializes errors as the standard `<Error>` XML body (status only
//! for HEAD requests).
//!
//! Backend implementations should return errors from this taxonomy where one
//! fits; anything unrecognized is wrapped as [`S3ErrorCode::InternalError`]
//! by the gateway.

use std::fmt;

/// Well-known S3 error codes emitted by the gateway.
///
/// The set is closed: handlers and backends pick from these variants rather
/// than inventing codes, which keeps status mapping and XML rendering in one
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum S3ErrorCode {
    /// Access denied.
    AccessDenied,
    /// The requested bucket name is taken.
    BucketAlreadyExists,
    /// The bucket is not empty and cannot be deleted.
    BucketNotEmpty,
    /// The Content-MD5 did not match the received data.
    BadDigest,
    /// A part is smaller than the minimum allowed size.
    EntityTooSmall,
    /// The presigned request has expired.
    ExpiredToken,
    /// The request body was shorter than the declared length.
    IncompleteBody,
    /// The browser POST form did not contain exactly one file.
    IncorrectNumberOfFilesInPostRequest,
    /// Unrecoverable internal failure.
    InternalError,
    /// The access key in the credential does not exist.
    InvalidAccessKeyId,
    /// An argument in the request is invalid.
    InvalidArgument,
    /// The bucket name violates the naming rules.
    InvalidBucketName,
    /// The Content-MD5 header is not valid.
    InvalidDigest,
    /// A referenced part could not be found or its ETag did not match.
    InvalidPart,
    /// The completed part list was not in ascending order.
    InvalidPartOrder,
    /// The requested range cannot be satisfied.
    InvalidRange,
    /// The continuation token could not be decoded.
    InvalidToken,
    /// The object key exceeds the maximum length.
    KeyTooLong,
    /// A date in the authentication material could not be parsed.
    MalformedDate,
    /// The browser POST body is not valid multipart/form-data.
    MalformedPOSTRequest,
    /// The request XML is not well-formed.
    MalformedXML,
    /// The metadata headers exceed the configured size limit.
    MetadataTooLarge,
    /// The HTTP method is not allowed against this resource.
    MethodNotAllowed,
    /// The Content-Length header is required.
    MissingContentLength,
    /// Required authentication fields are absent.
    MissingFields,
    /// ETag precondition matched; content unchanged (HTTP 304).
    NotModified,
    /// The specified bucket does not exist.
    NoSuchBucket,
    /// The specified key does not exist.
    NoSuchKey,
    /// The specified multipart upload does not exist.
    NoSuchUpload,
    /// The specified object version does not exist.
    NoSuchVersion,
    /// The requested functionality is not implemented.
    NotImplemented,
    /// Internal sentinel: the backend does not implement pagination.
    ///
    /// Never serialized. The listing handler either retries without a page
    /// or converts this to [`S3ErrorCode::NotImplemented`].
    PageNotImplemented,
    /// The request time is too far from the server time.
    RequestTimeTooSkewed,
    /// The computed signature did not match the provided one.
    SignatureDoesNotMatch,
}

impl S3ErrorCode {
    /// The wire name of the code, as it appears in `<Error><Code>`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::BadDigest => "BadDigest",
            Self::EntityTooSmall => "EntityTooSmall",
            Self::ExpiredToken => "ExpiredToken",
            Self::IncompleteBody => "IncompleteBody",
            Self::IncorrectNumberOfFilesInPostRequest => "IncorrectNumberOfFilesInPostRequest",
            Self::InternalError => "InternalError",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidBucketName => "InvalidBucketName",
            Self::InvalidDigest => "InvalidDigest",
            Self::InvalidPart => "InvalidPart",
            Self::InvalidPartOrder => "InvalidPartOrder",
            Self::InvalidRange => "InvalidRange",
            Self::InvalidToken => "InvalidToken",
            Self::KeyTooLong => "KeyTooLongError",
            Self::MalformedDate => "MalformedDate",
            Self::MalformedPOSTRequest => "MalformedPOSTRequest",
            Self::MalformedXML => "MalformedXML",
            Self::MetadataTooLarge => "MetadataTooLarge",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::MissingContentLength => "MissingContentLength",
            Self::MissingFields => "MissingFields",
            Self::NotModified => "NotModified",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchUpload => "NoSuchUpload",
            Self::NoSuchVersion => "NoSuchVersion",
            Self::NotImplemented => "NotImplemented",
            Self::PageNotImplemented => "NotImplemented",
            Self::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
        }
    }

    /// The HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::BadDigest
            | Self::EntityTooSmall
            | Self::IncompleteBody
            | Self::IncorrectNumberOfFilesInPostRequest
            | Self::InvalidArgument
            | Self::InvalidBucketName
            | Self::InvalidDigest
            | Self::InvalidPart
            | Self::InvalidPartOrder
            | Self::InvalidToken
            | Self::KeyTooLong
            | Self::MalformedDate
            | Self::MalformedPOSTRequest
            | Self::MalformedXML
            | Self::MetadataTooLarge
            | Self::MissingFields => http::StatusCode::BAD_REQUEST,
            Self::AccessDenied
            | Self::ExpiredToken
            | Self::InvalidAccessKeyId
            | Self::RequestTimeTooSkewed
            | Self::SignatureDoesNotMatch => http::StatusCode::FORBIDDEN,
            Self::NoSuchBucket | Self::NoSuchKey | Self::NoSuchUpload | Self::NoSuchVersion => {
                http::StatusCode::NOT_FOUND
            }
            Self::BucketAlreadyExists | Self::BucketNotEmpty => http::StatusCode::CONFLICT,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingContentLength => http::StatusCode::LENGTH_REQUIRED,
            Self::NotModified => http::StatusCode::NOT_MODIFIED,
            Self::InvalidRange => http::StatusCode::RANGE_NOT_SATISFIABLE,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented | Self::PageNotImplemented => http::StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// The default human-readable message for this code.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Access Denied",
            Self::BucketAlreadyExists => {
                "The requested bucket name is not available. The bucket namespace is shared by all users of the system. Please select a different name and try again."
            }
            Self::BucketNotEmpty => "The bucket you tried to delete is not empty",
            Self::BadDigest => "The Content-MD5 you specified did not match what we received",
            Self::EntityTooSmall => {
                "Your proposed upload is smaller than the minimum allowed object size"
            }
            Self::ExpiredToken => "The provided token has expired",
            Self::IncompleteBody => {
                "You did not provide the number of bytes specified by the Content-Length HTTP header"
            }
            Self::IncorrectNumberOfFilesInPostRequest => {
                "POST requires exactly one file upload per request"
            }
            Self::InternalError => "We encountered an internal error. Please try again.",
            Self::InvalidAccessKeyId => {
                "The AWS Access Key Id you provided does not exist in our records"
            }
            Self::InvalidArgument => "Invalid Argument",
            Self::InvalidBucketName => "The specified bucket is not valid",
            Self::InvalidDigest => "The Content-MD5 you specified is not valid",
            Self::InvalidPart => {
                "One or more of the specified parts could not be found. The part may not have been uploaded, or the specified entity tag may not match the part's entity tag."
            }
            Self::InvalidPartOrder => {
                "The list of parts was not in ascending order. Parts list must be specified in order by part number."
            }
            Self::InvalidRange => "The requested range is not satisfiable",
            Self::InvalidToken => "The provided token is malformed or otherwise invalid",
            Self::KeyTooLong => "Your key is too long",
            Self::MalformedDate => "Invalid date format in the authorization header",
            Self::MalformedPOSTRequest => {
                "The body of your POST request is not well-formed multipart/form-data"
            }
            Self::MalformedXML => {
                "The XML you provided was not well-formed or did not validate against our published schema"
            }
            Self::MetadataTooLarge => "Your metadata headers exceed the maximum allowed metadata size",
            Self::MethodNotAllowed => "The specified method is not allowed against this resource",
            Self::MissingContentLength => "You must provide the Content-Length HTTP header",
            Self::MissingFields => "Missing fields in request",
            Self::NotModified => "Not Modified",
            Self::NoSuchBucket => "The specified bucket does not exist",
            Self::NoSuchKey => "The specified key does not exist",
            Self::NoSuchUpload => {
                "The specified multipart upload does not exist. The upload ID might be invalid, or the multipart upload might have been aborted or completed."
            }
            Self::NoSuchVersion => {
                "The version ID specified in the request does not match an existing version"
            }
            Self::NotImplemented | Self::PageNotImplemented => {
                "A header you provided implies functionality that is not implemented"
            }
            Self::RequestTimeTooSkewed => {
                "The difference between the request time and the server's time is too large"
            }
            Self::SignatureDoesNotMatch => {
                "The request signature we calculated does not match the signature you provided. Check your key and signing method."
            }
        }
    }
}

impl fmt::Display for S3ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An S3 error value: a code plus an optional custom message and resource.
///
/// Handlers return `Result<_, S3Error>`; the service layer renders the value
/// as the `<Error>` XML body with the current request ID attached.
#[derive(Debug, Clone)]
pub struct S3Error {
    /// The error code.
    pub code: S3ErrorCode,
    /// Human-readable message. Defaults to the code's standard message.
    pub message: String,
    /// The bucket, key, or other resource the error refers to, if known.
    pub resource: Option<String>,
}

impl S3Error {
    /// Create an error carrying the code's default message.
    #[must_use]
    pub fn new(code: S3ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_owned(),
            resource: None,
        }
    }

    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: S3ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            resource: None,
        }
    }

    /// Create an error annotated with the resource it refers to.
    #[must_use]
    pub fn resource_error(code: S3ErrorCode, resource: impl Into<String>) -> Self {
        Self {
            code,
            message: code.default_message().to_owned(),
            resource: Some(resource.into()),
        }
    }

    /// Create an [`S3ErrorCode::InternalError`] with a custom message.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(S3ErrorCode::InternalError, message)
    }

    /// Create an [`S3ErrorCode::InvalidArgument`] describing the offending
    /// argument.
    #[must_use]
    pub fn invalid_argument(name: &str, message: impl fmt::Display) -> Self {
        Self::with_message(
            S3ErrorCode::InvalidArgument,
            format!("{name}: {message}"),
        )
    }

    /// Create a [`S3ErrorCode::MethodNotAllowed`] error for the given method.
    #[must_use]
    pub fn method_not_allowed(method: &str) -> Self {
        Self::with_message(
            S3ErrorCode::MethodNotAllowed,
            format!("The specified method is not allowed against this resource: {method}"),
        )
    }

    /// The HTTP status this error renders as.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        self.code.status_code()
    }
}

impl fmt::Display for S3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "{}: {} ({resource})", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for S3Error {}

impl From<S3ErrorCode> for S3Error {
    fn from(code: S3ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Convenience result type for gateway operations.
pub type S3Result<T> = Result<T, S3Error>;
