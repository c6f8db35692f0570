//! Verification failure modes and their mapping onto the S3 error taxonomy.

use mocks3_model::{S3Error, S3ErrorCode};

/// Why signature verification failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The request cannot be authorized at all.
    #[error("access denied")]
    AccessDenied,

    /// The computed signature did not match the provided one.
    #[error("signature does not match")]
    SignatureDoesNotMatch,

    /// The presigned URL has expired.
    #[error("the provided token has expired")]
    ExpiredToken,

    /// The access key in the credential scope is not registered.
    #[error("unknown access key id: {0}")]
    InvalidAccessKeyId(String),

    /// A date field could not be parsed.
    #[error("malformed date: {0}")]
    MalformedDate(String),

    /// The declared algorithm is not `AWS4-HMAC-SHA256`.
    ///
    /// Callers treat this as a signal to retry with SigV2.
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Required authentication fields are missing or unparseable.
    #[error("missing fields: {0}")]
    MissingFields(String),

    /// The header-signed request time is outside the allowed window.
    #[error("request time too skewed")]
    RequestTimeTooSkewed,
}

impl AuthError {
    /// The S3 error code this failure renders as.
    #[must_use]
    pub fn code(&self) -> S3ErrorCode {
        match self {
            Self::AccessDenied | Self::UnsupportedAlgorithm(_) => S3ErrorCode::AccessDenied,
            Self::SignatureDoesNotMatch => S3ErrorCode::SignatureDoesNotMatch,
            Self::ExpiredToken => S3ErrorCode::ExpiredToken,
            Self::InvalidAccessKeyId(_) => S3ErrorCode::InvalidAccessKeyId,
            Self::MalformedDate(_) => S3ErrorCode::MalformedDate,
            Self::MissingFields(_) => S3ErrorCode::MissingFields,
            Self::RequestTimeTooSkewed => S3ErrorCode::RequestTimeTooSkewed,
        }
    }

    /// Convert this failure into a wire-level [`S3Error`].
    #[must_use]
    pub fn into_s3_error(self) -> S3Error {
        S3Error::with_message(self.code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_signature_mismatch_to_403() {
        let err = AuthError::SignatureDoesNotMatch;
        assert_eq!(err.code(), S3ErrorCode::SignatureDoesNotMatch);
        assert_eq!(
            err.into_s3_error().status_code(),
            http::StatusCode::FORBIDDEN,
        );
    }

    #[test]
    fn test_should_map_malformed_date_to_400() {
        let err = AuthError::MalformedDate("20xx".to_owned());
        assert_eq!(
            err.into_s3_error().status_code(),
            http::StatusCode::BAD_REQUEST,
        );
    }

    #[test]
    fn test_should_map_expired_token_to_403() {
        assert_eq!(AuthError::ExpiredToken.code(), S3ErrorCode::ExpiredToken);
    }
}
