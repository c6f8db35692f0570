//! The set of S3 operations the gateway serves.
//!
//! The router resolves every request into one of these variants (or an
//! error); the dispatcher hands the variant to the handler. Versioned
//! object reads and deletes are not separate variants: the handler inspects
//! the `versionId` query parameter, mirroring how the wire protocol works.

use std::fmt;

/// An identified S3 operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3Operation {
    /// GET / — list all buckets.
    ListBuckets,
    /// GET /bucket — list objects (V1).
    ListObjects,
    /// GET /bucket?list-type=2 — list objects (V2).
    ListObjectsV2,
    /// GET /bucket?versions — list object versions.
    ListObjectVersions,
    /// GET /bucket?location — bucket location.
    GetBucketLocation,
    /// GET /bucket?versioning — versioning configuration.
    GetBucketVersioning,
    /// PUT /bucket?versioning — set versioning configuration.
    PutBucketVersioning,
    /// PUT /bucket — create a bucket.
    CreateBucket,
    /// HEAD /bucket — bucket existence check.
    HeadBucket,
    /// DELETE /bucket — delete an empty bucket.
    DeleteBucket,
    /// POST /bucket?delete — multi-object delete.
    DeleteObjects,
    /// POST /bucket — browser-based form upload.
    PostObject,
    /// GET /bucket/key — retrieve an object (optionally a specific version).
    GetObject,
    /// HEAD /bucket/key — object metadata only.
    HeadObject,
    /// PUT /bucket/key — store an object.
    PutObject,
    /// PUT /bucket/key with x-amz-copy-source — server-side copy.
    CopyObject,
    /// DELETE /bucket/key — delete an object (optionally a specific version).
    DeleteObject,
    /// POST /bucket/key?uploads — initiate a multipart upload.
    CreateMultipartUpload,
    /// PUT /bucket/key?partNumber=N&uploadId=ID — upload a part.
    UploadPart,
    /// GET /bucket/key?uploadId=ID — list uploaded parts.
    ListParts,
    /// GET /bucket?uploads — list in-progress multipart uploads.
    ListMultipartUploads,
    /// POST /bucket/key?uploadId=ID — complete a multipart upload.
    CompleteMultipartUpload,
    /// DELETE /bucket/key?uploadId=ID — abort a multipart upload.
    AbortMultipartUpload,
}

impl S3Operation {
    /// The operation name as a static string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBuckets => "ListBuckets",
            Self::ListObjects => "ListObjects",
            Self::ListObjectsV2 => "ListObjectsV2",
            Self::ListObjectVersions => "ListObjectVersions",
            Self::GetBucketLocation => "GetBucketLocation",
            Self::GetBucketVersioning => "GetBucketVersioning",
            Self::PutBucketVersioning => "PutBucketVersioning",
            Self::CreateBucket => "CreateBucket",
            Self::HeadBucket => "HeadBucket",
            Self::DeleteBucket => "DeleteBucket",
            Self::DeleteObjects => "DeleteObjects",
            Self::PostObject => "PostObject",
            Self::GetObject => "GetObject",
            Self::HeadObject => "HeadObject",
            Self::PutObject => "PutObject",
            Self::CopyObject => "CopyObject",
            Self::DeleteObject => "DeleteObject",
            Self::CreateMultipartUpload => "CreateMultipartUpload",
            Self::UploadPart => "UploadPart",
            Self::ListParts => "ListParts",
            Self::ListMultipartUploads => "ListMultipartUploads",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
        }
    }
}

impl fmt::Display for S3Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
