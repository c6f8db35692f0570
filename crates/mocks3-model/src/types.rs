//! Request and response entities for the S3 XML schemas.
//!
//! These structs are the typed form of the documents the gateway reads and
//! writes: bucket listings, object listings (V1 and V2), version listings,
//! multipart upload bookkeeping, multi-object delete, and the versioning
//! configuration. XML encoding/decoding for them lives in `mocks3-xml`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The storage class reported for every object.
pub const STORAGE_CLASS_STANDARD: &str = "STANDARD";

/// The version ID S3 reports for objects that predate versioning.
pub const NULL_VERSION_ID: &str = "null";

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// The owner block attached to buckets, objects, and uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Canonical user ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
}

impl Owner {
    /// The fixed owner the gateway reports for every resource.
    #[must_use]
    pub fn gateway() -> Self {
        Self {
            id: "fe7272ea58be830e56fe1663b10fafef".to_owned(),
            display_name: "GoFakeS3".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// A bucket entry in `ListAllMyBucketsResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketInfo {
    /// The bucket name.
    pub name: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
}

/// Response body for `GET /` — all buckets plus the owner.
#[derive(Debug, Clone)]
pub struct ListAllMyBucketsResult {
    /// The fixed gateway owner.
    pub owner: Owner,
    /// All buckets known to the backend.
    pub buckets: Vec<BucketInfo>,
}

// ---------------------------------------------------------------------------
// Object listings
// ---------------------------------------------------------------------------

/// A single object entry in a bucket listing.
#[derive(Debug, Clone)]
pub struct Content {
    /// The object key.
    pub key: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Quoted hex MD5 of the object body. Empty for synthesized entries.
    pub etag: String,
    /// Object size in bytes.
    pub size: u64,
    /// Storage class (always `STANDARD`).
    pub storage_class: String,
    /// The owner; omitted from V2 listings unless `fetch-owner` was given.
    pub owner: Option<Owner>,
}

impl Content {
    /// Synthesize the zero-size placeholder S3 emits for a "directory"
    /// prefix that has no real object of its own. Its timestamp is the
    /// Unix epoch and it carries no ETag.
    #[must_use]
    pub fn directory_placeholder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
            etag: String::new(),
            size: 0,
            storage_class: STORAGE_CLASS_STANDARD.to_owned(),
            owner: None,
        }
    }
}

/// Response body for ListObjects (V1).
#[derive(Debug, Clone, Default)]
pub struct ListBucketResult {
    /// The bucket being listed.
    pub name: String,
    /// The prefix filter, URL-encoded as S3 does.
    pub prefix: String,
    /// The marker this page started from.
    pub marker: String,
    /// Where the next page starts. Only emitted when a delimiter was given.
    pub next_marker: Option<String>,
    /// The delimiter, when one was given.
    pub delimiter: Option<String>,
    /// The page size limit.
    pub max_keys: u64,
    /// Whether more results exist beyond this page.
    pub is_truncated: bool,
    /// Matching objects.
    pub contents: Vec<Content>,
    /// Rolled-up prefixes when a delimiter was given.
    pub common_prefixes: Vec<String>,
}

/// Response body for ListObjectsV2.
#[derive(Debug, Clone, Default)]
pub struct ListBucketResultV2 {
    /// The bucket being listed.
    pub name: String,
    /// The prefix filter, URL-encoded as S3 does.
    pub prefix: String,
    /// The delimiter, when one was given.
    pub delimiter: Option<String>,
    /// The page size limit.
    pub max_keys: u64,
    /// Number of keys plus common prefixes in this page.
    pub key_count: u64,
    /// Whether more results exist beyond this page.
    pub is_truncated: bool,
    /// Echo of the `start-after` parameter.
    pub start_after: Option<String>,
    /// Echo of the `continuation-token` parameter.
    pub continuation_token: Option<String>,
    /// Opaque token for the next page.
    pub next_continuation_token: Option<String>,
    /// Always `url`.
    pub encoding_type: String,
    /// Matching objects.
    pub contents: Vec<Content>,
    /// Rolled-up prefixes when a delimiter was given.
    pub common_prefixes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Version listings
// ---------------------------------------------------------------------------

/// An object version in a `ListVersionsResult`.
#[derive(Debug, Clone)]
pub struct ObjectVersion {
    /// The object key.
    pub key: String,
    /// The version ID (`"null"` for pre-versioning objects).
    pub version_id: String,
    /// Whether this is the current version of its key.
    pub is_latest: bool,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Quoted hex MD5 of this version's body.
    pub etag: String,
    /// Size in bytes.
    pub size: u64,
    /// Storage class.
    pub storage_class: String,
    /// The version's owner.
    pub owner: Option<Owner>,
}

/// A delete marker in a `ListVersionsResult`.
#[derive(Debug, Clone)]
pub struct DeleteMarker {
    /// The object key.
    pub key: String,
    /// The marker's version ID.
    pub version_id: String,
    /// Whether this marker is the current version of its key.
    pub is_latest: bool,
    /// When the marker was created.
    pub last_modified: DateTime<Utc>,
    /// The marker's owner.
    pub owner: Option<Owner>,
}

/// A single entry in a version listing: either a real version or a delete
/// marker. The XML interleaves `<Version>` and `<DeleteMarker>` elements in
/// key/recency order, so the order of this list is significant.
#[derive(Debug, Clone)]
pub enum VersionEntry {
    /// A stored object version.
    Version(ObjectVersion),
    /// A delete marker.
    DeleteMarker(DeleteMarker),
}

impl VersionEntry {
    /// The entry's key.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Version(v) => &v.key,
            Self::DeleteMarker(d) => &d.key,
        }
    }

    /// The entry's version ID.
    #[must_use]
    pub fn version_id(&self) -> &str {
        match self {
            Self::Version(v) => &v.version_id,
            Self::DeleteMarker(d) => &d.version_id,
        }
    }

    /// Replace an empty version ID with the literal `"null"`.
    ///
    /// Backends may return the empty string for objects that predate
    /// versioning; the wire always carries `"null"`.
    pub fn normalize_version_id(&mut self) {
        let id = match self {
            Self::Version(v) => &mut v.version_id,
            Self::DeleteMarker(d) => &mut d.version_id,
        };
        if id.is_empty() {
            *id = NULL_VERSION_ID.to_owned();
        }
    }
}

/// Response body for `GET /bucket?versions`.
#[derive(Debug, Clone, Default)]
pub struct ListVersionsResult {
    /// The bucket being listed.
    pub name: String,
    /// The prefix filter.
    pub prefix: String,
    /// The key marker this page started from.
    pub key_marker: String,
    /// The version-id marker this page started from.
    pub version_id_marker: String,
    /// Where the next page starts, when truncated.
    pub next_key_marker: Option<String>,
    /// The version-id component of the next page start.
    pub next_version_id_marker: Option<String>,
    /// The page size limit.
    pub max_keys: u64,
    /// Whether more results exist beyond this page.
    pub is_truncated: bool,
    /// Versions and delete markers, in listing order.
    pub versions: Vec<VersionEntry>,
    /// Rolled-up prefixes when a delimiter was given.
    pub common_prefixes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Versioning configuration
// ---------------------------------------------------------------------------

/// Bucket versioning state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersioningStatus {
    /// Versioning is on; every write allocates a fresh version.
    Enabled,
    /// Versioning was on and has been suspended.
    Suspended,
}

impl VersioningStatus {
    /// The wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Suspended => "Suspended",
        }
    }
}

/// MFA-Delete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MfaDeleteStatus {
    /// MFA-Delete is enabled.
    Enabled,
    /// MFA-Delete is disabled.
    Disabled,
}

impl MfaDeleteStatus {
    /// The wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }
}

/// The `VersioningConfiguration` document, used for both GET and PUT.
///
/// An unversioned bucket serializes as an empty configuration: both fields
/// absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfiguration {
    /// The versioning status, absent when versioning was never enabled.
    pub status: Option<VersioningStatus>,
    /// The MFA-Delete status, absent unless explicitly configured.
    pub mfa_delete: Option<MfaDeleteStatus>,
}

impl VersioningConfiguration {
    /// Whether this configuration turns versioning on.
    #[must_use]
    pub fn is_versioning_enabled(&self) -> bool {
        self.status == Some(VersioningStatus::Enabled)
    }

    /// Whether this configuration requests MFA-Delete.
    #[must_use]
    pub fn is_mfa_delete_enabled(&self) -> bool {
        self.mfa_delete == Some(MfaDeleteStatus::Enabled)
    }
}

// ---------------------------------------------------------------------------
// Bucket location
// ---------------------------------------------------------------------------

/// Response body for `GET /bucket?location`.
#[derive(Debug, Clone, Default)]
pub struct GetBucketLocation {
    /// The location constraint; empty means us-east-1.
    pub location_constraint: String,
}

// ---------------------------------------------------------------------------
// Multipart uploads
// ---------------------------------------------------------------------------

/// Response body for `POST /bucket/key?uploads`.
#[derive(Debug, Clone)]
pub struct InitiateMultipartUploadResult {
    /// The bucket the upload targets.
    pub bucket: String,
    /// The key the upload will create.
    pub key: String,
    /// The freshly minted upload ID.
    pub upload_id: String,
}

/// A `(part number, ETag)` pair in a CompleteMultipartUpload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// The part number.
    pub part_number: u32,
    /// The part's ETag as the client saw it (may or may not be quoted).
    pub etag: String,
}

/// Request body for `POST /bucket/key?uploadId=ID`.
#[derive(Debug, Clone, Default)]
pub struct CompleteMultipartUpload {
    /// The parts to assemble, in the order the client listed them.
    pub parts: Vec<CompletedPart>,
}

/// Response body for a completed multipart upload.
#[derive(Debug, Clone)]
pub struct CompleteMultipartUploadResult {
    /// The bucket the object landed in.
    pub bucket: String,
    /// The assembled object's key.
    pub key: String,
    /// The multipart ETag (`"hex-N"` form, quoted).
    pub etag: String,
}

/// A part entry in a `ListPartsResult`.
#[derive(Debug, Clone)]
pub struct ListPart {
    /// The part number.
    pub part_number: u32,
    /// When the part was uploaded.
    pub last_modified: DateTime<Utc>,
    /// The part's quoted ETag.
    pub etag: String,
    /// The part's size in bytes.
    pub size: u64,
}

/// Response body for `GET /bucket/key?uploadId=ID`.
#[derive(Debug, Clone, Default)]
pub struct ListPartsResult {
    /// The bucket the upload targets.
    pub bucket: String,
    /// The key the upload will create.
    pub key: String,
    /// The upload ID.
    pub upload_id: String,
    /// The part-number marker this page started from.
    pub part_number_marker: u32,
    /// Where the next page starts, when truncated.
    pub next_part_number_marker: u32,
    /// The page size limit.
    pub max_parts: u64,
    /// Whether more parts exist beyond this page.
    pub is_truncated: bool,
    /// The parts, ascending by part number.
    pub parts: Vec<ListPart>,
}

/// An upload entry in a `ListMultipartUploadsResult`.
#[derive(Debug, Clone)]
pub struct ListedUpload {
    /// The key the upload will create.
    pub key: String,
    /// The upload ID.
    pub upload_id: String,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    /// The storage class the final object will carry.
    pub storage_class: String,
}

/// Response body for `GET /bucket?uploads`.
#[derive(Debug, Clone, Default)]
pub struct ListMultipartUploadsResult {
    /// The bucket being listed.
    pub bucket: String,
    /// The key marker this page started from.
    pub key_marker: String,
    /// The upload-id marker this page started from.
    pub upload_id_marker: String,
    /// The key component of the next page start.
    pub next_key_marker: Option<String>,
    /// The upload-id component of the next page start.
    pub next_upload_id_marker: Option<String>,
    /// The page size limit.
    pub max_uploads: u64,
    /// Whether more uploads exist beyond this page.
    pub is_truncated: bool,
    /// The prefix filter.
    pub prefix: String,
    /// In-progress uploads ordered by `(key, upload_id)`.
    pub uploads: Vec<ListedUpload>,
}

// ---------------------------------------------------------------------------
// Multi-object delete
// ---------------------------------------------------------------------------

/// An object reference inside a `<Delete>` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectIdentifier {
    /// The key to delete.
    pub key: String,
    /// The specific version to delete, when given.
    pub version_id: Option<String>,
}

/// Request body for `POST /bucket?delete`.
#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    /// The objects to delete.
    pub objects: Vec<ObjectIdentifier>,
    /// When set, successful deletions are omitted from the response.
    pub quiet: bool,
}

/// A successfully deleted key in a `DeleteResult`.
#[derive(Debug, Clone)]
pub struct DeletedObject {
    /// The deleted key.
    pub key: String,
}

/// A per-key failure in a `DeleteResult`. Per-key failures do not fail the
/// request as a whole.
#[derive(Debug, Clone)]
pub struct DeleteError {
    /// The key that failed to delete.
    pub key: String,
    /// The S3 error code for the failure.
    pub code: String,
    /// A human-readable message.
    pub message: String,
}

/// Response body for `POST /bucket?delete`.
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    /// Keys deleted successfully. Empty in quiet mode.
    pub deleted: Vec<DeletedObject>,
    /// Keys that failed to delete.
    pub errors: Vec<DeleteError>,
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

/// Response body for a server-side copy.
#[derive(Debug, Clone)]
pub struct CopyObjectResult {
    /// The new object's quoted ETag.
    pub etag: String,
    /// The new object's modification time.
    pub last_modified: DateTime<Utc>,
}
