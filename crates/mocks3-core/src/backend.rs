//! The storage contract the gateway consumes.
//!
//! [`Backend`] is the required surface; [`VersionedBackend`] is a separate,
//! optional capability held alongside it — never discovered by downcasting.
//! Handlers that need versioning check for the second trait object and
//! answer `NotImplemented` when it is absent.
//!
//! All methods are async and cancel-safe: when a client disconnects, the
//! request future is dropped mid-call and the backend must tolerate the
//! abort at any await point.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use mocks3_model::error::S3Result;
use mocks3_model::types::{
    BucketInfo, Content, CopyObjectResult, DeleteResult, ListVersionsResult,
    VersioningConfiguration,
};

use crate::range::{ObjectRange, ObjectRangeRequest};

// ---------------------------------------------------------------------------
// Listing vocabulary
// ---------------------------------------------------------------------------

/// Prefix and delimiter filtering for listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    /// Only keys starting with this prefix match. Empty matches all.
    pub prefix: String,
    /// When non-empty, keys containing this delimiter after the prefix are
    /// rolled up into common prefixes.
    pub delimiter: String,
}

/// How a key relates to a [`Prefix`] filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixMatch {
    /// The key does not match the prefix.
    NoMatch,
    /// The key matches and should appear as an object entry.
    Object,
    /// The key matches but rolls up into the given common prefix.
    CommonPrefix(String),
}

impl Prefix {
    /// Build a prefix filter from query parameters.
    #[must_use]
    pub fn from_query(prefix: Option<&str>, delimiter: Option<&str>) -> Self {
        Self {
            prefix: prefix.unwrap_or("").to_owned(),
            delimiter: delimiter.unwrap_or("").to_owned(),
        }
    }

    /// Whether a delimiter is in effect.
    #[must_use]
    pub fn has_delimiter(&self) -> bool {
        !self.delimiter.is_empty()
    }

    /// Classify a key against this filter. Backends drive their listing
    /// loops with this.
    #[must_use]
    pub fn match_key(&self, key: &str) -> PrefixMatch {
        let Some(rest) = key.strip_prefix(self.prefix.as_str()) else {
            return PrefixMatch::NoMatch;
        };

        if self.has_delimiter() {
            if let Some(pos) = rest.find(self.delimiter.as_str()) {
                let common = format!("{}{}{}", self.prefix, &rest[..pos], self.delimiter);
                return PrefixMatch::CommonPrefix(common);
            }
        }

        PrefixMatch::Object
    }
}

/// Pagination inputs for object listings.
///
/// A default page (no marker, no limit) asks for everything; the gateway
/// retries with it when the backend reports [`page not
/// implemented`](mocks3_model::S3ErrorCode::PageNotImplemented).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBucketPage {
    /// List keys strictly after this one.
    pub marker: Option<String>,
    /// Page size cap; `None` is unlimited.
    pub max_keys: Option<u64>,
}

impl ListBucketPage {
    /// Whether this page requests any pagination at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marker.is_none() && self.max_keys.is_none()
    }
}

/// Pagination inputs for version listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionsPage {
    /// Start after this key.
    pub key_marker: Option<String>,
    /// Within the marker key, start after this version.
    pub version_id_marker: Option<String>,
    /// Page size cap.
    pub max_keys: u64,
}

/// One page of an object listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectList {
    /// Matching objects, ascending by key.
    pub contents: Vec<Content>,
    /// Rolled-up prefixes, in first-seen order.
    pub common_prefixes: Vec<String>,
    /// Whether more keys follow this page.
    pub is_truncated: bool,
    /// The marker for the next page, when truncated.
    pub next_marker: Option<String>,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// An object returned by the backend.
#[derive(Debug, Clone)]
pub struct Object {
    /// The object key.
    pub name: String,
    /// Stored user metadata.
    pub metadata: HashMap<String, String>,
    /// Total object size in bytes, independent of any range.
    pub size: u64,
    /// The requested bytes: the whole body, the selected range, or empty
    /// for HEAD.
    pub contents: Bytes,
    /// Raw MD5 of the full body.
    pub hash: Vec<u8>,
    /// The range that was applied to `contents`, when one was requested.
    pub range: Option<ObjectRange>,
    /// The object's version ID; empty in unversioned buckets.
    pub version_id: String,
    /// Whether this entry is a delete marker. GET/HEAD render it as a 404
    /// with `x-amz-delete-marker: true`.
    pub is_delete_marker: bool,
}

impl Object {
    /// The object's quoted ETag.
    #[must_use]
    pub fn etag(&self) -> String {
        format!("\"{}\"", hex::encode(&self.hash))
    }
}

/// Result of storing an object.
#[derive(Debug, Clone, Default)]
pub struct PutObjectResult {
    /// The version allocated for the write, in versioned buckets.
    pub version_id: Option<String>,
}

/// Result of deleting an object.
#[derive(Debug, Clone, Default)]
pub struct ObjectDeleteResult {
    /// Whether the delete created a delete marker.
    pub is_delete_marker: bool,
    /// The marker's (or removed version's) version ID.
    pub version_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// The storage surface every backend must provide.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// All buckets, for `ListBuckets`.
    async fn list_buckets(&self) -> S3Result<Vec<BucketInfo>>;

    /// One page of a bucket listing.
    ///
    /// Backends that cannot paginate return
    /// [`PageNotImplemented`](mocks3_model::S3ErrorCode::PageNotImplemented)
    /// for non-empty pages; the gateway retries unpaginated or surfaces
    /// `NotImplemented` depending on configuration.
    async fn list_bucket(
        &self,
        name: &str,
        prefix: &Prefix,
        page: ListBucketPage,
    ) -> S3Result<ObjectList>;

    /// Create a bucket. Name validity is checked by the gateway.
    async fn create_bucket(&self, name: &str) -> S3Result<()>;

    /// Whether a bucket exists.
    async fn bucket_exists(&self, name: &str) -> S3Result<bool>;

    /// Delete a bucket. Must fail with `BucketNotEmpty` when it holds
    /// objects.
    async fn delete_bucket(&self, name: &str) -> S3Result<()>;

    /// Object metadata without the body.
    async fn head_object(&self, bucket: &str, key: &str) -> S3Result<Object>;

    /// The current object for a key, with the body (optionally
    /// range-limited). A delete-marker current version is returned as an
    /// [`Object`] with `is_delete_marker` set.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ObjectRangeRequest>,
    ) -> S3Result<Object>;

    /// Store an object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        meta: HashMap<String, String>,
        body: Bytes,
    ) -> S3Result<PutObjectResult>;

    /// Delete the current version of a key. In versioned buckets this
    /// inserts a delete marker and reports it in the result.
    async fn delete_object(&self, bucket: &str, key: &str) -> S3Result<ObjectDeleteResult>;

    /// Delete several keys, reporting per-key outcomes. Individual
    /// failures land in the result; only systemic failures are errors.
    async fn delete_multi(&self, bucket: &str, keys: &[String]) -> S3Result<DeleteResult>;

    /// Server-side copy. The backend decides whether source metadata is
    /// preserved or replaced by `meta`.
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        meta: HashMap<String, String>,
    ) -> S3Result<CopyObjectResult>;
}

/// The optional versioning capability.
#[async_trait]
pub trait VersionedBackend: Send + Sync + 'static {
    /// The bucket's versioning configuration.
    async fn versioning_configuration(&self, bucket: &str) -> S3Result<VersioningConfiguration>;

    /// Change the bucket's versioning configuration.
    async fn set_versioning_configuration(
        &self,
        bucket: &str,
        config: VersioningConfiguration,
    ) -> S3Result<()>;

    /// One page of the version listing. The gateway fills in the echo
    /// fields (name, prefix, markers) afterwards.
    async fn list_bucket_versions(
        &self,
        bucket: &str,
        prefix: &Prefix,
        page: VersionsPage,
    ) -> S3Result<ListVersionsResult>;

    /// A specific version of an object, with the body.
    async fn get_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        range: Option<ObjectRangeRequest>,
    ) -> S3Result<Object>;

    /// Permanently remove a specific version (or delete marker).
    async fn delete_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
    ) -> S3Result<ObjectDeleteResult>;
}
