//! The in-memory reference backend.
//!
//! A complete [`Backend`] + [`VersionedBackend`] implementation backed by
//! per-bucket `BTreeMap`s (sorted keys make listing pagination a range
//! scan). Each key maps to its version list, newest first; the first entry
//! is the current version. Unversioned writes keep exactly one entry with
//! an empty version ID, which the gateway renders as `"null"`.
//!
//! This is the backend the test suite runs against and a usable default
//! for embedders; production deployments plug their own storage in.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use mocks3_model::error::{S3Error, S3ErrorCode, S3Result};
use mocks3_model::types::{
    BucketInfo, Content, CopyObjectResult, DeleteMarker as DeleteMarkerEntry, DeleteResult,
    DeletedObject, ListVersionsResult, ObjectVersion as VersionListEntry, Owner,
    STORAGE_CLASS_STANDARD, VersionEntry, VersioningConfiguration, VersioningStatus,
};
use mocks3_model::{SystemTimeSource, TimeSource};

use crate::backend::{
    Backend, ListBucketPage, Object, ObjectDeleteResult, ObjectList, Prefix, PrefixMatch,
    PutObjectResult, VersionedBackend, VersionsPage,
};
use crate::checksums;
use crate::range::ObjectRangeRequest;

/// A stored object version.
#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    hash: Vec<u8>,
    meta: HashMap<String, String>,
    version_id: String,
    modified: DateTime<Utc>,
}

/// One entry in a key's version list.
#[derive(Debug, Clone)]
enum StoredVersion {
    Object(StoredObject),
    DeleteMarker {
        version_id: String,
        modified: DateTime<Utc>,
    },
}

impl StoredVersion {
    fn version_id(&self) -> &str {
        match self {
            Self::Object(obj) => &obj.version_id,
            Self::DeleteMarker { version_id, .. } => version_id,
        }
    }

    fn is_delete_marker(&self) -> bool {
        matches!(self, Self::DeleteMarker { .. })
    }
}

/// Per-bucket state.
#[derive(Debug, Default)]
struct BucketData {
    created_at: DateTime<Utc>,
    /// `None` means versioning was never enabled.
    versioning: Option<VersioningStatus>,
    /// Key to version list, newest version first.
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

impl BucketData {
    /// The current (latest non-delete-marker) object for a key, if the key
    /// is visible.
    fn current(&self, key: &str) -> Option<&StoredVersion> {
        self.objects.get(key).and_then(|versions| versions.first())
    }
}

/// In-memory storage with full versioning support.
pub struct InMemoryBackend {
    buckets: RwLock<HashMap<String, BucketData>>,
    clock: Arc<dyn TimeSource>,
    next_version: AtomicU64,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buckets = self.buckets.read().map(|b| b.len()).unwrap_or(0);
        f.debug_struct("InMemoryBackend")
            .field("buckets", &buckets)
            .finish()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Arc::new(SystemTimeSource))
    }
}

impl InMemoryBackend {
    /// Create a backend stamping times from the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            clock,
            next_version: AtomicU64::new(1),
        }
    }

    fn generate_version_id(&self) -> String {
        format!("{:032x}", self.next_version.fetch_add(1, Ordering::Relaxed))
    }

    /// Render a stored version as a backend [`Object`], applying a range.
    fn object_response(
        key: &str,
        version: &StoredVersion,
        range: Option<ObjectRangeRequest>,
        with_body: bool,
    ) -> S3Result<Object> {
        match version {
            StoredVersion::DeleteMarker { version_id, .. } => Ok(Object {
                name: key.to_owned(),
                metadata: HashMap::new(),
                size: 0,
                contents: Bytes::new(),
                hash: Vec::new(),
                range: None,
                version_id: version_id.clone(),
                is_delete_marker: true,
            }),
            StoredVersion::Object(stored) => {
                let size = stored.data.len() as u64;
                let (contents, applied) = match range {
                    Some(request) if with_body => {
                        let resolved = request.resolve(size)?;
                        let start = usize::try_from(resolved.start).unwrap_or(usize::MAX);
                        let end = usize::try_from(resolved.start + resolved.length)
                            .unwrap_or(usize::MAX);
                        (stored.data.slice(start..end), Some(resolved))
                    }
                    _ if with_body => (stored.data.clone(), None),
                    _ => (Bytes::new(), None),
                };

                Ok(Object {
                    name: key.to_owned(),
                    metadata: stored.meta.clone(),
                    size,
                    contents,
                    hash: stored.hash.clone(),
                    range: applied,
                    version_id: stored.version_id.clone(),
                    is_delete_marker: false,
                })
            }
        }
    }

    /// Delete one key under the bucket's versioning rules.
    fn delete_key(&self, data: &mut BucketData, key: &str) -> ObjectDeleteResult {
        match data.versioning {
            None => {
                data.objects.remove(key);
                ObjectDeleteResult::default()
            }
            Some(VersioningStatus::Enabled) => {
                let version_id = self.generate_version_id();
                data.objects
                    .entry(key.to_owned())
                    .or_default()
                    .insert(0, StoredVersion::DeleteMarker {
                        version_id: version_id.clone(),
                        modified: self.clock.now(),
                    });
                ObjectDeleteResult {
                    is_delete_marker: true,
                    version_id: Some(version_id),
                }
            }
            Some(VersioningStatus::Suspended) => {
                // A suspended bucket deletes with a null-version marker,
                // displacing any existing null version.
                let versions = data.objects.entry(key.to_owned()).or_default();
                versions.retain(|v| !v.version_id().is_empty());
                versions.insert(0, StoredVersion::DeleteMarker {
                    version_id: String::new(),
                    modified: self.clock.now(),
                });
                ObjectDeleteResult {
                    is_delete_marker: true,
                    version_id: None,
                }
            }
        }
    }
}

/// Look up a bucket or fail with `NoSuchBucket`.
macro_rules! bucket {
    ($map:expr, $name:expr) => {
        $map.get($name)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchBucket, $name))?
    };
}

/// Mutable bucket lookup.
macro_rules! bucket_mut {
    ($map:expr, $name:expr) => {
        $map.get_mut($name)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchBucket, $name))?
    };
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn list_buckets(&self) -> S3Result<Vec<BucketInfo>> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        let mut infos: Vec<BucketInfo> = buckets
            .iter()
            .map(|(name, data)| BucketInfo {
                name: name.clone(),
                creation_date: data.created_at,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn list_bucket(
        &self,
        name: &str,
        prefix: &Prefix,
        page: ListBucketPage,
    ) -> S3Result<ObjectList> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        let data = bucket!(buckets, name);

        let mut list = ObjectList::default();
        let mut seen_prefixes: Vec<String> = Vec::new();
        let mut count: u64 = 0;
        let cap = page.max_keys.unwrap_or(u64::MAX);

        for (key, versions) in &data.objects {
            if let Some(marker) = &page.marker {
                if key.as_str() <= marker.as_str() {
                    continue;
                }
            }

            let Some(current) = versions.first() else {
                continue;
            };
            let StoredVersion::Object(stored) = current else {
                // The current version is a delete marker: not listed.
                continue;
            };

            match prefix.match_key(key) {
                PrefixMatch::NoMatch => continue,
                PrefixMatch::CommonPrefix(common) => {
                    if seen_prefixes.contains(&common) {
                        continue;
                    }
                    if count >= cap {
                        list.is_truncated = true;
                        break;
                    }
                    seen_prefixes.push(common.clone());
                    list.common_prefixes.push(common);
                    list.next_marker = Some(key.clone());
                    count += 1;
                }
                PrefixMatch::Object => {
                    if count >= cap {
                        list.is_truncated = true;
                        break;
                    }
                    list.contents.push(Content {
                        key: key.clone(),
                        last_modified: stored.modified,
                        etag: format!("\"{}\"", hex::encode(&stored.hash)),
                        size: stored.data.len() as u64,
                        storage_class: STORAGE_CLASS_STANDARD.to_owned(),
                        owner: Some(Owner::gateway()),
                    });
                    list.next_marker = Some(key.clone());
                    count += 1;
                }
            }
        }

        if !list.is_truncated {
            list.next_marker = None;
        }
        Ok(list)
    }

    async fn create_bucket(&self, name: &str) -> S3Result<()> {
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");
        if buckets.contains_key(name) {
            return Err(S3Error::resource_error(
                S3ErrorCode::BucketAlreadyExists,
                name,
            ));
        }
        debug!(bucket = name, "creating bucket");
        buckets.insert(
            name.to_owned(),
            BucketData {
                created_at: self.clock.now(),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn bucket_exists(&self, name: &str) -> S3Result<bool> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        Ok(buckets.contains_key(name))
    }

    async fn delete_bucket(&self, name: &str) -> S3Result<()> {
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");
        {
            let data = bucket!(buckets, name);
            if !data.objects.is_empty() {
                return Err(S3Error::resource_error(S3ErrorCode::BucketNotEmpty, name));
            }
        }
        buckets.remove(name);
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> S3Result<Object> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        let data = bucket!(buckets, bucket);
        let version = data
            .current(key)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchKey, key))?;
        Self::object_response(key, version, None, false)
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ObjectRangeRequest>,
    ) -> S3Result<Object> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        let data = bucket!(buckets, bucket);
        let version = data
            .current(key)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchKey, key))?;
        Self::object_response(key, version, range, true)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        meta: HashMap<String, String>,
        body: Bytes,
    ) -> S3Result<PutObjectResult> {
        let hash = checksums::compute_md5(&body);
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");
        let data = bucket_mut!(buckets, bucket);

        let versioned = data.versioning == Some(VersioningStatus::Enabled);
        let version_id = if versioned {
            self.generate_version_id()
        } else {
            String::new()
        };

        let stored = StoredVersion::Object(StoredObject {
            data: body,
            hash,
            meta,
            version_id: version_id.clone(),
            modified: self.clock.now(),
        });

        let versions = data.objects.entry(key.to_owned()).or_default();
        if versioned {
            versions.insert(0, stored);
        } else {
            // Unversioned and suspended buckets write the null version,
            // displacing any previous null version.
            versions.retain(|v| !v.version_id().is_empty());
            versions.insert(0, stored);
        }

        Ok(PutObjectResult {
            version_id: versioned.then_some(version_id),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> S3Result<ObjectDeleteResult> {
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");
        let data = bucket_mut!(buckets, bucket);
        Ok(self.delete_key(data, key))
    }

    async fn delete_multi(&self, bucket: &str, keys: &[String]) -> S3Result<DeleteResult> {
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");
        let data = bucket_mut!(buckets, bucket);

        let mut result = DeleteResult::default();
        for key in keys {
            // Deletes are idempotent; a missing key still reports deleted.
            self.delete_key(data, key);
            result.deleted.push(DeletedObject { key: key.clone() });
        }
        Ok(result)
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        meta: HashMap<String, String>,
    ) -> S3Result<CopyObjectResult> {
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");

        let (body, hash) = {
            let src = bucket!(buckets, src_bucket);
            let version = src
                .current(src_key)
                .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchKey, src_key))?;
            match version {
                StoredVersion::Object(stored) => (stored.data.clone(), stored.hash.clone()),
                StoredVersion::DeleteMarker { .. } => {
                    return Err(S3Error::resource_error(S3ErrorCode::NoSuchKey, src_key));
                }
            }
        };

        let now = self.clock.now();
        let dst = bucket_mut!(buckets, dst_bucket);
        let versioned = dst.versioning == Some(VersioningStatus::Enabled);
        let version_id = if versioned {
            self.generate_version_id()
        } else {
            String::new()
        };

        let etag = format!("\"{}\"", hex::encode(&hash));
        let stored = StoredVersion::Object(StoredObject {
            data: body,
            hash,
            meta,
            version_id,
            modified: now,
        });

        let versions = dst.objects.entry(dst_key.to_owned()).or_default();
        if versioned {
            versions.insert(0, stored);
        } else {
            versions.retain(|v| !v.version_id().is_empty());
            versions.insert(0, stored);
        }

        Ok(CopyObjectResult {
            etag,
            last_modified: now,
        })
    }
}

#[async_trait]
impl VersionedBackend for InMemoryBackend {
    async fn versioning_configuration(&self, bucket: &str) -> S3Result<VersioningConfiguration> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        let data = bucket!(buckets, bucket);
        Ok(VersioningConfiguration {
            status: data.versioning,
            mfa_delete: None,
        })
    }

    async fn set_versioning_configuration(
        &self,
        bucket: &str,
        config: VersioningConfiguration,
    ) -> S3Result<()> {
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");
        let data = bucket_mut!(buckets, bucket);
        if let Some(status) = config.status {
            debug!(bucket, status = status.as_str(), "setting bucket versioning");
            data.versioning = Some(status);
        }
        Ok(())
    }

    async fn list_bucket_versions(
        &self,
        bucket: &str,
        prefix: &Prefix,
        page: VersionsPage,
    ) -> S3Result<ListVersionsResult> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        let data = bucket!(buckets, bucket);

        let key_marker = page.key_marker.as_deref().unwrap_or("");
        let version_marker = page.version_id_marker.as_deref().unwrap_or("");

        let mut result = ListVersionsResult::default();
        let mut seen_prefixes: Vec<String> = Vec::new();
        let mut count: u64 = 0;

        'keys: for (key, versions) in &data.objects {
            if !key_marker.is_empty() && key.as_str() < key_marker {
                continue;
            }

            match prefix.match_key(key) {
                PrefixMatch::NoMatch => continue,
                PrefixMatch::CommonPrefix(common) => {
                    if !seen_prefixes.contains(&common) {
                        seen_prefixes.push(common.clone());
                        result.common_prefixes.push(common);
                    }
                    continue;
                }
                PrefixMatch::Object => {}
            }

            // Within the marker key, resume after the marked version.
            let mut skipping = key.as_str() == key_marker && !version_marker.is_empty();

            for (idx, version) in versions.iter().enumerate() {
                if skipping {
                    if version.version_id() == version_marker {
                        skipping = false;
                    }
                    continue;
                }
                if key.as_str() == key_marker && version_marker.is_empty() {
                    // A bare key marker excludes the marker key entirely.
                    continue;
                }

                if count >= page.max_keys {
                    result.is_truncated = true;
                    break 'keys;
                }

                let entry = match version {
                    StoredVersion::Object(stored) => VersionEntry::Version(VersionListEntry {
                        key: key.clone(),
                        version_id: stored.version_id.clone(),
                        is_latest: idx == 0,
                        last_modified: stored.modified,
                        etag: format!("\"{}\"", hex::encode(&stored.hash)),
                        size: stored.data.len() as u64,
                        storage_class: STORAGE_CLASS_STANDARD.to_owned(),
                        owner: Some(Owner::gateway()),
                    }),
                    StoredVersion::DeleteMarker {
                        version_id,
                        modified,
                    } => VersionEntry::DeleteMarker(DeleteMarkerEntry {
                        key: key.clone(),
                        version_id: version_id.clone(),
                        is_latest: idx == 0,
                        last_modified: *modified,
                        owner: Some(Owner::gateway()),
                    }),
                };

                result.next_key_marker = Some(key.clone());
                result.next_version_id_marker = Some(version.version_id().to_owned());
                result.versions.push(entry);
                count += 1;
            }
        }

        if !result.is_truncated {
            result.next_key_marker = None;
            result.next_version_id_marker = None;
        }
        Ok(result)
    }

    async fn get_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        range: Option<ObjectRangeRequest>,
    ) -> S3Result<Object> {
        let buckets = self.buckets.read().expect("bucket lock poisoned");
        let data = bucket!(buckets, bucket);
        let versions = data
            .objects
            .get(key)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchKey, key))?;

        let wanted = normalize_version_id(version_id);
        let version = versions
            .iter()
            .find(|v| v.version_id() == wanted)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchVersion, version_id))?;

        Self::object_response(key, version, range, true)
    }

    async fn delete_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
    ) -> S3Result<ObjectDeleteResult> {
        let mut buckets = self.buckets.write().expect("bucket lock poisoned");
        let data = bucket_mut!(buckets, bucket);
        let versions = data
            .objects
            .get_mut(key)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchKey, key))?;

        let wanted = normalize_version_id(version_id);
        let idx = versions
            .iter()
            .position(|v| v.version_id() == wanted)
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchVersion, version_id))?;

        let removed = versions.remove(idx);
        if versions.is_empty() {
            data.objects.remove(key);
        }

        Ok(ObjectDeleteResult {
            is_delete_marker: removed.is_delete_marker(),
            version_id: Some(version_id.to_owned()),
        })
    }
}

/// Clients address the null version as `"null"`; it is stored as the empty
/// string.
fn normalize_version_id(version_id: &str) -> &str {
    if version_id == "null" { "" } else { version_id }
}
