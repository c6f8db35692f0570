//! The multipart upload coordinator.
//!
//! A process-wide registry maps upload IDs to open uploads; each upload
//! guards its own part table. The registry exclusively owns open uploads:
//! `complete` and `abort` atomically remove the entry, after which any
//! concurrent part upload still holding the `Arc` finishes against a
//! detached upload whose memory is released when that handler returns.
//!
//! Upload IDs come from an injected [`IdSource`] so tests can mint
//! predictable IDs; the default draws 32 random bytes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use mocks3_model::types::{
    CompleteMultipartUpload, ListMultipartUploadsResult, ListPart, ListPartsResult, ListedUpload,
    STORAGE_CLASS_STANDARD,
};
use mocks3_model::{S3Error, S3ErrorCode};

use crate::backend::Prefix;
use crate::checksums;

/// Highest part number a client may upload.
pub const MAX_UPLOAD_PART_NUMBER: u32 = 10_000;

/// Minimum size of every part except the last, enforced at completion.
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// A source of upload IDs.
pub trait IdSource: Send + Sync {
    /// Mint a fresh, unguessable upload ID.
    fn upload_id(&self) -> String;
}

/// The default ID source: 32 random bytes, hex-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn upload_id(&self) -> String {
        let mut buf = [0u8; 32];
        rand::rng().fill(&mut buf);
        hex::encode(buf)
    }
}

/// One uploaded part.
#[derive(Debug, Clone)]
struct UploadPart {
    /// Unquoted hex MD5 of the body.
    etag_hex: String,
    body: Bytes,
    last_modified: DateTime<Utc>,
}

/// An open multipart upload.
#[derive(Debug)]
pub struct MultipartUpload {
    /// The upload ID.
    pub id: String,
    /// The bucket the upload targets.
    pub bucket: String,
    /// The key the upload will create.
    pub key: String,
    /// Metadata captured at initiation; applied to the final object.
    pub meta: HashMap<String, String>,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    parts: Mutex<BTreeMap<u32, UploadPart>>,
}

impl MultipartUpload {
    /// Store a part, overwriting any previous part with the same number.
    /// Returns the part's quoted ETag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPart` when the part number is outside `1..=10000`.
    pub fn add_part(
        &self,
        part_number: u32,
        at: DateTime<Utc>,
        body: Bytes,
    ) -> Result<String, S3Error> {
        if part_number == 0 || part_number > MAX_UPLOAD_PART_NUMBER {
            return Err(S3Error::new(S3ErrorCode::InvalidPart));
        }

        let etag_hex = checksums::compute_md5_hex(&body);
        let etag = format!("\"{etag_hex}\"");

        let mut parts = self.parts.lock().expect("upload parts lock poisoned");
        parts.insert(
            part_number,
            UploadPart {
                etag_hex,
                body,
                last_modified: at,
            },
        );

        Ok(etag)
    }

    /// One page of this upload's parts, ascending by part number.
    #[must_use]
    pub fn list_parts(&self, part_number_marker: u32, max_parts: u64) -> ListPartsResult {
        let parts = self.parts.lock().expect("upload parts lock poisoned");

        let mut page: Vec<ListPart> = Vec::new();
        let mut is_truncated = false;
        for (&number, part) in parts.range(part_number_marker.saturating_add(1)..) {
            if page.len() as u64 >= max_parts {
                is_truncated = true;
                break;
            }
            page.push(ListPart {
                part_number: number,
                last_modified: part.last_modified,
                etag: format!("\"{}\"", part.etag_hex),
                size: part.body.len() as u64,
            });
        }

        let next_part_number_marker = if is_truncated {
            page.last().map_or(0, |p| p.part_number)
        } else {
            0
        };

        ListPartsResult {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            upload_id: self.id.clone(),
            part_number_marker,
            next_part_number_marker,
            max_parts,
            is_truncated,
            parts: page,
        }
    }

    /// Assemble the final object from the client's part manifest.
    ///
    /// Validation: at least one part; strictly increasing part numbers;
    /// every referenced part stored with a matching ETag; every part but
    /// the last at least 5 MiB. The result is the concatenated body and
    /// the composite multipart ETag.
    ///
    /// # Errors
    ///
    /// `InvalidPartOrder`, `InvalidPart`, or `EntityTooSmall` per the rules
    /// above.
    pub fn reassemble(&self, manifest: &CompleteMultipartUpload) -> Result<(Bytes, String), S3Error> {
        let parts = self.parts.lock().expect("upload parts lock poisoned");

        if manifest.parts.is_empty() {
            return Err(S3Error::with_message(
                S3ErrorCode::InvalidPart,
                "you must specify at least one part",
            ));
        }

        let in_order = manifest
            .parts
            .windows(2)
            .all(|pair| pair[0].part_number < pair[1].part_number);
        if !in_order {
            return Err(S3Error::new(S3ErrorCode::InvalidPartOrder));
        }

        let mut size = 0usize;
        for requested in &manifest.parts {
            let Some(stored) = parts.get(&requested.part_number) else {
                return Err(S3Error::new(S3ErrorCode::InvalidPart));
            };
            if trim_etag(&requested.etag) != stored.etag_hex {
                return Err(S3Error::new(S3ErrorCode::InvalidPart));
            }
            size += stored.body.len();
        }

        // All but the last part must meet the minimum size.
        for requested in &manifest.parts[..manifest.parts.len() - 1] {
            let stored = &parts[&requested.part_number];
            if (stored.body.len() as u64) < MIN_PART_SIZE {
                return Err(S3Error::new(S3ErrorCode::EntityTooSmall));
            }
        }

        let mut body = BytesMut::with_capacity(size);
        let mut part_hashes = Vec::with_capacity(manifest.parts.len());
        for requested in &manifest.parts {
            let stored = &parts[&requested.part_number];
            body.extend_from_slice(&stored.body);
            part_hashes.push(stored.etag_hex.clone());
        }

        let etag = checksums::compute_multipart_etag(&part_hashes, manifest.parts.len());
        Ok((body.freeze(), etag))
    }
}

/// Strip surrounding quotes from a client-supplied ETag.
fn trim_etag(etag: &str) -> &str {
    etag.trim_matches('"')
}

/// The process-wide registry of open uploads.
pub struct Uploader {
    uploads: Mutex<HashMap<String, Arc<MultipartUpload>>>,
    ids: Arc<dyn IdSource>,
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.uploads.lock().map(|u| u.len()).unwrap_or(0);
        f.debug_struct("Uploader").field("open_uploads", &count).finish()
    }
}

impl Default for Uploader {
    fn default() -> Self {
        Self::new(Arc::new(RandomIdSource))
    }
}

impl Uploader {
    /// Create a coordinator minting IDs from the given source.
    #[must_use]
    pub fn new(ids: Arc<dyn IdSource>) -> Self {
        Self {
            uploads: Mutex::new(HashMap::new()),
            ids,
        }
    }

    /// Open a new upload, capturing metadata now rather than at completion.
    pub fn begin(
        &self,
        bucket: &str,
        key: &str,
        meta: HashMap<String, String>,
        at: DateTime<Utc>,
    ) -> Arc<MultipartUpload> {
        let upload = Arc::new(MultipartUpload {
            id: self.ids.upload_id(),
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            meta,
            initiated: at,
            parts: Mutex::new(BTreeMap::new()),
        });

        debug!(upload_id = %upload.id, bucket, key, "initiated multipart upload");

        let mut uploads = self.uploads.lock().expect("uploader lock poisoned");
        uploads.insert(upload.id.clone(), Arc::clone(&upload));
        upload
    }

    /// Look up an open upload. All three of bucket, key, and ID must match.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchUpload` on any mismatch.
    pub fn get(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Arc<MultipartUpload>, S3Error> {
        let uploads = self.uploads.lock().expect("uploader lock poisoned");
        uploads
            .get(upload_id)
            .filter(|upload| upload.bucket == bucket && upload.key == key)
            .cloned()
            .ok_or_else(|| S3Error::resource_error(S3ErrorCode::NoSuchUpload, upload_id))
    }

    /// Atomically remove and return an upload for completion or abort.
    /// A second call for the same ID observes absence.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchUpload` when the upload is gone or mismatched.
    pub fn complete(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Arc<MultipartUpload>, S3Error> {
        let mut uploads = self.uploads.lock().expect("uploader lock poisoned");

        let matches = uploads
            .get(upload_id)
            .is_some_and(|upload| upload.bucket == bucket && upload.key == key);
        if !matches {
            return Err(S3Error::resource_error(S3ErrorCode::NoSuchUpload, upload_id));
        }

        Ok(uploads.remove(upload_id).expect("checked above"))
    }

    /// One page of a bucket's in-progress uploads, ordered by
    /// `(key, upload_id)` and filtered by prefix.
    #[must_use]
    pub fn list(
        &self,
        bucket: &str,
        prefix: &Prefix,
        key_marker: &str,
        upload_id_marker: &str,
        max_uploads: u64,
    ) -> ListMultipartUploadsResult {
        let uploads = self.uploads.lock().expect("uploader lock poisoned");

        let mut matching: Vec<&Arc<MultipartUpload>> = uploads
            .values()
            .filter(|upload| upload.bucket == bucket)
            .filter(|upload| upload.key.starts_with(prefix.prefix.as_str()))
            .filter(|upload| after_marker(upload, key_marker, upload_id_marker))
            .collect();
        matching.sort_by(|a, b| (&a.key, &a.id).cmp(&(&b.key, &b.id)));

        let is_truncated = matching.len() as u64 > max_uploads;
        matching.truncate(usize::try_from(max_uploads).unwrap_or(usize::MAX));

        let (next_key_marker, next_upload_id_marker) = if is_truncated {
            matching
                .last()
                .map(|upload| (Some(upload.key.clone()), Some(upload.id.clone())))
                .unwrap_or((None, None))
        } else {
            (None, None)
        };

        ListMultipartUploadsResult {
            bucket: bucket.to_owned(),
            key_marker: key_marker.to_owned(),
            upload_id_marker: upload_id_marker.to_owned(),
            next_key_marker,
            next_upload_id_marker,
            max_uploads,
            is_truncated,
            prefix: prefix.prefix.clone(),
            uploads: matching
                .into_iter()
                .map(|upload| ListedUpload {
                    key: upload.key.clone(),
                    upload_id: upload.id.clone(),
                    initiated: upload.initiated,
                    storage_class: STORAGE_CLASS_STANDARD.to_owned(),
                })
                .collect(),
        }
    }
}

/// Whether an upload sorts after the `(key-marker, upload-id-marker)` pair.
fn after_marker(upload: &MultipartUpload, key_marker: &str, upload_id_marker: &str) -> bool {
    if key_marker.is_empty() {
        return true;
    }
    if upload.key.as_str() > key_marker {
        return true;
    }
    upload.key == key_marker
        && !upload_id_marker.is_empty()
        && upload.id.as_str() > upload_id_marker
}
