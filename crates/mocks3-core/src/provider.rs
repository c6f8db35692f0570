//! The gateway handler: [`MockS3`].
//!
//! `MockS3` owns the backend references, the multipart coordinator, the
//! clock, and the configuration, and implements the HTTP layer's
//! [`S3Handler`] by dispatching each identified operation to the matching
//! handler in [`ops`](crate::ops).
//!
//! The versioned capability is held as a second, optional trait object —
//! never discovered by downcasting. Handlers that need it call
//! [`MockS3::versioned`] and surface `NotImplemented` when it is absent.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use mocks3_auth::KeyStore;
use mocks3_http::{RoutingContext, S3Handler, S3HttpService, S3ResponseBody};
use mocks3_model::error::S3Result;
use mocks3_model::{S3Error, S3ErrorCode, S3Operation, SystemTimeSource, TimeSource};

use crate::backend::{Backend, VersionedBackend};
use crate::config::GatewayConfig;
use crate::mem::InMemoryBackend;
use crate::uploader::{IdSource, Uploader};

/// The S3 gateway: translates operations into backend calls and renders
/// wire-accurate responses.
pub struct MockS3 {
    pub(crate) storage: Arc<dyn Backend>,
    pub(crate) versioned: Option<Arc<dyn VersionedBackend>>,
    pub(crate) uploader: Arc<Uploader>,
    pub(crate) config: Arc<GatewayConfig>,
    pub(crate) clock: Arc<dyn TimeSource>,
}

impl std::fmt::Debug for MockS3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockS3")
            .field("versioned", &self.versioned.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Clone for MockS3 {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            versioned: self.versioned.clone(),
            uploader: Arc::clone(&self.uploader),
            config: Arc::clone(&self.config),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl MockS3 {
    /// Create a gateway over the given backend with default configuration.
    #[must_use]
    pub fn new(storage: Arc<dyn Backend>) -> Self {
        Self {
            storage,
            versioned: None,
            uploader: Arc::new(Uploader::default()),
            config: Arc::new(GatewayConfig::default()),
            clock: Arc::new(SystemTimeSource),
        }
    }

    /// Create a gateway over a fresh [`InMemoryBackend`], with versioning.
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = Arc::new(InMemoryBackend::default());
        Self::new(Arc::clone(&backend) as Arc<dyn Backend>)
            .with_versioned(backend as Arc<dyn VersionedBackend>)
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Attach the versioned capability.
    #[must_use]
    pub fn with_versioned(mut self, versioned: Arc<dyn VersionedBackend>) -> Self {
        self.versioned = Some(versioned);
        self
    }

    /// Replace the clock. Tests freeze time this way.
    #[must_use]
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the upload-ID source. Tests mint predictable IDs this way.
    #[must_use]
    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.uploader = Arc::new(Uploader::new(ids));
        self
    }

    /// Wrap this gateway in the HTTP service, wiring the configured auth
    /// keys, clock, and middleware settings.
    #[must_use]
    pub fn into_service(self) -> S3HttpService<MockS3> {
        let http_config = self.config.http_config();
        let keys = Arc::new(KeyStore::new(self.config.auth_keys.clone()));
        let clock = Arc::clone(&self.clock);

        S3HttpService::new(self, http_config)
            .with_auth_keys(keys)
            .with_time_source(clock)
    }

    /// The versioned capability, or `NotImplemented`.
    pub(crate) fn versioned(&self) -> S3Result<&Arc<dyn VersionedBackend>> {
        self.versioned
            .as_ref()
            .ok_or_else(|| S3Error::new(S3ErrorCode::NotImplemented))
    }

    /// Fail with `NoSuchBucket` unless the bucket exists, creating it
    /// first when auto-bucket is on.
    pub(crate) async fn ensure_bucket_exists(&self, bucket: &str) -> S3Result<()> {
        if self.storage.bucket_exists(bucket).await? {
            return Ok(());
        }

        if self.config.auto_bucket {
            match self.storage.create_bucket(bucket).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(bucket, %err, "auto-bucket create failed");
                    return Err(S3Error::resource_error(S3ErrorCode::NoSuchBucket, bucket));
                }
            }
        }

        Err(S3Error::resource_error(S3ErrorCode::NoSuchBucket, bucket))
    }

    /// The bucket named by the routing context.
    fn require_bucket(ctx: &RoutingContext) -> S3Result<String> {
        ctx.bucket
            .clone()
            .ok_or_else(|| S3Error::internal_error("routing produced no bucket"))
    }

    /// The bucket and key named by the routing context.
    fn require_object(ctx: &RoutingContext) -> S3Result<(String, String)> {
        let bucket = Self::require_bucket(ctx)?;
        let key = ctx
            .key
            .clone()
            .ok_or_else(|| S3Error::internal_error("routing produced no key"))?;
        Ok((bucket, key))
    }

    async fn dispatch(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        match op {
            S3Operation::ListBuckets => self.list_buckets().await,
            S3Operation::ListObjects => {
                let bucket = Self::require_bucket(&ctx)?;
                self.list_bucket(&bucket, &ctx, false).await
            }
            S3Operation::ListObjectsV2 => {
                let bucket = Self::require_bucket(&ctx)?;
                self.list_bucket(&bucket, &ctx, true).await
            }
            S3Operation::ListObjectVersions => {
                let bucket = Self::require_bucket(&ctx)?;
                self.list_bucket_versions(&bucket, &ctx).await
            }
            S3Operation::GetBucketLocation => {
                let bucket = Self::require_bucket(&ctx)?;
                self.get_bucket_location(&bucket).await
            }
            S3Operation::GetBucketVersioning => {
                let bucket = Self::require_bucket(&ctx)?;
                self.get_bucket_versioning(&bucket).await
            }
            S3Operation::PutBucketVersioning => {
                let bucket = Self::require_bucket(&ctx)?;
                self.put_bucket_versioning(&bucket, &body).await
            }
            S3Operation::CreateBucket => {
                let bucket = Self::require_bucket(&ctx)?;
                self.create_bucket(&bucket).await
            }
            S3Operation::HeadBucket => {
                let bucket = Self::require_bucket(&ctx)?;
                self.head_bucket(&bucket).await
            }
            S3Operation::DeleteBucket => {
                let bucket = Self::require_bucket(&ctx)?;
                self.delete_bucket(&bucket).await
            }
            S3Operation::DeleteObjects => {
                let bucket = Self::require_bucket(&ctx)?;
                self.multi_delete(&bucket, &body).await
            }
            S3Operation::PostObject => {
                let bucket = Self::require_bucket(&ctx)?;
                self.post_object(&bucket, &parts, &body).await
            }
            S3Operation::GetObject => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.get_or_head_object(&bucket, &key, &parts, &ctx, false).await
            }
            S3Operation::HeadObject => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.get_or_head_object(&bucket, &key, &parts, &ctx, true).await
            }
            S3Operation::PutObject => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.put_object(&bucket, &key, &parts, body).await
            }
            S3Operation::CopyObject => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.copy_object(&bucket, &key, &parts).await
            }
            S3Operation::DeleteObject => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.delete_object(&bucket, &key, &ctx).await
            }
            S3Operation::CreateMultipartUpload => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.initiate_multipart_upload(&bucket, &key, &parts).await
            }
            S3Operation::UploadPart => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.upload_part(&bucket, &key, &parts, body, &ctx).await
            }
            S3Operation::ListParts => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.list_parts(&bucket, &key, &ctx).await
            }
            S3Operation::ListMultipartUploads => {
                let bucket = Self::require_bucket(&ctx)?;
                self.list_multipart_uploads(&bucket, &ctx).await
            }
            S3Operation::CompleteMultipartUpload => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.complete_multipart_upload(&bucket, &key, &body, &ctx).await
            }
            S3Operation::AbortMultipartUpload => {
                let (bucket, key) = Self::require_object(&ctx)?;
                self.abort_multipart_upload(&bucket, &key, &ctx).await
            }
        }
    }
}

impl S3Handler for MockS3 {
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>> {
        let this = self.clone();
        Box::pin(async move { this.dispatch(op, parts, body, ctx).await })
    }
}
