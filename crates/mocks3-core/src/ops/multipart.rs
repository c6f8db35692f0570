//! Multipart upload handlers: initiate, upload part, list parts/uploads,
//! complete, and abort.

use bytes::Bytes;
use tracing::info;

use mocks3_http::response::{empty_response, xml_ok};
use mocks3_http::{RoutingContext, S3ResponseBody};
use mocks3_model::error::S3Result;
use mocks3_model::types::{
    CompleteMultipartUpload, CompleteMultipartUploadResult, InitiateMultipartUploadResult,
};
use mocks3_model::{S3Error, S3ErrorCode};

use crate::backend::Prefix;
use crate::meta::metadata_headers;
use crate::ops::parse_clamped;
use crate::ops::object::declared_content_length;
use crate::provider::MockS3;
use crate::uploader::MAX_UPLOAD_PART_NUMBER;

/// Default and maximum page size for ListMultipartUploads.
const MAX_UPLOADS_LIMIT: u64 = 1000;

/// Default and maximum page size for ListParts.
const MAX_UPLOAD_PARTS_LIMIT: u64 = 1000;

impl MockS3 {
    /// POST /bucket/key?uploads.
    pub(crate) async fn initiate_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        parts: &http::request::Parts,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, key, "initiate multipart upload");

        // Metadata is captured here, not at completion.
        let meta = metadata_headers(
            &parts.headers,
            self.clock.now(),
            self.config.metadata_size_limit,
        )?;
        self.ensure_bucket_exists(bucket).await?;

        let upload = self.uploader.begin(bucket, key, meta, self.clock.now());
        let result = InitiateMultipartUploadResult {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            upload_id: upload.id.clone(),
        };
        xml_ok("InitiateMultipartUploadResult", &result)
    }

    /// PUT /bucket/key?partNumber=N&uploadId=ID.
    pub(crate) async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        parts: &http::request::Parts,
        body: Bytes,
        ctx: &RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        let upload_id = ctx.query_value("uploadId").unwrap_or_default();
        info!(bucket, key, upload_id, "upload part");

        let part_number: u32 = ctx
            .query_value("partNumber")
            .and_then(|raw| raw.parse().ok())
            .filter(|n| *n >= 1 && *n <= MAX_UPLOAD_PART_NUMBER)
            .ok_or_else(|| S3Error::new(S3ErrorCode::InvalidPart))?;

        let declared = declared_content_length(parts)
            .map_err(|_| S3Error::new(S3ErrorCode::MissingContentLength))?;

        let upload = self.uploader.get(bucket, key, upload_id)?;

        let payload = self.extract_payload(parts, body, declared)?;
        self.check_integrity(parts, &payload)?;

        let etag = upload.add_part(part_number, self.clock.now(), payload)?;

        let mut response = empty_response(http::StatusCode::OK)?;
        if let Ok(hv) = http::header::HeaderValue::from_str(&etag) {
            response.headers_mut().insert(http::header::ETAG, hv);
        }
        Ok(response)
    }

    /// GET /bucket/key?uploadId=ID.
    pub(crate) async fn list_parts(
        &self,
        bucket: &str,
        key: &str,
        ctx: &RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;

        let upload_id = ctx.query_value("uploadId").unwrap_or_default();
        let upload = self.uploader.get(bucket, key, upload_id)?;

        let marker = parse_clamped(
            ctx.query_value("part-number-marker"),
            0,
            u64::from(MAX_UPLOAD_PART_NUMBER),
        )?;
        let max_parts = parse_clamped(
            ctx.query_value("max-parts"),
            MAX_UPLOAD_PARTS_LIMIT,
            MAX_UPLOAD_PARTS_LIMIT,
        )?;

        let result = upload.list_parts(u32::try_from(marker).unwrap_or(0), max_parts);
        xml_ok("ListPartsResult", &result)
    }

    /// GET /bucket?uploads.
    pub(crate) async fn list_multipart_uploads(
        &self,
        bucket: &str,
        ctx: &RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;

        let prefix = Prefix::from_query(ctx.query_value("prefix"), ctx.query_value("delimiter"));
        let key_marker = ctx.query_value("key-marker").unwrap_or_default();
        let upload_id_marker = ctx.query_value("upload-id-marker").unwrap_or_default();

        let mut max_uploads = parse_clamped(
            ctx.query_value("max-uploads"),
            MAX_UPLOADS_LIMIT,
            MAX_UPLOADS_LIMIT,
        )?;
        if max_uploads == 0 {
            max_uploads = MAX_UPLOADS_LIMIT;
        }

        let result = self
            .uploader
            .list(bucket, &prefix, key_marker, upload_id_marker, max_uploads);
        xml_ok("ListMultipartUploadsResult", &result)
    }

    /// POST /bucket/key?uploadId=ID.
    pub(crate) async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        ctx: &RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        let upload_id = ctx.query_value("uploadId").unwrap_or_default();
        info!(bucket, key, upload_id, "complete multipart upload");

        let manifest: CompleteMultipartUpload = mocks3_xml::from_xml(body)
            .map_err(|e| S3Error::with_message(S3ErrorCode::MalformedXML, e.to_string()))?;

        // Removal is atomic: a concurrent Complete or Abort for the same
        // upload observes NoSuchUpload from here on.
        let upload = self.uploader.complete(bucket, key, upload_id)?;
        let (data, etag) = upload.reassemble(&manifest)?;

        let result = self
            .storage
            .put_object(bucket, key, upload.meta.clone(), data)
            .await?;

        let mut response = xml_ok(
            "CompleteMultipartUploadResult",
            &CompleteMultipartUploadResult {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                etag,
            },
        )?;
        if let Some(version_id) = result.version_id.filter(|id| !id.is_empty()) {
            if let Ok(hv) = http::header::HeaderValue::from_str(&version_id) {
                response.headers_mut().insert("x-amz-version-id", hv);
            }
        }
        Ok(response)
    }

    /// DELETE /bucket/key?uploadId=ID.
    pub(crate) async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        ctx: &RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        let upload_id = ctx.query_value("uploadId").unwrap_or_default();
        info!(bucket, key, upload_id, "abort multipart upload");

        // Abort is complete-and-discard.
        self.uploader.complete(bucket, key, upload_id)?;
        empty_response(http::StatusCode::NO_CONTENT)
    }
}
