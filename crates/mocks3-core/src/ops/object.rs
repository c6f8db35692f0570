//! Object-level handlers: GET/HEAD, PUT, copy, delete, multi-delete, and
//! the browser form upload.

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use tracing::info;

use mocks3_http::codec::{decode_aws_chunked, is_aws_chunked};
use mocks3_http::multipart::{extract_boundary, parse_multipart};
use mocks3_http::response::{empty_response, xml_ok};
use mocks3_http::{RequestId, RoutingContext, S3ResponseBody};
use mocks3_model::error::S3Result;
use mocks3_model::types::DeleteRequest;
use mocks3_model::{S3Error, S3ErrorCode};

use crate::backend::Object;
use crate::checksums;
use crate::meta::{metadata_from_fields, metadata_headers};
use crate::provider::MockS3;
use crate::range::parse_range_header;
use crate::validation::validate_key;

impl MockS3 {
    /// GET /bucket/key and HEAD /bucket/key.
    ///
    /// The two share everything except the body and the `Range` handling,
    /// which only GET honors. `?versionId` selects a specific version on
    /// GET and requires the versioned capability.
    pub(crate) async fn get_or_head_object(
        &self,
        bucket: &str,
        key: &str,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        head: bool,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, key, head, "get object");
        self.ensure_bucket_exists(bucket).await?;

        let object = if head {
            self.storage.head_object(bucket, key).await?
        } else {
            let range = parse_range_header(
                parts
                    .headers
                    .get(http::header::RANGE)
                    .and_then(|v| v.to_str().ok()),
            )?;
            match ctx.query_value("versionId") {
                Some(version_id) => {
                    self.versioned()?
                        .get_object_version(bucket, key, version_id, range)
                        .await?
                }
                None => self.storage.get_object(bucket, key, range).await?,
            }
        };

        if object.is_delete_marker {
            return delete_marker_response(&object, parts, key, head);
        }

        let etag = object.etag();

        if let Some(if_none_match) = parts
            .headers
            .get(http::header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
        {
            if if_none_match == etag {
                let mut response = empty_response(http::StatusCode::NOT_MODIFIED)?;
                if let Ok(hv) = http::header::HeaderValue::from_str(&etag) {
                    response.headers_mut().insert(http::header::ETAG, hv);
                }
                return Ok(response);
            }
        }

        let status = if object.range.is_some() {
            http::StatusCode::PARTIAL_CONTENT
        } else {
            http::StatusCode::OK
        };

        let body = if head {
            S3ResponseBody::empty()
        } else {
            S3ResponseBody::from_bytes(object.contents.clone())
        };

        let mut response = http::Response::builder()
            .status(status)
            .body(body)
            .map_err(|e| S3Error::internal_error(format!("failed to build response: {e}")))?;
        let headers = response.headers_mut();

        // Stored metadata first; the authoritative headers below override
        // anything it happens to carry (Content-Length in particular).
        for (name, value) in &object.metadata {
            let Ok(header_name) = http::header::HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            if let Ok(header_value) = http::header::HeaderValue::from_str(value) {
                headers.insert(header_name, header_value);
            }
        }

        if !object.version_id.is_empty() {
            if let Ok(hv) = http::header::HeaderValue::from_str(&object.version_id) {
                headers.insert("x-amz-version-id", hv);
            }
        }
        if let Ok(hv) = http::header::HeaderValue::from_str(&etag) {
            headers.insert(http::header::ETAG, hv);
        }
        headers.insert(
            http::header::ACCEPT_RANGES,
            http::header::HeaderValue::from_static("bytes"),
        );

        let content_length = if head {
            object.size
        } else {
            object.contents.len() as u64
        };
        headers.insert(http::header::CONTENT_LENGTH, content_length.into());
        if let Some(range) = object.range {
            if let Ok(hv) = http::header::HeaderValue::from_str(&range.content_range(object.size)) {
                headers.insert(http::header::CONTENT_RANGE, hv);
            }
        }

        Ok(response)
    }

    /// PUT /bucket/key.
    pub(crate) async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        parts: &http::request::Parts,
        body: Bytes,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, key, size = body.len(), "put object");
        self.ensure_bucket_exists(bucket).await?;

        let meta = metadata_headers(
            &parts.headers,
            self.clock.now(),
            self.config.metadata_size_limit,
        )?;

        let declared = declared_content_length(parts)?;
        validate_key(key)?;

        let payload = self.extract_payload(parts, body, declared)?;
        self.check_integrity(parts, &payload)?;

        let etag = checksums::compute_etag(&payload);
        let result = self.storage.put_object(bucket, key, meta, payload).await?;

        let mut response = empty_response(http::StatusCode::OK)?;
        set_etag_and_version(&mut response, &etag, result.version_id.as_deref());
        Ok(response)
    }

    /// PUT /bucket/key with `x-amz-copy-source`.
    pub(crate) async fn copy_object(
        &self,
        bucket: &str,
        key: &str,
        parts: &http::request::Parts,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;

        let source = parts
            .headers
            .get("x-amz-copy-source")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| S3Error::invalid_argument("x-amz-copy-source", "missing header"))?;

        let (src_bucket, src_key) = parse_copy_source(source)?;
        info!(src_bucket, src_key, bucket, key, "copy object");

        validate_key(key)?;

        let mut meta = metadata_headers(
            &parts.headers,
            self.clock.now(),
            self.config.metadata_size_limit,
        )?;
        // ACLs are not preserved across copies.
        meta.remove("x-amz-acl");

        let src_object = self.storage.head_object(&src_bucket, &src_key).await?;

        let result = self
            .storage
            .copy_object(&src_bucket, &src_key, bucket, key, meta)
            .await?;

        let mut response = xml_ok("CopyObjectResult", &result)?;
        if !src_object.version_id.is_empty() {
            if let Ok(hv) = http::header::HeaderValue::from_str(&src_object.version_id) {
                response
                    .headers_mut()
                    .insert("x-amz-copy-source-version-id", hv);
            }
        }
        Ok(response)
    }

    /// DELETE /bucket/key, optionally `?versionId=...`.
    pub(crate) async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        ctx: &RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, key, "delete object");
        self.ensure_bucket_exists(bucket).await?;

        let result = match ctx.query_value("versionId") {
            Some(version_id) => {
                self.versioned()?
                    .delete_object_version(bucket, key, version_id)
                    .await?
            }
            None => self.storage.delete_object(bucket, key).await?,
        };

        let mut response = empty_response(http::StatusCode::NO_CONTENT)?;
        let headers = response.headers_mut();
        headers.insert(
            "x-amz-delete-marker",
            http::header::HeaderValue::from_static(if result.is_delete_marker {
                "true"
            } else {
                "false"
            }),
        );
        if let Some(version_id) = result.version_id.filter(|id| !id.is_empty()) {
            if let Ok(hv) = http::header::HeaderValue::from_str(&version_id) {
                headers.insert("x-amz-version-id", hv);
            }
        }
        Ok(response)
    }

    /// POST /bucket?delete — multi-object delete.
    pub(crate) async fn multi_delete(
        &self,
        bucket: &str,
        body: &[u8],
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, "multi delete");
        self.ensure_bucket_exists(bucket).await?;

        let request: DeleteRequest = mocks3_xml::from_xml(body)
            .map_err(|e| S3Error::with_message(S3ErrorCode::MalformedXML, e.to_string()))?;

        let keys: Vec<String> = request
            .objects
            .iter()
            .map(|object| object.key.clone())
            .collect();

        let mut result = self.storage.delete_multi(bucket, &keys).await?;
        if request.quiet {
            result.deleted.clear();
        }

        xml_ok("DeleteResult", &result)
    }

    /// POST /bucket — browser-based form upload.
    pub(crate) async fn post_object(
        &self,
        bucket: &str,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, "browser upload");
        self.ensure_bucket_exists(bucket).await?;

        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| S3Error::new(S3ErrorCode::MalformedPOSTRequest))?;
        let boundary = extract_boundary(content_type)?;
        let form = parse_multipart(body, &boundary)?;

        let keys = form.values("key");
        if keys.len() != 1 || form.files.len() != 1 {
            return Err(S3Error::new(
                S3ErrorCode::IncorrectNumberOfFilesInPostRequest,
            ));
        }
        let key = keys[0].to_owned();
        validate_key(&key)?;

        let meta = metadata_from_fields(
            &form.fields,
            self.clock.now(),
            self.config.metadata_size_limit,
        )?;

        let data = form.files[0].data.clone();
        let etag = checksums::compute_etag(&data);
        let result = self.storage.put_object(bucket, &key, meta, data).await?;

        let mut response = empty_response(http::StatusCode::OK)?;
        set_etag_and_version(&mut response, &etag, result.version_id.as_deref());
        Ok(response)
    }

    /// Produce the stored payload: the raw body, or the de-chunked stream
    /// for `STREAMING-AWS4-HMAC-SHA256-PAYLOAD` bodies. Verifies the
    /// declared length either way.
    pub(crate) fn extract_payload(
        &self,
        parts: &http::request::Parts,
        body: Bytes,
        declared_length: u64,
    ) -> S3Result<Bytes> {
        let (payload, expected) = if is_aws_chunked(parts) {
            let decoded = decode_aws_chunked(&body)?;
            let expected = parts
                .headers
                .get("x-amz-decoded-content-length")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .ok_or_else(|| {
                    S3Error::invalid_argument(
                        "x-amz-decoded-content-length",
                        "missing or not an integer",
                    )
                })?;
            (decoded, expected)
        } else {
            (body, declared_length)
        };

        if payload.len() as u64 != expected {
            return Err(S3Error::new(S3ErrorCode::IncompleteBody));
        }
        Ok(payload)
    }

    /// Verify `Content-MD5` when integrity checking is on. A header that
    /// is present but empty is `InvalidDigest`.
    pub(crate) fn check_integrity(
        &self,
        parts: &http::request::Parts,
        payload: &[u8],
    ) -> S3Result<()> {
        if !self.config.integrity_check {
            return Ok(());
        }

        let Some(header) = parts.headers.get("content-md5") else {
            return Ok(());
        };
        let value = header
            .to_str()
            .map_err(|_| S3Error::new(S3ErrorCode::InvalidDigest))?;
        if value.is_empty() {
            return Err(S3Error::new(S3ErrorCode::InvalidDigest));
        }

        checksums::verify_content_md5(payload, value)
    }
}

/// Require and parse the `Content-Length` header.
pub(crate) fn declared_content_length(parts: &http::request::Parts) -> S3Result<u64> {
    let raw = parts
        .headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| S3Error::new(S3ErrorCode::MissingContentLength))?;

    raw.parse::<u64>()
        .map_err(|_| S3Error::invalid_argument("Content-Length", format!("invalid value {raw:?}")))
}

/// Split and decode an `x-amz-copy-source` value: `/srcBucket/srcKey`,
/// with an optional `?versionId=` suffix that is ignored.
fn parse_copy_source(source: &str) -> S3Result<(String, String)> {
    let trimmed = source.trim_start_matches('/');
    let (bucket, rest) = trimmed
        .split_once('/')
        .ok_or_else(|| S3Error::invalid_argument("x-amz-copy-source", source))?;

    let key_raw = rest.split('?').next().unwrap_or(rest);
    if bucket.is_empty() || key_raw.is_empty() {
        return Err(S3Error::invalid_argument("x-amz-copy-source", source));
    }

    let key = percent_decode_str(&key_raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned();
    Ok((bucket.to_owned(), key))
}

/// A GET/HEAD that landed on a delete marker: 404 `NoSuchKey` with the
/// marker headers set, body included except for HEAD.
fn delete_marker_response(
    object: &Object,
    parts: &http::request::Parts,
    key: &str,
    head: bool,
) -> S3Result<http::Response<S3ResponseBody>> {
    let err = S3Error::resource_error(S3ErrorCode::NoSuchKey, key);

    let body = if head {
        S3ResponseBody::empty()
    } else {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or("");
        let body = mocks3_xml::error_body(&err, request_id)
            .map_err(|e| S3Error::internal_error(format!("xml serialization failed: {e}")))?;
        S3ResponseBody::from_xml(body)
    };

    let mut response = http::Response::builder()
        .status(http::StatusCode::NOT_FOUND)
        .header(http::header::CONTENT_TYPE, "application/xml")
        .body(body)
        .map_err(|e| S3Error::internal_error(format!("failed to build response: {e}")))?;

    let headers = response.headers_mut();
    headers.insert(
        "x-amz-delete-marker",
        http::header::HeaderValue::from_static("true"),
    );
    if let Ok(hv) = http::header::HeaderValue::from_str(&object.version_id) {
        headers.insert("x-amz-version-id", hv);
    }

    Ok(response)
}

/// Stamp the `ETag` and optional `x-amz-version-id` headers on a write
/// response.
fn set_etag_and_version(
    response: &mut http::Response<S3ResponseBody>,
    etag: &str,
    version_id: Option<&str>,
) {
    let headers = response.headers_mut();
    if let Ok(hv) = http::header::HeaderValue::from_str(etag) {
        headers.insert(http::header::ETAG, hv);
    }
    if let Some(version_id) = version_id.filter(|id| !id.is_empty()) {
        if let Ok(hv) = http::header::HeaderValue::from_str(version_id) {
            headers.insert("x-amz-version-id", hv);
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use http_body_util::BodyExt;

    use mocks3_model::types::VersioningStatus;

    use super::*;

    fn gateway() -> MockS3 {
        MockS3::in_memory()
    }

    fn object_ctx(uri: &str) -> RoutingContext {
        let req = http::Request::builder().uri(uri).body(()).unwrap();
        mocks3_http::router::resolve(&req).unwrap()
    }

    fn put_parts(headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder().method("PUT").uri("/b/k");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn get_parts(headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder().method("GET").uri("/b/k");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn body_bytes(resp: http::Response<S3ResponseBody>) -> Vec<u8> {
        resp.into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes()
            .to_vec()
    }

    fn header<'a>(resp: &'a http::Response<S3ResponseBody>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    async fn put(gateway: &MockS3, key: &str, body: &'static [u8]) {
        let parts = put_parts(&[("content-length", &body.len().to_string())]);
        gateway
            .put_object("b", key, &parts, Bytes::from_static(body))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_should_put_then_get_round_trip() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let parts = put_parts(&[("content-length", "13"), ("content-type", "text/plain")]);
        let resp = gateway
            .put_object("b", "hello", &parts, Bytes::from_static(b"Hello, world\n"))
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(
            header(&resp, "etag"),
            Some("\"a7966bf58e23583c9a5a4059383ff850\""),
        );

        let resp = gateway
            .get_or_head_object("b", "hello", &get_parts(&[]), &object_ctx("/b/hello"), false)
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(header(&resp, "content-length"), Some("13"));
        assert_eq!(header(&resp, "accept-ranges"), Some("bytes"));
        assert_eq!(header(&resp, "content-type"), Some("text/plain"));
        assert_eq!(body_bytes(resp).await, b"Hello, world\n");
    }

    #[tokio::test]
    async fn test_should_serve_range_request_as_206() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        put(&gateway, "hello", b"Hello, world\n").await;

        let parts = get_parts(&[("range", "bytes=7-11")]);
        let resp = gateway
            .get_or_head_object("b", "hello", &parts, &object_ctx("/b/hello"), false)
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::PARTIAL_CONTENT);
        assert_eq!(header(&resp, "content-range"), Some("bytes 7-11/13"));
        assert_eq!(header(&resp, "content-length"), Some("5"));
        assert_eq!(body_bytes(resp).await, b"world");
    }

    #[tokio::test]
    async fn test_should_return_304_on_if_none_match() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        put(&gateway, "k", b"body").await;

        let etag = checksums::compute_etag(b"body");
        let parts = get_parts(&[("if-none-match", etag.as_str())]);
        let resp = gateway
            .get_or_head_object("b", "k", &parts, &object_ctx("/b/k"), false)
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_should_head_with_size_but_no_body() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        put(&gateway, "k", b"sixteen bytes!!!").await;

        let resp = gateway
            .get_or_head_object("b", "k", &get_parts(&[]), &object_ctx("/b/k"), true)
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(header(&resp, "content-length"), Some("16"));
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_should_require_content_length_on_put() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let err = gateway
            .put_object("b", "k", &put_parts(&[]), Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::MissingContentLength);
    }

    #[tokio::test]
    async fn test_should_reject_short_body() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let parts = put_parts(&[("content-length", "10")]);
        let err = gateway
            .put_object("b", "k", &parts, Bytes::from_static(b"short"))
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::IncompleteBody);
    }

    #[tokio::test]
    async fn test_should_reject_oversized_key() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let key = "k".repeat(1025);
        let parts = put_parts(&[("content-length", "1")]);
        let err = gateway
            .put_object("b", &key, &parts, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::KeyTooLong);
    }

    #[tokio::test]
    async fn test_should_verify_content_md5() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let good = BASE64.encode(checksums::compute_md5(b"body"));
        let parts = put_parts(&[("content-length", "4"), ("content-md5", good.as_str())]);
        assert!(
            gateway
                .put_object("b", "k", &parts, Bytes::from_static(b"body"))
                .await
                .is_ok()
        );

        let bad = BASE64.encode(checksums::compute_md5(b"different"));
        let parts = put_parts(&[("content-length", "4"), ("content-md5", bad.as_str())]);
        let err = gateway
            .put_object("b", "k", &parts, Bytes::from_static(b"body"))
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::BadDigest);
    }

    #[tokio::test]
    async fn test_should_reject_empty_content_md5_header() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let parts = put_parts(&[("content-length", "4"), ("content-md5", "")]);
        let err = gateway
            .put_object("b", "k", &parts, Bytes::from_static(b"body"))
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidDigest);
    }

    #[tokio::test]
    async fn test_should_skip_md5_check_when_integrity_off() {
        let gateway = gateway().with_config(
            crate::config::GatewayConfig::builder()
                .integrity_check(false)
                .build(),
        );
        gateway.storage.create_bucket("b").await.unwrap();

        let bad = BASE64.encode(checksums::compute_md5(b"different"));
        let parts = put_parts(&[("content-length", "4"), ("content-md5", bad.as_str())]);
        // ETag is still computed; only verification is skipped.
        let resp = gateway
            .put_object("b", "k", &parts, Bytes::from_static(b"body"))
            .await
            .unwrap();
        assert!(header(&resp, "etag").is_some());
    }

    #[tokio::test]
    async fn test_should_store_streaming_chunked_body() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let framed = b"5;chunk-signature=aa\r\nhello\r\n0;chunk-signature=bb\r\n\r\n";
        let parts = put_parts(&[
            ("content-length", &framed.len().to_string()),
            ("x-amz-content-sha256", "STREAMING-AWS4-HMAC-SHA256-PAYLOAD"),
            ("x-amz-decoded-content-length", "5"),
        ]);
        gateway
            .put_object("b", "k", &parts, Bytes::from_static(framed))
            .await
            .unwrap();

        let resp = gateway
            .get_or_head_object("b", "k", &get_parts(&[]), &object_ctx("/b/k"), false)
            .await
            .unwrap();
        assert_eq!(body_bytes(resp).await, b"hello");
    }

    #[tokio::test]
    async fn test_should_require_decoded_length_for_streaming() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let framed = b"5;chunk-signature=aa\r\nhello\r\n0\r\n\r\n";
        let parts = put_parts(&[
            ("content-length", &framed.len().to_string()),
            ("x-amz-content-sha256", "STREAMING-AWS4-HMAC-SHA256-PAYLOAD"),
        ]);
        let err = gateway
            .put_object("b", "k", &parts, Bytes::from_static(framed))
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_should_copy_object_with_result_body() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        gateway.storage.create_bucket("dst").await.unwrap();
        put(&gateway, "orig", b"copy me").await;

        let parts = put_parts(&[("x-amz-copy-source", "/b/orig")]);
        let resp = gateway.copy_object("dst", "copied", &parts).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        let body = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(body.contains("<CopyObjectResult"));
        assert!(body.contains("<ETag>"));
        assert!(body.contains("<LastModified>"));

        let resp = gateway
            .get_or_head_object("dst", "copied", &get_parts(&[]), &object_ctx("/dst/copied"), false)
            .await
            .unwrap();
        assert_eq!(body_bytes(resp).await, b"copy me");
    }

    #[tokio::test]
    async fn test_should_decode_copy_source_key() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        put(&gateway, "my key/nested", b"data").await;

        let parts = put_parts(&[("x-amz-copy-source", "/b/my%20key/nested?versionId=null")]);
        let resp = gateway.copy_object("b", "dst", &parts).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_propagate_missing_copy_source() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let parts = put_parts(&[("x-amz-copy-source", "/b/ghost")]);
        let err = gateway.copy_object("b", "dst", &parts).await.unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NoSuchKey);
    }

    #[tokio::test]
    async fn test_should_delete_object_with_marker_header() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        put(&gateway, "k", b"x").await;

        let resp = gateway
            .delete_object("b", "k", &object_ctx("/b/k"))
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
        assert_eq!(header(&resp, "x-amz-delete-marker"), Some("false"));
        assert!(header(&resp, "x-amz-version-id").is_none());
    }

    #[tokio::test]
    async fn test_should_report_delete_marker_in_versioned_bucket() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        gateway
            .versioned
            .as_ref()
            .unwrap()
            .set_versioning_configuration(
                "b",
                mocks3_model::types::VersioningConfiguration {
                    status: Some(VersioningStatus::Enabled),
                    mfa_delete: None,
                },
            )
            .await
            .unwrap();
        put(&gateway, "k", b"x").await;

        let resp = gateway
            .delete_object("b", "k", &object_ctx("/b/k"))
            .await
            .unwrap();
        assert_eq!(header(&resp, "x-amz-delete-marker"), Some("true"));
        let marker_id = header(&resp, "x-amz-version-id").unwrap().to_owned();

        // GET now lands on the marker: 404 plus marker headers.
        let resp = gateway
            .get_or_head_object("b", "k", &get_parts(&[]), &object_ctx("/b/k"), false)
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(header(&resp, "x-amz-delete-marker"), Some("true"));
        assert_eq!(header(&resp, "x-amz-version-id"), Some(marker_id.as_str()));
        let body = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(body.contains("<Code>NoSuchKey</Code>"));
    }

    #[tokio::test]
    async fn test_should_get_specific_version() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        gateway
            .versioned
            .as_ref()
            .unwrap()
            .set_versioning_configuration(
                "b",
                mocks3_model::types::VersioningConfiguration {
                    status: Some(VersioningStatus::Enabled),
                    mfa_delete: None,
                },
            )
            .await
            .unwrap();
        put(&gateway, "k", b"v1").await;
        let resp = gateway
            .get_or_head_object("b", "k", &get_parts(&[]), &object_ctx("/b/k"), false)
            .await
            .unwrap();
        let v1 = header(&resp, "x-amz-version-id").unwrap().to_owned();
        put(&gateway, "k", b"v2").await;

        let ctx = object_ctx(&format!("/b/k?versionId={v1}"));
        let resp = gateway
            .get_or_head_object("b", "k", &get_parts(&[]), &ctx, false)
            .await
            .unwrap();
        assert_eq!(body_bytes(resp).await, b"v1");
    }

    #[tokio::test]
    async fn test_should_reject_version_get_without_capability() {
        let gateway = MockS3::new(std::sync::Arc::new(crate::mem::InMemoryBackend::default()));
        gateway.storage.create_bucket("b").await.unwrap();
        put(&gateway, "k", b"x").await;

        let ctx = object_ctx("/b/k?versionId=null");
        let err = gateway
            .get_or_head_object("b", "k", &get_parts(&[]), &ctx, false)
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NotImplemented);
    }

    #[tokio::test]
    async fn test_should_multi_delete_with_quiet_mode() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        put(&gateway, "one", b"1").await;
        put(&gateway, "two", b"2").await;

        let body = br#"<Delete>
  <Object><Key>one</Key></Object>
  <Object><Key>two</Key></Object>
  <Quiet>true</Quiet>
</Delete>"#;
        let resp = gateway.multi_delete("b", body).await.unwrap();
        let text = String::from_utf8(body_bytes(resp).await).unwrap();
        // Quiet mode drops the Deleted list.
        assert!(!text.contains("<Deleted>"));

        let err = gateway
            .get_or_head_object("b", "one", &get_parts(&[]), &object_ctx("/b/one"), false)
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NoSuchKey);
    }

    #[tokio::test]
    async fn test_should_reject_malformed_multi_delete_xml() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();
        let err = gateway.multi_delete("b", b"<Delete><Obj").await.unwrap_err();
        assert_eq!(err.code, S3ErrorCode::MalformedXML);
    }

    #[tokio::test]
    async fn test_should_store_browser_upload() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let boundary = "xYzZY";
        let mut body = Vec::new();
        body.extend_from_slice(b"--xYzZY\r\nContent-Disposition: form-data; name=\"key\"\r\n\r\n");
        body.extend_from_slice(b"form/upload.txt\r\n");
        body.extend_from_slice(
            b"--xYzZY\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\n",
        );
        body.extend_from_slice(b"form bytes\r\n--xYzZY--\r\n");

        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("/b")
            .header(
                http::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(())
            .unwrap()
            .into_parts();

        let resp = gateway.post_object("b", &parts, &body).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert!(header(&resp, "etag").is_some());

        let resp = gateway
            .get_or_head_object(
                "b",
                "form/upload.txt",
                &get_parts(&[]),
                &object_ctx("/b/form%2Fupload.txt"),
                false,
            )
            .await
            .unwrap();
        assert_eq!(body_bytes(resp).await, b"form bytes");
    }

    #[tokio::test]
    async fn test_should_require_exactly_one_key_and_file() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        // No file part at all.
        let body = b"--xYzZY\r\nContent-Disposition: form-data; name=\"key\"\r\n\r\nk\r\n--xYzZY--\r\n";
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("/b")
            .header(
                http::header::CONTENT_TYPE,
                "multipart/form-data; boundary=xYzZY",
            )
            .body(())
            .unwrap()
            .into_parts();

        let err = gateway.post_object("b", &parts, body).await.unwrap_err();
        assert_eq!(err.code, S3ErrorCode::IncorrectNumberOfFilesInPostRequest);
    }

    #[tokio::test]
    async fn test_should_apply_metadata_limit_on_put() {
        let gateway = gateway().with_config(
            crate::config::GatewayConfig::builder()
                .metadata_size_limit(32)
                .build(),
        );
        gateway.storage.create_bucket("b").await.unwrap();

        let blob = "v".repeat(64);
        let parts = put_parts(&[("content-length", "1"), ("x-amz-meta-blob", blob.as_str())]);
        let err = gateway
            .put_object("b", "k", &parts, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::MetadataTooLarge);
    }

    #[tokio::test]
    async fn test_should_serve_stored_user_metadata() {
        let gateway = gateway();
        gateway.storage.create_bucket("b").await.unwrap();

        let parts = put_parts(&[("content-length", "4"), ("x-amz-meta-owner-team", "infra")]);
        gateway
            .put_object("b", "k", &parts, Bytes::from_static(b"data"))
            .await
            .unwrap();

        let resp = gateway
            .get_or_head_object("b", "k", &get_parts(&[]), &object_ctx("/b/k"), false)
            .await
            .unwrap();
        assert_eq!(header(&resp, "x-amz-meta-owner-team"), Some("infra"));
        assert!(header(&resp, "last-modified").is_some());
    }

    #[test]
    fn test_should_parse_copy_source_variants() {
        assert_eq!(
            parse_copy_source("/src/some/key").unwrap(),
            ("src".to_owned(), "some/key".to_owned()),
        );
        assert_eq!(
            parse_copy_source("src/key").unwrap(),
            ("src".to_owned(), "key".to_owned()),
        );
        assert_eq!(
            parse_copy_source("/src/a%20b?versionId=v1").unwrap(),
            ("src".to_owned(), "a b".to_owned()),
        );
        assert!(parse_copy_source("/onlybucket").is_err());
        assert!(parse_copy_source("/").is_err());
    }
}
