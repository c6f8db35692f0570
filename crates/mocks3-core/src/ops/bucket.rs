//! Bucket-level handlers: listing, CRUD, location, and versioning
//! configuration.

use tracing::info;

use mocks3_http::S3ResponseBody;
use mocks3_http::response::{empty_response, xml_ok};
use mocks3_model::error::S3Result;
use mocks3_model::types::{
    GetBucketLocation, ListAllMyBucketsResult, Owner, VersioningConfiguration,
};
use mocks3_model::{S3Error, S3ErrorCode};

use crate::provider::MockS3;
use crate::validation::validate_bucket_name;

impl MockS3 {
    /// GET / — every bucket with the fixed gateway owner.
    pub(crate) async fn list_buckets(&self) -> S3Result<http::Response<S3ResponseBody>> {
        let buckets = self.storage.list_buckets().await?;
        let result = ListAllMyBucketsResult {
            owner: Owner::gateway(),
            buckets,
        };
        xml_ok("ListAllMyBucketsResult", &result)
    }

    /// PUT /bucket — validate the name, create, answer with `Location`.
    pub(crate) async fn create_bucket(
        &self,
        bucket: &str,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, "create bucket");
        validate_bucket_name(bucket)?;
        self.storage.create_bucket(bucket).await?;

        http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::LOCATION, format!("/{bucket}"))
            .body(S3ResponseBody::empty())
            .map_err(|e| S3Error::internal_error(format!("failed to build response: {e}")))
    }

    /// DELETE /bucket — 204 on success; `BucketNotEmpty` passes through.
    pub(crate) async fn delete_bucket(
        &self,
        bucket: &str,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        info!(bucket, "delete bucket");
        self.ensure_bucket_exists(bucket).await?;
        self.storage.delete_bucket(bucket).await?;
        empty_response(http::StatusCode::NO_CONTENT)
    }

    /// HEAD /bucket — existence check, empty body.
    pub(crate) async fn head_bucket(
        &self,
        bucket: &str,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;
        empty_response(http::StatusCode::OK)
    }

    /// GET /bucket?location — always the default location constraint.
    pub(crate) async fn get_bucket_location(
        &self,
        bucket: &str,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;
        xml_ok("LocationConstraint", &GetBucketLocation::default())
    }

    /// GET /bucket?versioning — the backend's configuration, or an empty
    /// one when the versioned capability is absent.
    pub(crate) async fn get_bucket_versioning(
        &self,
        bucket: &str,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;

        let config = match &self.versioned {
            Some(versioned) => versioned.versioning_configuration(bucket).await?,
            None => VersioningConfiguration::default(),
        };

        xml_ok("VersioningConfiguration", &config)
    }

    /// PUT /bucket?versioning.
    ///
    /// Without the versioned capability, only a request that would enable
    /// versioning (or MFA-Delete) is an error; disabling what is already
    /// off is a no-op.
    pub(crate) async fn put_bucket_versioning(
        &self,
        bucket: &str,
        body: &[u8],
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;

        let config: VersioningConfiguration = mocks3_xml::from_xml(body)
            .map_err(|e| S3Error::with_message(S3ErrorCode::MalformedXML, e.to_string()))?;

        match &self.versioned {
            Some(versioned) => {
                info!(bucket, status = ?config.status, "put bucket versioning");
                versioned.set_versioning_configuration(bucket, config).await?;
            }
            None => {
                if config.is_versioning_enabled() || config.is_mfa_delete_enabled() {
                    return Err(S3Error::new(S3ErrorCode::NotImplemented));
                }
            }
        }

        empty_response(http::StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::mem::InMemoryBackend;

    use super::*;

    fn versioned_gateway() -> MockS3 {
        MockS3::in_memory()
    }

    fn unversioned_gateway() -> MockS3 {
        MockS3::new(Arc::new(InMemoryBackend::default()))
    }

    async fn body_string(resp: http::Response<S3ResponseBody>) -> String {
        use http_body_util::BodyExt;
        let collected = resp.into_body().collect().await.expect("collect body");
        String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn test_should_list_buckets_with_gateway_owner() {
        let gateway = versioned_gateway();
        gateway.create_bucket("alpha").await.unwrap();
        gateway.create_bucket("beta").await.unwrap();

        let resp = gateway.list_buckets().await.unwrap();
        let body = body_string(resp).await;
        assert!(body.contains("<ID>fe7272ea58be830e56fe1663b10fafef</ID>"));
        assert!(body.contains("<DisplayName>GoFakeS3</DisplayName>"));
        assert!(body.contains("<Name>alpha</Name>"));
        assert!(body.contains("<Name>beta</Name>"));
    }

    #[tokio::test]
    async fn test_should_set_location_header_on_create() {
        let gateway = versioned_gateway();
        let resp = gateway.create_bucket("new-bucket").await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(http::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/new-bucket"),
        );
    }

    #[tokio::test]
    async fn test_should_reject_invalid_bucket_name() {
        let gateway = versioned_gateway();
        let err = gateway.create_bucket("Bad_Name").await.unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidBucketName);
    }

    #[tokio::test]
    async fn test_should_delete_bucket_with_204() {
        let gateway = versioned_gateway();
        gateway.create_bucket("doomed").await.unwrap();
        let resp = gateway.delete_bucket("doomed").await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_should_head_missing_bucket_as_404() {
        let gateway = versioned_gateway();
        let err = gateway.head_bucket("ghost").await.unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NoSuchBucket);
    }

    #[tokio::test]
    async fn test_should_return_empty_location() {
        let gateway = versioned_gateway();
        gateway.create_bucket("b").await.unwrap();
        let resp = gateway.get_bucket_location("b").await.unwrap();
        let body = body_string(resp).await;
        assert!(body.contains("LocationConstraint"));
    }

    #[tokio::test]
    async fn test_should_report_empty_versioning_without_capability() {
        let gateway = unversioned_gateway();
        gateway.create_bucket("b").await.unwrap();
        let resp = gateway.get_bucket_versioning("b").await.unwrap();
        let body = body_string(resp).await;
        assert!(!body.contains("<Status>"));
    }

    #[tokio::test]
    async fn test_should_enable_versioning_round_trip() {
        let gateway = versioned_gateway();
        gateway.create_bucket("b").await.unwrap();

        let body = b"<VersioningConfiguration><Status>Enabled</Status></VersioningConfiguration>";
        let resp = gateway.put_bucket_versioning("b", body).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);

        let resp = gateway.get_bucket_versioning("b").await.unwrap();
        let body = body_string(resp).await;
        assert!(body.contains("<Status>Enabled</Status>"));
    }

    #[tokio::test]
    async fn test_should_reject_enabling_versioning_without_capability() {
        let gateway = unversioned_gateway();
        gateway.create_bucket("b").await.unwrap();

        let body = b"<VersioningConfiguration><Status>Enabled</Status></VersioningConfiguration>";
        let err = gateway.put_bucket_versioning("b", body).await.unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NotImplemented);

        // A request that matches the current (disabled) state is accepted.
        let body = b"<VersioningConfiguration><Status>Suspended</Status></VersioningConfiguration>";
        assert!(gateway.put_bucket_versioning("b", body).await.is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_malformed_versioning_xml() {
        let gateway = versioned_gateway();
        gateway.create_bucket("b").await.unwrap();
        let err = gateway
            .put_bucket_versioning("b", b"<VersioningConfiguration><Status>")
            .await
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::MalformedXML);
    }
}
