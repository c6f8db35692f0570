//! Error contract tests: status codes, XML bodies, and the auth gate.

use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;

use mocks3_core::GatewayConfig;

use crate::{create_test_bucket, s3_client, s3_client_with_credentials, start_gateway};

#[tokio::test]
async fn test_should_report_no_such_key_with_code() {
    let endpoint = start_gateway(GatewayConfig::default()).await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "errkey").await;

    let err = client
        .get_object()
        .bucket(&bucket)
        .key("missing")
        .send()
        .await
        .expect_err("missing key");
    let service_err = err.into_service_error();
    assert!(service_err.is_no_such_key());
}

#[tokio::test]
async fn test_should_report_no_such_bucket() {
    let endpoint = start_gateway(GatewayConfig::default()).await;
    let client = s3_client(&endpoint);

    let err = client
        .list_objects_v2()
        .bucket("never-created-bucket-0000")
        .send()
        .await
        .expect_err("missing bucket");
    assert_eq!(err.into_service_error().code(), Some("NoSuchBucket"));
}

#[tokio::test]
async fn test_should_accept_correctly_signed_requests() {
    let mut auth_keys = std::collections::HashMap::new();
    auth_keys.insert("AKIDEXAMPLE".to_owned(), "sekrit".to_owned());
    let endpoint = start_gateway(GatewayConfig::builder().auth_keys(auth_keys).build()).await;

    let client = s3_client_with_credentials(&endpoint, "AKIDEXAMPLE", "sekrit");
    let bucket = create_test_bucket(&client, "signed").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .body(ByteStream::from_static(b"signed write"))
        .send()
        .await
        .expect("signed put");

    let get = client
        .get_object()
        .bucket(&bucket)
        .key("k")
        .send()
        .await
        .expect("signed get");
    let body = get.body.collect().await.expect("collect").into_bytes();
    assert_eq!(&body[..], b"signed write");
}

#[tokio::test]
async fn test_should_reject_wrong_secret_key() {
    let mut auth_keys = std::collections::HashMap::new();
    auth_keys.insert("AKIDEXAMPLE".to_owned(), "sekrit".to_owned());
    let endpoint = start_gateway(GatewayConfig::builder().auth_keys(auth_keys).build()).await;

    let client = s3_client_with_credentials(&endpoint, "AKIDEXAMPLE", "wrong-secret");
    let err = client
        .list_buckets()
        .send()
        .await
        .expect_err("bad signature");
    let raw_status = err.raw_response().map(|r| r.status().as_u16());
    assert_eq!(raw_status, Some(403));
}

#[tokio::test]
async fn test_should_reject_unknown_access_key() {
    let mut auth_keys = std::collections::HashMap::new();
    auth_keys.insert("AKIDEXAMPLE".to_owned(), "sekrit".to_owned());
    let endpoint = start_gateway(GatewayConfig::builder().auth_keys(auth_keys).build()).await;

    let client = s3_client_with_credentials(&endpoint, "WHOAREYOU", "sekrit");
    let err = client
        .list_buckets()
        .send()
        .await
        .expect_err("unknown access key");
    assert_eq!(err.raw_response().map(|r| r.status().as_u16()), Some(403));
}

#[tokio::test]
async fn test_should_auto_create_buckets_when_configured() {
    let endpoint = start_gateway(GatewayConfig::builder().auto_bucket(true).build()).await;
    let client = s3_client(&endpoint);

    // No CreateBucket call: the put succeeds anyway.
    client
        .put_object()
        .bucket("spontaneous-bucket")
        .key("k")
        .body(ByteStream::from_static(b"x"))
        .send()
        .await
        .expect("put into auto-created bucket");

    client
        .head_bucket()
        .bucket("spontaneous-bucket")
        .send()
        .await
        .expect("bucket exists now");
}
