//! Bucket lifecycle tests.

use aws_sdk_s3::error::ProvideErrorMetadata;

use crate::{create_test_bucket, s3_client, start_default_gateway, test_bucket_name};

#[tokio::test]
async fn test_should_create_head_and_delete_bucket() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "lifecycle").await;

    client
        .head_bucket()
        .bucket(&bucket)
        .send()
        .await
        .expect("head bucket");

    let buckets = client.list_buckets().send().await.expect("list buckets");
    assert!(
        buckets
            .buckets()
            .iter()
            .any(|b| b.name() == Some(bucket.as_str())),
    );

    client
        .delete_bucket()
        .bucket(&bucket)
        .send()
        .await
        .expect("delete bucket");

    let err = client.head_bucket().bucket(&bucket).send().await;
    assert!(err.is_err(), "bucket should be gone");
}

#[tokio::test]
async fn test_should_reject_invalid_bucket_name() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);

    let err = client
        .create_bucket()
        .bucket("xn")
        .send()
        .await
        .expect_err("two-character names are invalid");
    assert_eq!(err.into_service_error().code(), Some("InvalidBucketName"));
}

#[tokio::test]
async fn test_should_refuse_to_delete_non_empty_bucket() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "nonempty").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("blocker")
        .body(aws_sdk_s3::primitives::ByteStream::from_static(b"x"))
        .send()
        .await
        .expect("put object");

    let err = client
        .delete_bucket()
        .bucket(&bucket)
        .send()
        .await
        .expect_err("delete of a non-empty bucket must fail");
    assert_eq!(err.into_service_error().code(), Some("BucketNotEmpty"));

    client
        .delete_object()
        .bucket(&bucket)
        .key("blocker")
        .send()
        .await
        .expect("delete object");
    client
        .delete_bucket()
        .bucket(&bucket)
        .send()
        .await
        .expect("delete emptied bucket");
}

#[tokio::test]
async fn test_should_report_missing_bucket() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);

    let err = client
        .head_bucket()
        .bucket(test_bucket_name("ghost"))
        .send()
        .await
        .expect_err("missing bucket");
    assert_eq!(
        err.raw_response().map(|r| r.status().as_u16()),
        Some(404),
    );
}

#[tokio::test]
async fn test_should_report_bucket_location() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "location").await;

    let location = client
        .get_bucket_location()
        .bucket(&bucket)
        .send()
        .await
        .expect("get bucket location");
    // The default location constraint is empty (us-east-1).
    assert!(location.location_constraint().is_none()
        || location.location_constraint().map(|l| l.as_str()) == Some(""));
}
