//! Versioning tests: configuration, version stacks, delete markers.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketVersioningStatus, VersioningConfiguration as SdkVersioningConfiguration,
};

use crate::{create_test_bucket, s3_client, start_default_gateway};

async fn enable_versioning(client: &aws_sdk_s3::Client, bucket: &str) {
    client
        .put_bucket_versioning()
        .bucket(bucket)
        .versioning_configuration(
            SdkVersioningConfiguration::builder()
                .status(BucketVersioningStatus::Enabled)
                .build(),
        )
        .send()
        .await
        .expect("enable versioning");
}

#[tokio::test]
async fn test_should_round_trip_versioning_configuration() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "vconfig").await;

    let config = client
        .get_bucket_versioning()
        .bucket(&bucket)
        .send()
        .await
        .expect("get versioning");
    assert!(config.status().is_none());

    enable_versioning(&client, &bucket).await;

    let config = client
        .get_bucket_versioning()
        .bucket(&bucket)
        .send()
        .await
        .expect("get versioning");
    assert_eq!(config.status(), Some(&BucketVersioningStatus::Enabled));
}

#[tokio::test]
async fn test_should_stack_versions_and_fetch_old_one() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "vstack").await;
    enable_versioning(&client, &bucket).await;

    let first = client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .body(ByteStream::from_static(b"v1"))
        .send()
        .await
        .expect("put v1");
    let v1 = first.version_id().expect("version id").to_owned();

    client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .body(ByteStream::from_static(b"v2"))
        .send()
        .await
        .expect("put v2");

    let current = client
        .get_object()
        .bucket(&bucket)
        .key("k")
        .send()
        .await
        .expect("get current");
    let body = current.body.collect().await.expect("collect").into_bytes();
    assert_eq!(&body[..], b"v2");

    let old = client
        .get_object()
        .bucket(&bucket)
        .key("k")
        .version_id(&v1)
        .send()
        .await
        .expect("get old version");
    let body = old.body.collect().await.expect("collect").into_bytes();
    assert_eq!(&body[..], b"v1");
}

#[tokio::test]
async fn test_should_hide_key_behind_delete_marker() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "vmarker").await;
    enable_versioning(&client, &bucket).await;

    client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .body(ByteStream::from_static(b"data"))
        .send()
        .await
        .expect("put object");

    let delete = client
        .delete_object()
        .bucket(&bucket)
        .key("k")
        .send()
        .await
        .expect("delete object");
    assert_eq!(delete.delete_marker(), Some(true));
    let marker_id = delete.version_id().expect("marker version id").to_owned();

    let err = client
        .get_object()
        .bucket(&bucket)
        .key("k")
        .send()
        .await
        .expect_err("key is behind a delete marker");
    assert_eq!(err.raw_response().map(|r| r.status().as_u16()), Some(404));

    // Removing the marker resurrects the object.
    client
        .delete_object()
        .bucket(&bucket)
        .key("k")
        .version_id(&marker_id)
        .send()
        .await
        .expect("delete the marker");
    let get = client
        .get_object()
        .bucket(&bucket)
        .key("k")
        .send()
        .await
        .expect("object is back");
    let body = get.body.collect().await.expect("collect").into_bytes();
    assert_eq!(&body[..], b"data");
}

#[tokio::test]
async fn test_should_list_versions_and_markers() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "vlist").await;
    enable_versioning(&client, &bucket).await;

    client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .body(ByteStream::from_static(b"v1"))
        .send()
        .await
        .expect("put v1");
    client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .body(ByteStream::from_static(b"v2"))
        .send()
        .await
        .expect("put v2");
    client
        .delete_object()
        .bucket(&bucket)
        .key("k")
        .send()
        .await
        .expect("delete");

    let listing = client
        .list_object_versions()
        .bucket(&bucket)
        .send()
        .await
        .expect("list versions");
    assert_eq!(listing.versions().len(), 2);
    assert_eq!(listing.delete_markers().len(), 1);
    assert_eq!(listing.delete_markers()[0].is_latest(), Some(true));
}

#[tokio::test]
async fn test_should_report_null_version_for_pre_versioning_objects() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "vnull").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("old")
        .body(ByteStream::from_static(b"pre-versioning"))
        .send()
        .await
        .expect("put object");
    enable_versioning(&client, &bucket).await;

    let listing = client
        .list_object_versions()
        .bucket(&bucket)
        .send()
        .await
        .expect("list versions");
    assert_eq!(listing.versions().len(), 1);
    assert_eq!(listing.versions()[0].version_id(), Some("null"));
}
