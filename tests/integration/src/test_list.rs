//! Listing tests: prefixes, delimiters, pagination, and V1/V2 differences.

use aws_sdk_s3::primitives::ByteStream;

use crate::{create_test_bucket, s3_client, start_default_gateway};

async fn put_keys(client: &aws_sdk_s3::Client, bucket: &str, keys: &[&str]) {
    for key in keys {
        client
            .put_object()
            .bucket(bucket)
            .key(*key)
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .unwrap_or_else(|e| panic!("put {key}: {e}"));
    }
}

#[tokio::test]
async fn test_should_split_prefix_listing() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "prefixes").await;
    put_keys(&client, &bucket, &["a/1", "a/2", "b/1"]).await;

    // prefix="a/", delimiter="/": both keys surface as contents (plus the
    // zero-size directory placeholder for the prefix itself).
    let listing = client
        .list_objects_v2()
        .bucket(&bucket)
        .prefix("a/")
        .delimiter("/")
        .send()
        .await
        .expect("list a/");
    let keys: Vec<&str> = listing.contents().iter().filter_map(|c| c.key()).collect();
    assert!(keys.contains(&"a/1"));
    assert!(keys.contains(&"a/2"));
    assert!(!keys.contains(&"b/1"));
    assert!(listing.common_prefixes().is_empty());
    let placeholder = listing
        .contents()
        .iter()
        .find(|c| c.key() == Some("a/"))
        .expect("directory placeholder");
    assert_eq!(placeholder.size(), Some(0));

    // prefix="", delimiter="/": everything rolls up.
    let listing = client
        .list_objects_v2()
        .bucket(&bucket)
        .delimiter("/")
        .send()
        .await
        .expect("list rollup");
    assert!(listing.contents().is_empty());
    let prefixes: Vec<&str> = listing
        .common_prefixes()
        .iter()
        .filter_map(|p| p.prefix())
        .collect();
    assert_eq!(prefixes, vec!["a/", "b/"]);
}

#[tokio::test]
async fn test_should_paginate_with_continuation_token() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "paging").await;
    put_keys(&client, &bucket, &["k1", "k2", "k3", "k4", "k5"]).await;

    let mut collected = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let mut request = client.list_objects_v2().bucket(&bucket).max_keys(2);
        if let Some(t) = token.take() {
            request = request.continuation_token(t);
        }
        let page = request.send().await.expect("list page");
        collected.extend(
            page.contents()
                .iter()
                .filter_map(|c| c.key())
                .map(ToOwned::to_owned),
        );
        if page.is_truncated() == Some(true) {
            token = page.next_continuation_token().map(ToOwned::to_owned);
            assert!(token.is_some(), "truncated page must carry a token");
        } else {
            break;
        }
    }

    assert_eq!(collected, vec!["k1", "k2", "k3", "k4", "k5"]);
}

#[tokio::test]
async fn test_should_paginate_v1_with_marker() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "v1paging").await;
    put_keys(&client, &bucket, &["a", "b", "c"]).await;

    let page = client
        .list_objects()
        .bucket(&bucket)
        .max_keys(2)
        .send()
        .await
        .expect("first page");
    assert_eq!(page.contents().len(), 2);
    assert_eq!(page.is_truncated(), Some(true));

    let page = client
        .list_objects()
        .bucket(&bucket)
        .marker("b")
        .send()
        .await
        .expect("second page");
    let keys: Vec<&str> = page.contents().iter().filter_map(|c| c.key()).collect();
    assert_eq!(keys, vec!["c"]);
}

#[tokio::test]
async fn test_should_start_after_a_given_key() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "startafter").await;
    put_keys(&client, &bucket, &["a", "b", "c"]).await;

    let listing = client
        .list_objects_v2()
        .bucket(&bucket)
        .start_after("a")
        .send()
        .await
        .expect("list");
    let keys: Vec<&str> = listing.contents().iter().filter_map(|c| c.key()).collect();
    assert_eq!(keys, vec!["b", "c"]);
}

#[tokio::test]
async fn test_should_repeat_identical_pages_for_stable_bucket() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "stable").await;
    put_keys(&client, &bucket, &["x", "y", "z"]).await;

    let snapshot = |listing: aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output| {
        listing
            .contents()
            .iter()
            .filter_map(|c| c.key().map(ToOwned::to_owned))
            .collect::<Vec<_>>()
    };

    let first = client
        .list_objects_v2()
        .bucket(&bucket)
        .max_keys(2)
        .send()
        .await
        .expect("first");
    let second = client
        .list_objects_v2()
        .bucket(&bucket)
        .max_keys(2)
        .send()
        .await
        .expect("second");
    assert_eq!(snapshot(first), snapshot(second));
}
