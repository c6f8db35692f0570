//! Object CRUD tests: put/get round trips, ranges, metadata, copy, and
//! multi-object delete.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use crate::{create_test_bucket, s3_client, start_default_gateway};

#[tokio::test]
async fn test_should_round_trip_object() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "roundtrip").await;

    let put = client
        .put_object()
        .bucket(&bucket)
        .key("hello")
        .body(ByteStream::from_static(b"Hello, world\n"))
        .send()
        .await
        .expect("put object");
    assert_eq!(
        put.e_tag(),
        Some("\"a7966bf58e23583c9a5a4059383ff850\""),
    );

    let get = client
        .get_object()
        .bucket(&bucket)
        .key("hello")
        .send()
        .await
        .expect("get object");
    assert_eq!(get.content_length(), Some(13));
    assert_eq!(get.e_tag(), put.e_tag());
    let body = get.body.collect().await.expect("collect body").into_bytes();
    assert_eq!(&body[..], b"Hello, world\n");
}

#[tokio::test]
async fn test_should_serve_byte_range() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "range").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("hello")
        .body(ByteStream::from_static(b"Hello, world\n"))
        .send()
        .await
        .expect("put object");

    let get = client
        .get_object()
        .bucket(&bucket)
        .key("hello")
        .range("bytes=7-11")
        .send()
        .await
        .expect("ranged get");
    assert_eq!(get.content_range(), Some("bytes 7-11/13"));
    let body = get.body.collect().await.expect("collect body").into_bytes();
    assert_eq!(&body[..], b"world");
}

#[tokio::test]
async fn test_should_reject_unsatisfiable_range() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "badrange").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .body(ByteStream::from_static(b"tiny"))
        .send()
        .await
        .expect("put object");

    let err = client
        .get_object()
        .bucket(&bucket)
        .key("k")
        .range("bytes=100-200")
        .send()
        .await
        .expect_err("range beyond the object");
    assert_eq!(err.raw_response().map(|r| r.status().as_u16()), Some(416));
}

#[tokio::test]
async fn test_should_round_trip_user_metadata() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "meta").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("k")
        .metadata("team", "infra")
        .content_type("text/plain")
        .body(ByteStream::from_static(b"data"))
        .send()
        .await
        .expect("put object");

    let head = client
        .head_object()
        .bucket(&bucket)
        .key("k")
        .send()
        .await
        .expect("head object");
    assert_eq!(head.content_length(), Some(4));
    assert_eq!(
        head.metadata().and_then(|m| m.get("team")).map(String::as_str),
        Some("infra"),
    );
}

#[tokio::test]
async fn test_should_get_404_after_delete() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "delete").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("doomed")
        .body(ByteStream::from_static(b"x"))
        .send()
        .await
        .expect("put object");
    client
        .delete_object()
        .bucket(&bucket)
        .key("doomed")
        .send()
        .await
        .expect("delete object");

    let err = client
        .get_object()
        .bucket(&bucket)
        .key("doomed")
        .send()
        .await
        .expect_err("deleted object");
    assert!(err.into_service_error().is_no_such_key());
}

#[tokio::test]
async fn test_should_copy_object() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "copy").await;

    client
        .put_object()
        .bucket(&bucket)
        .key("orig")
        .body(ByteStream::from_static(b"copy me"))
        .send()
        .await
        .expect("put source");

    let copy = client
        .copy_object()
        .bucket(&bucket)
        .key("duplicate")
        .copy_source(format!("{bucket}/orig"))
        .send()
        .await
        .expect("copy object");
    assert!(copy.copy_object_result().is_some());

    let get = client
        .get_object()
        .bucket(&bucket)
        .key("duplicate")
        .send()
        .await
        .expect("get copy");
    let body = get.body.collect().await.expect("collect body").into_bytes();
    assert_eq!(&body[..], b"copy me");
}

#[tokio::test]
async fn test_should_delete_multiple_objects() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "multidel").await;

    for key in ["a", "b", "c"] {
        client
            .put_object()
            .bucket(&bucket)
            .key(key)
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put object");
    }

    let delete = Delete::builder()
        .objects(ObjectIdentifier::builder().key("a").build().unwrap())
        .objects(ObjectIdentifier::builder().key("b").build().unwrap())
        .build()
        .unwrap();
    let result = client
        .delete_objects()
        .bucket(&bucket)
        .delete(delete)
        .send()
        .await
        .expect("delete objects");
    assert_eq!(result.deleted().len(), 2);

    let listing = client
        .list_objects_v2()
        .bucket(&bucket)
        .send()
        .await
        .expect("list");
    let keys: Vec<&str> = listing.contents().iter().filter_map(|c| c.key()).collect();
    assert_eq!(keys, vec!["c"]);
}
