//! Multipart upload tests over the full HTTP surface.

use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};

use crate::{create_test_bucket, s3_client, start_default_gateway};

const FIVE_MIB: usize = 5 * 1024 * 1024;

#[tokio::test]
async fn test_should_complete_multipart_upload() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "mpu").await;

    let create = client
        .create_multipart_upload()
        .bucket(&bucket)
        .key("big")
        .send()
        .await
        .expect("create multipart upload");
    let upload_id = create.upload_id().expect("upload id");

    let part1_data = vec![b'A'; FIVE_MIB];
    let part1 = client
        .upload_part()
        .bucket(&bucket)
        .key("big")
        .upload_id(upload_id)
        .part_number(1)
        .body(ByteStream::from(part1_data.clone()))
        .send()
        .await
        .expect("upload part 1");

    let part2 = client
        .upload_part()
        .bucket(&bucket)
        .key("big")
        .upload_id(upload_id)
        .part_number(2)
        .body(ByteStream::from_static(b"tail"))
        .send()
        .await
        .expect("upload part 2");

    let completed = CompletedMultipartUpload::builder()
        .parts(
            CompletedPart::builder()
                .part_number(1)
                .e_tag(part1.e_tag().unwrap_or_default())
                .build(),
        )
        .parts(
            CompletedPart::builder()
                .part_number(2)
                .e_tag(part2.e_tag().unwrap_or_default())
                .build(),
        )
        .build();

    let complete = client
        .complete_multipart_upload()
        .bucket(&bucket)
        .key("big")
        .upload_id(upload_id)
        .multipart_upload(completed)
        .send()
        .await
        .expect("complete multipart upload");
    // The multipart ETag carries the part count.
    assert!(complete.e_tag().unwrap_or_default().ends_with("-2\""));

    let get = client
        .get_object()
        .bucket(&bucket)
        .key("big")
        .send()
        .await
        .expect("get assembled object");
    assert_eq!(get.content_length(), Some((FIVE_MIB + 4) as i64));
    let body = get.body.collect().await.expect("collect body").into_bytes();
    assert_eq!(&body[..FIVE_MIB], &part1_data[..]);
    assert_eq!(&body[FIVE_MIB..], b"tail");
}

#[tokio::test]
async fn test_should_list_parts_and_uploads() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "mpulist").await;

    let create = client
        .create_multipart_upload()
        .bucket(&bucket)
        .key("listed")
        .send()
        .await
        .expect("create upload");
    let upload_id = create.upload_id().expect("upload id").to_owned();

    client
        .upload_part()
        .bucket(&bucket)
        .key("listed")
        .upload_id(&upload_id)
        .part_number(1)
        .body(ByteStream::from_static(b"part data"))
        .send()
        .await
        .expect("upload part");

    let uploads = client
        .list_multipart_uploads()
        .bucket(&bucket)
        .send()
        .await
        .expect("list uploads");
    assert!(
        uploads
            .uploads()
            .iter()
            .any(|u| u.upload_id() == Some(upload_id.as_str())),
    );

    let parts = client
        .list_parts()
        .bucket(&bucket)
        .key("listed")
        .upload_id(&upload_id)
        .send()
        .await
        .expect("list parts");
    assert_eq!(parts.parts().len(), 1);
    assert_eq!(parts.parts()[0].part_number(), Some(1));
    assert_eq!(parts.parts()[0].size(), Some(9));
}

#[tokio::test]
async fn test_should_abort_multipart_upload() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "mpuabort").await;

    let create = client
        .create_multipart_upload()
        .bucket(&bucket)
        .key("aborted")
        .send()
        .await
        .expect("create upload");
    let upload_id = create.upload_id().expect("upload id").to_owned();

    client
        .abort_multipart_upload()
        .bucket(&bucket)
        .key("aborted")
        .upload_id(&upload_id)
        .send()
        .await
        .expect("abort upload");

    // Uploading a part afterwards reports NoSuchUpload.
    let err = client
        .upload_part()
        .bucket(&bucket)
        .key("aborted")
        .upload_id(&upload_id)
        .part_number(1)
        .body(ByteStream::from_static(b"late"))
        .send()
        .await
        .expect_err("upload after abort");
    assert_eq!(err.into_service_error().code(), Some("NoSuchUpload"));
}

#[tokio::test]
async fn test_should_reject_undersized_middle_part() {
    let endpoint = start_default_gateway().await;
    let client = s3_client(&endpoint);
    let bucket = create_test_bucket(&client, "mpusmall").await;

    let create = client
        .create_multipart_upload()
        .bucket(&bucket)
        .key("small")
        .send()
        .await
        .expect("create upload");
    let upload_id = create.upload_id().expect("upload id").to_owned();

    let part1 = client
        .upload_part()
        .bucket(&bucket)
        .key("small")
        .upload_id(&upload_id)
        .part_number(1)
        .body(ByteStream::from_static(b"way too small"))
        .send()
        .await
        .expect("upload part 1");
    let part2 = client
        .upload_part()
        .bucket(&bucket)
        .key("small")
        .upload_id(&upload_id)
        .part_number(2)
        .body(ByteStream::from_static(b"tail"))
        .send()
        .await
        .expect("upload part 2");

    let completed = CompletedMultipartUpload::builder()
        .parts(
            CompletedPart::builder()
                .part_number(1)
                .e_tag(part1.e_tag().unwrap_or_default())
                .build(),
        )
        .parts(
            CompletedPart::builder()
                .part_number(2)
                .e_tag(part2.e_tag().unwrap_or_default())
                .build(),
        )
        .build();

    let err = client
        .complete_multipart_upload()
        .bucket(&bucket)
        .key("small")
        .upload_id(&upload_id)
        .multipart_upload(completed)
        .send()
        .await
        .expect_err("first part is under 5 MiB");
    assert_eq!(err.into_service_error().code(), Some("EntityTooSmall"));
}
