//! Serialization of response entities to S3-compatible XML.
//!
//! Output follows the S3 RestXml conventions: an XML declaration, two-space
//! indentation, the S3 namespace on the root element, lowercase booleans,
//! and ISO 8601 timestamps with milliseconds. Element text passes through
//! control characters that strict XML 1.0 encoders reject, because real S3
//! does and some clients depend on it.

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use mocks3_model::types::{
    CompleteMultipartUploadResult, Content, CopyObjectResult, DeleteResult, GetBucketLocation,
    InitiateMultipartUploadResult, ListAllMyBucketsResult, ListBucketResult, ListBucketResultV2,
    ListMultipartUploadsResult, ListPartsResult, ListVersionsResult, Owner, VersionEntry,
    VersioningConfiguration,
};
use mocks3_model::S3Error;

use crate::S3_NAMESPACE;
use crate::error::XmlError;

/// Trait for serializing a response entity as XML child elements.
///
/// Implementors write their content inside the root element; the declaration,
/// root tag, and namespace are handled by [`to_xml`]. Uses `io::Result`
/// because `quick_xml::Writer` content closures require it.
pub trait S3Serialize {
    /// Write this value's child elements into the writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` when writing to the underlying buffer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete S3 XML document.
///
/// # Errors
///
/// Returns [`XmlError`] when serialization fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Render an [`S3Error`] as the standard `<Error>` response body.
///
/// # Errors
///
/// Returns [`XmlError`] when serialization fails.
pub fn error_body(err: &S3Error, request_id: &str) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256);
    let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.create_element("Error").write_inner_content(|w| {
        write_text(w, "Code", err.code.as_str())?;
        write_text(w, "Message", &err.message)?;
        write_text(w, "Resource", err.resource.as_deref().unwrap_or(""))?;
        write_text(w, "RequestId", request_id)
    })?;

    Ok(buf)
}

// ---------------------------------------------------------------------------
// Writing helpers
// ---------------------------------------------------------------------------

/// Write `<tag>text</tag>`.
fn write_text<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Write `<tag>text</tag>` only when the value is present.
fn write_opt_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text(writer, tag, v)?;
    }
    Ok(())
}

/// Write `<tag>true|false</tag>`.
fn write_bool<W: Write>(writer: &mut Writer<W>, tag: &str, value: bool) -> io::Result<()> {
    write_text(writer, tag, if value { "true" } else { "false" })
}

/// Write `<tag>number</tag>`.
fn write_u64<W: Write>(writer: &mut Writer<W>, tag: &str, value: u64) -> io::Result<()> {
    write_text(writer, tag, &value.to_string())
}

/// Write `<tag>iso8601</tag>`.
fn write_timestamp<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &chrono::DateTime<chrono::Utc>,
) -> io::Result<()> {
    write_text(writer, tag, &format_timestamp(value))
}

/// Format a timestamp as S3 does: ISO 8601 with milliseconds and `Z`.
fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Write an `<Owner>` block.
fn write_owner<W: Write>(writer: &mut Writer<W>, owner: &Owner) -> io::Result<()> {
    writer.create_element("Owner").write_inner_content(|w| {
        write_text(w, "ID", &owner.id)?;
        write_text(w, "DisplayName", &owner.display_name)
    })?;
    Ok(())
}

/// Write the `<CommonPrefixes><Prefix>…</Prefix></CommonPrefixes>` blocks.
fn write_common_prefixes<W: Write>(writer: &mut Writer<W>, prefixes: &[String]) -> io::Result<()> {
    for prefix in prefixes {
        writer
            .create_element("CommonPrefixes")
            .write_inner_content(|w| write_text(w, "Prefix", prefix))?;
    }
    Ok(())
}

/// Write a `<Contents>` entry.
fn write_content<W: Write>(writer: &mut Writer<W>, content: &Content) -> io::Result<()> {
    writer.create_element("Contents").write_inner_content(|w| {
        write_text(w, "Key", &content.key)?;
        write_timestamp(w, "LastModified", &content.last_modified)?;
        write_text(w, "ETag", &content.etag)?;
        write_u64(w, "Size", content.size)?;
        write_text(w, "StorageClass", &content.storage_class)?;
        if let Some(owner) = &content.owner {
            write_owner(w, owner)?;
        }
        Ok(())
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

impl S3Serialize for ListAllMyBucketsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_owner(writer, &self.owner)?;
        writer.create_element("Buckets").write_inner_content(|w| {
            for bucket in &self.buckets {
                w.create_element("Bucket").write_inner_content(|w| {
                    write_text(w, "Name", &bucket.name)?;
                    write_timestamp(w, "CreationDate", &bucket.creation_date)
                })?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ListBucketResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Name", &self.name)?;
        write_text(writer, "Prefix", &self.prefix)?;
        write_text(writer, "Marker", &self.marker)?;
        write_opt_text(writer, "NextMarker", self.next_marker.as_deref())?;
        write_opt_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_u64(writer, "MaxKeys", self.max_keys)?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for content in &self.contents {
            write_content(writer, content)?;
        }
        write_common_prefixes(writer, &self.common_prefixes)
    }
}

impl S3Serialize for ListBucketResultV2 {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Name", &self.name)?;
        write_text(writer, "Prefix", &self.prefix)?;
        write_opt_text(writer, "StartAfter", self.start_after.as_deref())?;
        write_opt_text(writer, "ContinuationToken", self.continuation_token.as_deref())?;
        write_opt_text(
            writer,
            "NextContinuationToken",
            self.next_continuation_token.as_deref(),
        )?;
        write_u64(writer, "KeyCount", self.key_count)?;
        write_opt_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_u64(writer, "MaxKeys", self.max_keys)?;
        write_text(writer, "EncodingType", &self.encoding_type)?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for content in &self.contents {
            write_content(writer, content)?;
        }
        write_common_prefixes(writer, &self.common_prefixes)
    }
}

impl S3Serialize for ListVersionsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Name", &self.name)?;
        write_text(writer, "Prefix", &self.prefix)?;
        write_text(writer, "KeyMarker", &self.key_marker)?;
        write_text(writer, "VersionIdMarker", &self.version_id_marker)?;
        write_opt_text(writer, "NextKeyMarker", self.next_key_marker.as_deref())?;
        write_opt_text(
            writer,
            "NextVersionIdMarker",
            self.next_version_id_marker.as_deref(),
        )?;
        write_u64(writer, "MaxKeys", self.max_keys)?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for entry in &self.versions {
            match entry {
                VersionEntry::Version(v) => {
                    writer.create_element("Version").write_inner_content(|w| {
                        write_text(w, "Key", &v.key)?;
                        write_text(w, "VersionId", &v.version_id)?;
                        write_bool(w, "IsLatest", v.is_latest)?;
                        write_timestamp(w, "LastModified", &v.last_modified)?;
                        write_text(w, "ETag", &v.etag)?;
                        write_u64(w, "Size", v.size)?;
                        write_text(w, "StorageClass", &v.storage_class)?;
                        if let Some(owner) = &v.owner {
                            write_owner(w, owner)?;
                        }
                        Ok(())
                    })?;
                }
                VersionEntry::DeleteMarker(d) => {
                    writer
                        .create_element("DeleteMarker")
                        .write_inner_content(|w| {
                            write_text(w, "Key", &d.key)?;
                            write_text(w, "VersionId", &d.version_id)?;
                            write_bool(w, "IsLatest", d.is_latest)?;
                            write_timestamp(w, "LastModified", &d.last_modified)?;
                            if let Some(owner) = &d.owner {
                                write_owner(w, owner)?;
                            }
                            Ok(())
                        })?;
                }
            }
        }
        write_common_prefixes(writer, &self.common_prefixes)
    }
}

impl S3Serialize for VersioningConfiguration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_opt_text(writer, "Status", self.status.map(|s| s.as_str()))?;
        write_opt_text(writer, "MfaDelete", self.mfa_delete.map(|s| s.as_str()))
    }
}

impl S3Serialize for GetBucketLocation {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        // The constraint is the root element's own text, not a child.
        if !self.location_constraint.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&self.location_constraint)))?;
        }
        Ok(())
    }
}

impl S3Serialize for InitiateMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Bucket", &self.bucket)?;
        write_text(writer, "Key", &self.key)?;
        write_text(writer, "UploadId", &self.upload_id)
    }
}

impl S3Serialize for CompleteMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Bucket", &self.bucket)?;
        write_text(writer, "Key", &self.key)?;
        write_text(writer, "ETag", &self.etag)
    }
}

impl S3Serialize for ListPartsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Bucket", &self.bucket)?;
        write_text(writer, "Key", &self.key)?;
        write_text(writer, "UploadId", &self.upload_id)?;
        write_u64(writer, "PartNumberMarker", u64::from(self.part_number_marker))?;
        write_u64(
            writer,
            "NextPartNumberMarker",
            u64::from(self.next_part_number_marker),
        )?;
        write_u64(writer, "MaxParts", self.max_parts)?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for part in &self.parts {
            writer.create_element("Part").write_inner_content(|w| {
                write_u64(w, "PartNumber", u64::from(part.part_number))?;
                write_timestamp(w, "LastModified", &part.last_modified)?;
                write_text(w, "ETag", &part.etag)?;
                write_u64(w, "Size", part.size)
            })?;
        }
        Ok(())
    }
}

impl S3Serialize for ListMultipartUploadsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text(writer, "Bucket", &self.bucket)?;
        write_text(writer, "KeyMarker", &self.key_marker)?;
        write_text(writer, "UploadIdMarker", &self.upload_id_marker)?;
        write_opt_text(writer, "NextKeyMarker", self.next_key_marker.as_deref())?;
        write_opt_text(
            writer,
            "NextUploadIdMarker",
            self.next_upload_id_marker.as_deref(),
        )?;
        write_u64(writer, "MaxUploads", self.max_uploads)?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        write_text(writer, "Prefix", &self.prefix)?;
        for upload in &self.uploads {
            writer.create_element("Upload").write_inner_content(|w| {
                write_text(w, "Key", &upload.key)?;
                write_text(w, "UploadId", &upload.upload_id)?;
                write_timestamp(w, "Initiated", &upload.initiated)?;
                write_text(w, "StorageClass", &upload.storage_class)
            })?;
        }
        Ok(())
    }
}

impl S3Serialize for DeleteResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        for deleted in &self.deleted {
            writer
                .create_element("Deleted")
                .write_inner_content(|w| write_text(w, "Key", &deleted.key))?;
        }
        for error in &self.errors {
            writer.create_element("Error").write_inner_content(|w| {
                write_text(w, "Key", &error.key)?;
                write_text(w, "Code", &error.code)?;
                write_text(w, "Message", &error.message)
            })?;
        }
        Ok(())
    }
}

impl S3Serialize for CopyObjectResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_timestamp(writer, "LastModified", &self.last_modified)?;
        write_text(writer, "ETag", &self.etag)
    }
}
