//! Parsing of S3 XML request bodies.
//!
//! Only three request documents carry XML: multi-object delete
//! ([`DeleteRequest`]), multipart completion ([`CompleteMultipartUpload`]),
//! and versioning configuration ([`VersioningConfiguration`]). Each is
//! parsed with a small event loop; unknown elements are skipped so clients
//! can send fields the gateway does not care about.

use quick_xml::Reader;
use quick_xml::events::Event;

use mocks3_model::types::{
    CompleteMultipartUpload, CompletedPart, DeleteRequest, MfaDeleteStatus, ObjectIdentifier,
    VersioningConfiguration, VersioningStatus,
};

use crate::error::XmlError;

/// Trait for parsing a request entity from XML.
pub trait S3Deserialize: Sized {
    /// Parse an instance from the reader, which is positioned just after
    /// the root element's start tag. Implementations consume through the
    /// matching end tag.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] when the document is malformed.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Parse a request body into a typed value.
///
/// # Errors
///
/// Returns [`XmlError`] when the document is malformed or the root element
/// is missing.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    // Self-closing elements surface as Start/End pairs so the per-type
    // event loops need only one shape.
    reader.config_mut().expand_empty_elements = true;

    // Skip the declaration and whitespace to the root element.
    loop {
        match reader.read_event()? {
            Event::Start(_) => return T::deserialize_xml(&mut reader),
            Event::Eof => return Err(XmlError::MissingElement("root element".to_owned())),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Reading helpers
// ---------------------------------------------------------------------------

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let unescaped = e.unescape().map_err(|err| XmlError::Parse(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(XmlError::UnexpectedEof("text content".to_owned())),
            _ => {}
        }
    }
}

/// Skip the current element and all of its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(XmlError::UnexpectedEof("element".to_owned())),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// DeleteRequest
// ---------------------------------------------------------------------------

impl S3Deserialize for DeleteRequest {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut request = DeleteRequest::default();

        loop {
            match reader.read_event()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"Object" => request.objects.push(read_object_identifier(reader)?),
                    b"Quiet" => {
                        request.quiet = read_text_content(reader)? == "true";
                    }
                    _ => skip_element(reader)?,
                },
                Event::End(_) => return Ok(request),
                Event::Eof => return Err(XmlError::UnexpectedEof("Delete".to_owned())),
                _ => {}
            }
        }
    }
}

/// Read one `<Object>` block of a Delete request.
fn read_object_identifier(reader: &mut Reader<&[u8]>) -> Result<ObjectIdentifier, XmlError> {
    let mut object = ObjectIdentifier::default();
    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"Key" => object.key = read_text_content(reader)?,
                b"VersionId" => object.version_id = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => {
                if object.key.is_empty() {
                    return Err(XmlError::MissingElement("Object/Key".to_owned()));
                }
                return Ok(object);
            }
            Event::Eof => return Err(XmlError::UnexpectedEof("Object".to_owned())),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// CompleteMultipartUpload
// ---------------------------------------------------------------------------

impl S3Deserialize for CompleteMultipartUpload {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut request = CompleteMultipartUpload::default();

        loop {
            match reader.read_event()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"Part" => request.parts.push(read_completed_part(reader)?),
                    _ => skip_element(reader)?,
                },
                Event::End(_) => return Ok(request),
                Event::Eof => {
                    return Err(XmlError::UnexpectedEof("CompleteMultipartUpload".to_owned()));
                }
                _ => {}
            }
        }
    }
}

/// Read one `<Part>` block of a CompleteMultipartUpload request.
fn read_completed_part(reader: &mut Reader<&[u8]>) -> Result<CompletedPart, XmlError> {
    let mut part_number: Option<u32> = None;
    let mut etag: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"PartNumber" => {
                    let text = read_text_content(reader)?;
                    part_number = Some(
                        text.parse()
                            .map_err(|_| XmlError::Parse(format!("invalid PartNumber: {text}")))?,
                    );
                }
                b"ETag" => etag = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => {
                let part_number =
                    part_number.ok_or_else(|| XmlError::MissingElement("PartNumber".to_owned()))?;
                let etag = etag.ok_or_else(|| XmlError::MissingElement("ETag".to_owned()))?;
                return Ok(CompletedPart { part_number, etag });
            }
            Event::Eof => return Err(XmlError::UnexpectedEof("Part".to_owned())),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// VersioningConfiguration
// ---------------------------------------------------------------------------

impl S3Deserialize for VersioningConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = VersioningConfiguration::default();

        loop {
            match reader.read_event()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"Status" => {
                        config.status = match read_text_content(reader)?.as_str() {
                            "Enabled" => Some(VersioningStatus::Enabled),
                            "Suspended" => Some(VersioningStatus::Suspended),
                            other => {
                                return Err(XmlError::Parse(format!(
                                    "invalid versioning status: {other}"
                                )));
                            }
                        };
                    }
                    b"MfaDelete" | b"MFADelete" => {
                        config.mfa_delete = match read_text_content(reader)?.as_str() {
                            "Enabled" => Some(MfaDeleteStatus::Enabled),
                            "Disabled" => Some(MfaDeleteStatus::Disabled),
                            other => {
                                return Err(XmlError::Parse(format!(
                                    "invalid MfaDelete status: {other}"
                                )));
                            }
                        };
                    }
                    _ => skip_element(reader)?,
                },
                Event::End(_) => return Ok(config),
                Event::Eof => {
                    return Err(XmlError::UnexpectedEof("VersioningConfiguration".to_owned()));
                }
                _ => {}
            }
        }
    }
}
