//! S3 XML encoding and decoding for the mocks3 gateway.
//!
//! Response entities serialize with an XML declaration, two-space
//! indentation, and the `http://s3.amazonaws.com/doc/2006-03-01/` namespace
//! on the root element. Request bodies (`Delete`, `CompleteMultipartUpload`,
//! `VersioningConfiguration`) parse through a small event-driven reader.
//!
//! # Permissiveness
//!
//! Real S3 emits object keys containing bytes that XML 1.0 forbids
//! (0x00–0x1F), and some clients round-trip them. Both directions of this
//! codec pass such bytes through element text untouched instead of
//! rejecting the document; this is a deliberate compatibility requirement,
//! covered by tests in [`serialize`] and [`deserialize`].

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml};
pub use error::XmlError;
pub use serialize::{S3Serialize, error_body, to_xml};

/// The S3 XML namespace carried on every response root element.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";
