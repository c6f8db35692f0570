//! Wire-level S3 types for the mocks3 gateway.
//!
//! This crate is the shared vocabulary of the workspace. It contains:
//!
//! - **Error model** ([`error`]): the closed [`error::S3ErrorCode`] taxonomy,
//!   each code mapped to an HTTP status and a default message, plus the
//!   [`error::S3Error`] value handlers return.
//! - **Operations** ([`operations`]): the [`operations::S3Operation`] enum the
//!   router resolves requests into.
//! - **Response/request entities** ([`types`]): the structs that serialize to
//!   (or parse from) the S3 XML schemas — bucket listings, object listings
//!   V1/V2, version listings, multipart results, multi-delete, versioning
//!   configuration.
//! - **Clock** ([`time`]): the injectable [`time::TimeSource`] used everywhere
//!   a timestamp is read, so tests can freeze time.
//!
//! No I/O happens here; serialization lives in `mocks3-xml` and HTTP plumbing
//! in `mocks3-http`.

pub mod error;
pub mod operations;
pub mod time;
pub mod types;

pub use error::{S3Error, S3ErrorCode};
pub use operations::S3Operation;
pub use time::{FixedTimeSource, SystemTimeSource, TimeSource};
