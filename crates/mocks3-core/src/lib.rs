//! The mocks3 gateway core.
//!
//! This crate translates identified S3 operations into calls against a
//! pluggable storage backend and renders the results as wire-accurate
//! responses:
//!
//! - **Backend contract** ([`backend`]): the async [`backend::Backend`] and
//!   [`backend::VersionedBackend`] traits storage plugins implement, plus
//!   the listing/prefix/page vocabulary they share with the handlers.
//! - **Gateway** ([`provider`]): [`provider::MockS3`], the handler the HTTP
//!   layer dispatches into; per-operation logic lives in [`ops`].
//! - **Multipart coordinator** ([`uploader`]): the in-memory registry of
//!   open uploads and their parts.
//! - **Reference backend** ([`mem`]): a complete in-memory implementation
//!   with versioning, used by embedders and the test suite.
//! - Supporting pieces: [`checksums`] (ETags, Content-MD5 verification),
//!   [`range`] (the `Range` header), [`meta`] (metadata capture),
//!   [`validation`] (bucket/key rules), and [`config`].
//!
//! # Cancellation
//!
//! Handlers and backends are async; when a client disconnects, hyper drops
//! the request future and every in-flight backend call is cancelled with
//! it. Backend implementations must be drop-safe at every await point.

pub mod backend;
pub mod checksums;
pub mod config;
pub mod mem;
pub mod meta;
mod ops;
pub mod provider;
pub mod range;
pub mod uploader;
pub mod validation;

pub use backend::{Backend, VersionedBackend};
pub use config::GatewayConfig;
pub use mem::InMemoryBackend;
pub use provider::MockS3;
pub use uploader::{IdSource, RandomIdSource, Uploader};
