//! The HTTP front of the mocks3 gateway.
//!
//! This crate turns raw HTTP traffic into identified S3 operations and typed
//! responses:
//!
//! - **Routing** ([`router`]): path and query parsing, sub-resource
//!   precedence, method dispatch tables.
//! - **Service** ([`service`]): the hyper `Service` carrying the middleware
//!   chain — signature verification, clock-skew gate, host-bucket rewriting,
//!   CORS — around the router and dispatcher.
//! - **Dispatch** ([`dispatch`]): the [`dispatch::S3Handler`] trait the
//!   gateway core implements.
//! - **Responses** ([`response`]): XML response construction and the
//!   `<Error>` body writer.
//! - **Body** ([`body`]): the buffered/empty response body type.
//! - **Chunked codec** ([`codec`]): the `aws-chunked` /
//!   `STREAMING-AWS4-HMAC-SHA256-PAYLOAD` body decoder.
//! - **Form parsing** ([`multipart`]): `multipart/form-data` for
//!   browser-based POST uploads.
//!
//! ```text
//! HTTP request
//!   -> S3HttpService
//!      -> auth gate (SigV4 -> SigV2 fallback, bypassed with no keys)
//!      -> clock-skew gate (x-amz-date)
//!      -> host-bucket rewrite (optional)
//!      -> OPTIONS short-circuit / CORS
//!      -> router::resolve
//!      -> dispatch (S3Handler)
//!      -> common headers (x-amz-request-id, Server, CORS)
//! <- HTTP response
//! ```

pub mod body;
pub mod codec;
pub mod dispatch;
pub mod multipart;
pub mod response;
pub mod router;
pub mod service;

pub use body::S3ResponseBody;
pub use dispatch::{NotImplementedHandler, S3Handler};
pub use router::RoutingContext;
pub use service::{RequestId, S3HttpConfig, S3HttpService};
