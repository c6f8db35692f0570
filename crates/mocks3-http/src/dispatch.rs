//! Operation dispatch: the boundary between the HTTP layer and the gateway
//! core.
//!
//! [`S3Handler`] is implemented by the business-logic provider; the service
//! calls [`dispatch_operation`] after routing and authentication. The
//! boxed-future signature keeps the trait object-safe so the service can
//! hold `Arc<H>` without generics leaking into hyper.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use mocks3_model::{S3Error, S3Operation};

use crate::body::S3ResponseBody;
use crate::router::RoutingContext;

/// The trait the gateway core implements to serve S3 operations.
pub trait S3Handler: Send + Sync + 'static {
    /// Serve one identified operation and produce a full HTTP response.
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>>;
}

/// Dispatch a routed request to the handler.
pub async fn dispatch_operation<H: S3Handler>(
    handler: &H,
    parts: http::request::Parts,
    body: Bytes,
    ctx: RoutingContext,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    tracing::debug!(
        operation = %ctx.operation,
        bucket = ?ctx.bucket,
        key = ?ctx.key,
        "dispatching S3 operation"
    );
    handler.handle_operation(ctx.operation, parts, body, ctx).await
}

/// A handler that rejects every operation. Useful for exercising the
/// routing and middleware layers in isolation.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl S3Handler for NotImplementedHandler {
    fn handle_operation(
        &self,
        op: S3Operation,
        _parts: http::request::Parts,
        _body: Bytes,
        _ctx: RoutingContext,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>> {
        Box::pin(async move {
            Err(S3Error::with_message(
                mocks3_model::S3ErrorCode::NotImplemented,
                format!("operation not implemented: {op}"),
            ))
        })
    }
}
