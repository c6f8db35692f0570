//! The hyper service tying the middleware chain together.
//!
//! Request processing order, outermost first:
//!
//! 1. **Auth gate** — when any keys are registered, verify SigV4 (header or
//!    presigned) with SigV2 fallback; failures short-circuit with an XML
//!    error body.
//! 2. **Clock-skew gate** — an `x-amz-date` too far from the server clock
//!    is rejected with `RequestTimeTooSkewed`.
//! 3. **Host-bucket rewrite** — when enabled, the leftmost DNS label of the
//!    `Host` header becomes the bucket and the path is rewritten to
//!    path-style before routing.
//! 4. **CORS** — `OPTIONS` answers 200 immediately; every response carries
//!    the permissive CORS headers.
//!
//! Request IDs come from an atomic counter and appear in both the
//! `x-amz-request-id` header and error bodies.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, warn};

use mocks3_auth::KeyStore;
use mocks3_model::{S3Error, S3ErrorCode, SystemTimeSource, TimeSource};

use crate::body::S3ResponseBody;
use crate::dispatch::{S3Handler, dispatch_operation};
use crate::response::error_to_response;
use crate::router;

/// The request ID assigned by the service, exposed to handlers through the
/// request extensions so they can render error bodies of their own.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// HTTP-layer configuration.
#[derive(Debug, Clone)]
pub struct S3HttpConfig {
    /// Interpret the leftmost `Host` label as the bucket name.
    pub host_bucket: bool,
    /// Maximum tolerated difference between `x-amz-date` and the server
    /// clock. Zero disables the gate.
    pub time_skew: chrono::Duration,
}

impl Default for S3HttpConfig {
    fn default() -> Self {
        Self {
            host_bucket: false,
            time_skew: chrono::Duration::minutes(15),
        }
    }
}

/// The S3 HTTP service: middleware, routing, and dispatch around an
/// [`S3Handler`].
pub struct S3HttpService<H: S3Handler> {
    handler: Arc<H>,
    keys: Arc<KeyStore>,
    clock: Arc<dyn TimeSource>,
    config: Arc<S3HttpConfig>,
    next_request_id: Arc<AtomicU64>,
}

impl<H: S3Handler> S3HttpService<H> {
    /// Create a service with no auth keys and the system clock.
    #[must_use]
    pub fn new(handler: H, config: S3HttpConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            keys: Arc::new(KeyStore::default()),
            clock: Arc::new(SystemTimeSource),
            config: Arc::new(config),
            next_request_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Use the given key store for the auth gate. An empty store bypasses
    /// authentication.
    #[must_use]
    pub fn with_auth_keys(mut self, keys: Arc<KeyStore>) -> Self {
        self.keys = keys;
        self
    }

    /// Replace the clock. Tests freeze time this way.
    #[must_use]
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Process one request with an already-collected body.
    ///
    /// This is the full pipeline minus hyper; in-process tests call it
    /// directly.
    pub async fn handle(&self, req: http::Request<Bytes>) -> http::Response<S3ResponseBody> {
        let request_id = format!(
            "{:016X}",
            self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1
        );
        let is_head = req.method() == http::Method::HEAD;

        let response = match self.process(req, &request_id).await {
            Ok(response) => response,
            Err(err) => {
                if err.code == S3ErrorCode::InternalError {
                    error!(%err, request_id, "internal error serving S3 request");
                } else {
                    debug!(%err, request_id, "S3 request failed");
                }
                error_to_response(&err, &request_id, is_head)
            }
        };

        add_common_headers(response, &request_id)
    }

    async fn process(
        &self,
        req: http::Request<Bytes>,
        request_id: &str,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let (mut parts, body) = req.into_parts();

        // 1. Auth gate.
        if !self.keys.is_empty() {
            if let Err(err) =
                mocks3_auth::verify_request(&parts, &body, &self.keys, self.clock.now())
            {
                warn!(%err, uri = %parts.uri, "request failed signature verification");
                return Err(err.into_s3_error());
            }
        }

        // 2. Clock-skew gate.
        if self.config.time_skew != chrono::Duration::zero() {
            self.check_clock_skew(&parts)?;
        }

        // 3. Host-bucket rewrite.
        if self.config.host_bucket {
            rewrite_host_bucket(&mut parts);
        }

        // 4. CORS preflight.
        if parts.method == http::Method::OPTIONS {
            return crate::response::empty_response(http::StatusCode::OK);
        }

        // 5. Route.
        let req = http::Request::from_parts(parts, ());
        let ctx = router::resolve(&req)?;
        let (mut parts, ()) = req.into_parts();
        parts.extensions.insert(RequestId(request_id.to_owned()));

        debug!(
            operation = %ctx.operation,
            bucket = ?ctx.bucket,
            key = ?ctx.key,
            request_id,
            "routed S3 request"
        );

        // 6. Dispatch.
        dispatch_operation(self.handler.as_ref(), parts, body, ctx).await
    }

    /// Reject requests whose `x-amz-date` is outside the configured window.
    /// An unparseable date counts as maximally skewed.
    fn check_clock_skew(&self, parts: &http::request::Parts) -> Result<(), S3Error> {
        let Some(date_header) = parts.headers.get("x-amz-date").and_then(|v| v.to_str().ok())
        else {
            return Ok(());
        };

        let now = self.clock.now();
        let in_window = mocks3_auth::sigv4::parse_amz_date(date_header)
            .is_ok_and(|request_time| {
                let drift = now.signed_duration_since(request_time);
                drift <= self.config.time_skew && drift >= -self.config.time_skew
            });

        if in_window {
            Ok(())
        } else {
            Err(S3Error::with_message(
                S3ErrorCode::RequestTimeTooSkewed,
                format!(
                    "The difference between the request time and the server's time {now} is too large",
                ),
            ))
        }
    }
}

impl<H: S3Handler> Clone for S3HttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            keys: Arc::clone(&self.keys),
            clock: Arc::clone(&self.clock),
            config: Arc::clone(&self.config),
            next_request_id: Arc::clone(&self.next_request_id),
        }
    }
}

impl<H: S3Handler> Service<http::Request<Incoming>> for S3HttpService<H> {
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let body = match incoming.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    error!(%err, "failed to collect request body");
                    let s3_err = S3Error::internal_error("failed to read request body");
                    return Ok(error_to_response(&s3_err, "", false));
                }
            };
            Ok(this.handle(http::Request::from_parts(parts, body)).await)
        })
    }
}

/// Rewrite a virtual-host request to path-style: the leftmost label of the
/// `Host` header becomes the bucket prefix of the path.
fn rewrite_host_bucket(parts: &mut http::request::Parts) {
    let Some(host) = parts
        .headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
    else {
        return;
    };

    let host_no_port = host.split(':').next().unwrap_or(host);
    let Some(bucket) = host_no_port.split('.').next().filter(|b| !b.is_empty()) else {
        return;
    };

    let path = parts.uri.path();
    let mut rewritten = format!("/{bucket}");
    if path != "/" {
        rewritten.push_str(path);
    }
    if let Some(query) = parts.uri.query() {
        rewritten.push('?');
        rewritten.push_str(query);
    }

    debug!(from = %parts.uri, to = %rewritten, "host-bucket rewrite");

    if let Ok(uri) = rewritten.parse::<http::Uri>() {
        parts.uri = uri;
    }
}

/// Attach the headers every response carries: request IDs, the server
/// banner, and the permissive CORS set.
fn add_common_headers(
    mut response: http::Response<S3ResponseBody>,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv.clone());
        headers.insert("x-amz-id-2", hv);
    }

    headers.insert("Server", http::header::HeaderValue::from_static("MockS3"));
    headers.insert(
        "Access-Control-Allow-Origin",
        http::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        http::header::HeaderValue::from_static("GET, HEAD, PUT, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        http::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Expose-Headers",
        http::header::HeaderValue::from_static(
            "ETag, x-amz-request-id, x-amz-version-id, x-amz-delete-marker",
        ),
    );

    response
}
