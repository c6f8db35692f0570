//! End-to-end tests for the mocks3 gateway.
//!
//! Each test spins up a gateway over the in-memory backend on an ephemeral
//! loopback port and drives it with the official AWS SDK, exercising the
//! full pipeline: middleware, routing, dispatch, backend, and XML.
//!
//! Run with `cargo test -p mocks3-integration`.

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use hyper_util::rt::TokioIo;

use mocks3_core::{GatewayConfig, MockS3};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Start an in-process gateway and return its endpoint URL.
///
/// The listener accepts connections until the test's runtime shuts down.
pub async fn start_gateway(config: GatewayConfig) -> String {
    init_tracing();

    let service = MockS3::in_memory().with_config(config).into_service();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let io = TokioIo::new(stream);
            let service = service.clone();
            tokio::spawn(async move {
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(io, service)
                    .await;
            });
        }
    });

    format!("http://{addr}")
}

/// Start a gateway with default configuration.
pub async fn start_default_gateway() -> String {
    start_gateway(GatewayConfig::default()).await
}

/// Create an S3 client pointing at the given endpoint.
#[must_use]
pub fn s3_client(endpoint: &str) -> aws_sdk_s3::Client {
    s3_client_with_credentials(endpoint, "test", "test")
}

/// Create an S3 client with explicit credentials.
#[must_use]
pub fn s3_client_with_credentials(
    endpoint: &str,
    access_key: &str,
    secret_key: &str,
) -> aws_sdk_s3::Client {
    let creds = Credentials::new(access_key, secret_key, None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint)
        .force_path_style(true)
        .request_checksum_calculation(
            aws_sdk_s3::config::RequestChecksumCalculation::WhenRequired,
        )
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name.
pub async fn create_test_bucket(client: &aws_sdk_s3::Client, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

#[cfg(test)]
mod test_bucket;
#[cfg(test)]
mod test_error;
#[cfg(test)]
mod test_list;
#[cfg(test)]
mod test_multipart;
#[cfg(test)]
mod test_object;
#[cfg(test)]
mod test_versioning;
