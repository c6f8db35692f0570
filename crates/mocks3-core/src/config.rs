//! Gateway configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default tolerated clock skew: 15 minutes.
pub const DEFAULT_TIME_SKEW: Duration = Duration::from_secs(15 * 60);

/// Default metadata size limit in bytes.
pub const DEFAULT_METADATA_SIZE_LIMIT: usize = 2048;

/// Configuration for a [`MockS3`](crate::provider::MockS3) gateway.
///
/// # Examples
///
/// ```
/// use mocks3_core::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert!(config.integrity_check);
/// assert_eq!(config.metadata_size_limit, 2048);
///
/// let config = GatewayConfig::builder().auto_bucket(true).build();
/// assert!(config.auto_bucket);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Maximum tolerated difference between `x-amz-date` and the server
    /// clock. Zero disables the gate.
    #[builder(default = DEFAULT_TIME_SKEW)]
    pub time_skew: Duration,

    /// Upper bound on total metadata size (keys plus values) per object.
    /// Zero disables the limit.
    #[builder(default = DEFAULT_METADATA_SIZE_LIMIT)]
    pub metadata_size_limit: usize,

    /// Verify `Content-MD5` headers against the received body.
    #[builder(default = true)]
    pub integrity_check: bool,

    /// Surface `NotImplemented` when the backend cannot paginate, instead
    /// of retrying without a page.
    #[builder(default = false)]
    pub fail_on_unimplemented_page: bool,

    /// Interpret the leftmost `Host` label as the bucket name.
    #[builder(default = false)]
    pub host_bucket: bool,

    /// Create missing buckets on first use instead of failing with
    /// `NoSuchBucket`.
    #[builder(default = false)]
    pub auto_bucket: bool,

    /// Access-key/secret-key pairs for the auth gate. Empty disables
    /// authentication.
    #[builder(default)]
    pub auth_keys: HashMap<String, String>,

    /// The region reported where one is needed.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            time_skew: DEFAULT_TIME_SKEW,
            metadata_size_limit: DEFAULT_METADATA_SIZE_LIMIT,
            integrity_check: true,
            fail_on_unimplemented_page: false,
            host_bucket: false,
            auto_bucket: false,
            auth_keys: HashMap::new(),
            region: String::from("us-east-1"),
        }
    }
}

impl GatewayConfig {
    /// Derive the HTTP-layer configuration from this gateway configuration.
    #[must_use]
    pub fn http_config(&self) -> mocks3_http::S3HttpConfig {
        mocks3_http::S3HttpConfig {
            host_bucket: self.host_bucket,
            time_skew: chrono::Duration::from_std(self.time_skew)
                .unwrap_or_else(|_| chrono::Duration::minutes(15)),
        }
    }
}
