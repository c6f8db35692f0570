//! Object-listing handlers: ListObjects V1/V2 and ListObjectVersions.
//!
//! V1 and V2 share one implementation; the differences are confined to the
//! response shape. V2 continuation tokens are the V1 marker in disguise:
//! base64 of the next key, decoded back on the way in. V2 responses omit
//! owner blocks unless `fetch-owner` appears in the query (presence-based).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE as BASE64_URL;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, info};

use mocks3_http::response::xml_ok;
use mocks3_http::{RoutingContext, S3ResponseBody};
use mocks3_model::error::S3Result;
use mocks3_model::types::{Content, ListBucketResult, ListBucketResultV2, ListVersionsResult};
use mocks3_model::{S3Error, S3ErrorCode};

use crate::backend::{ListBucketPage, ObjectList, Prefix, VersionsPage};
use crate::ops::parse_clamped;
use crate::provider::MockS3;

/// Largest number of keys a listing page may return.
const MAX_BUCKET_KEYS: u64 = 1000;

/// The percent-encoding S3 applies to echoed prefixes: everything outside
/// the unreserved set, with path separators kept literal.
const PREFIX_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

impl MockS3 {
    /// GET /bucket and GET /bucket?list-type=2.
    pub(crate) async fn list_bucket(
        &self,
        bucket: &str,
        ctx: &RoutingContext,
        v2: bool,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        self.ensure_bucket_exists(bucket).await?;

        let prefix = Prefix::from_query(ctx.query_value("prefix"), ctx.query_value("delimiter"));
        let page = page_from_query(ctx)?;
        info!(bucket, ?prefix, ?page, v2, "list bucket");

        let mut objects = self.list_with_page_fallback(bucket, &prefix, page.clone()).await?;
        synthesize_directory_placeholder(&prefix, &mut objects);

        let max_keys = page.max_keys.unwrap_or(MAX_BUCKET_KEYS);
        let encoded_prefix = url_encode_prefix(&prefix.prefix);
        let delimiter = prefix.has_delimiter().then(|| prefix.delimiter.clone());

        if v2 {
            let key_count = (objects.contents.len() + objects.common_prefixes.len()) as u64;

            // Owners are V1 baggage: V2 only reports them on request.
            if !ctx.has_query("fetch-owner") {
                for content in &mut objects.contents {
                    content.owner = None;
                }
            }

            let result = ListBucketResultV2 {
                name: bucket.to_owned(),
                prefix: encoded_prefix,
                delimiter,
                max_keys,
                key_count,
                is_truncated: objects.is_truncated,
                start_after: ctx.query_value("start-after").map(ToOwned::to_owned),
                continuation_token: ctx
                    .query_value("continuation-token")
                    .map(ToOwned::to_owned),
                next_continuation_token: objects
                    .next_marker
                    .as_deref()
                    .map(|marker| BASE64_URL.encode(marker)),
                encoding_type: "url".to_owned(),
                contents: objects.contents,
                common_prefixes: objects.common_prefixes,
            };
            xml_ok("ListBucketResult", &result)
        } else {
            let result = ListBucketResult {
                name: bucket.to_owned(),
                prefix: encoded_prefix,
                marker: page.marker.clone().unwrap_or_default(),
                // S3 only emits NextMarker when a delimiter was specified.
                next_marker: delimiter.is_some().then_some(objects.next_marker).flatten(),
                delimiter,
                max_keys,
                is_truncated: objects.is_truncated,
                contents: objects.contents,
                common_prefixes: objects.common_prefixes,
            };
            xml_ok("ListBucketResult", &result)
        }
    }

    /// Call the backend, retrying unpaginated when it cannot page and the
    /// configuration tolerates that.
    async fn list_with_page_fallback(
        &self,
        bucket: &str,
        prefix: &Prefix,
        page: ListBucketPage,
    ) -> S3Result<ObjectList> {
        match self.storage.list_bucket(bucket, prefix, page).await {
            Err(err) if err.code == S3ErrorCode::PageNotImplemented => {
                if self.config.fail_on_unimplemented_page {
                    return Err(S3Error::new(S3ErrorCode::NotImplemented));
                }
                // Simple clients work fine when pagination is ignored, so
                // the default is to list everything in one page.
                debug!(bucket, "backend cannot paginate; retrying without a page");
                self.storage
                    .list_bucket(bucket, prefix, ListBucketPage::default())
                    .await
            }
            other => other,
        }
    }

    /// GET /bucket?versions.
    pub(crate) async fn list_bucket_versions(
        &self,
        bucket: &str,
        ctx: &RoutingContext,
    ) -> S3Result<http::Response<S3ResponseBody>> {
        let versioned = self.versioned()?.clone();
        self.ensure_bucket_exists(bucket).await?;

        let prefix = Prefix::from_query(ctx.query_value("prefix"), ctx.query_value("delimiter"));
        let mut page = versions_page_from_query(ctx)?;

        let has_key_marker = ctx.has_query("key-marker");
        if ctx.has_query("version-id-marker") {
            let marker = ctx.query_value("version-id-marker").unwrap_or("");
            if marker.is_empty() {
                return Err(S3Error::invalid_argument(
                    "version-id-marker",
                    "A version-id marker cannot be empty.",
                ));
            }
            if !has_key_marker {
                return Err(S3Error::invalid_argument(
                    "version-id-marker",
                    "A version-id marker cannot be specified without a key marker.",
                ));
            }
        } else if has_key_marker && ctx.query_value("key-marker").unwrap_or("") == "" {
            // An empty key marker resets the page entirely.
            page = VersionsPage {
                max_keys: page.max_keys,
                ..Default::default()
            };
        }

        let mut result = versioned
            .list_bucket_versions(bucket, &prefix, page.clone())
            .await?;

        // Backends report pre-versioning objects with an empty version ID;
        // the wire carries the literal "null".
        for entry in &mut result.versions {
            entry.normalize_version_id();
        }

        let result = ListVersionsResult {
            name: bucket.to_owned(),
            prefix: url_encode_prefix(&prefix.prefix),
            key_marker: page.key_marker.unwrap_or_default(),
            version_id_marker: page.version_id_marker.unwrap_or_default(),
            max_keys: page.max_keys,
            ..result
        };

        xml_ok("ListVersionsResult", &result)
    }
}

/// Build the listing page from the query: `marker` (V1) takes precedence,
/// then the decoded `continuation-token`, then `start-after` (both V2).
fn page_from_query(ctx: &RoutingContext) -> S3Result<ListBucketPage> {
    let max_keys = parse_clamped(ctx.query_value("max-keys"), MAX_BUCKET_KEYS, MAX_BUCKET_KEYS)?;

    let marker = if let Some(marker) = ctx.query_value("marker") {
        Some(marker.to_owned())
    } else if let Some(token) = ctx.query_value("continuation-token") {
        // Continuation tokens are opaque to clients; ours is base64 of the
        // next marker.
        let decoded = BASE64_URL
            .decode(token)
            .map_err(|_| S3Error::new(S3ErrorCode::InvalidToken))?;
        Some(String::from_utf8_lossy(&decoded).into_owned())
    } else {
        ctx.query_value("start-after").map(ToOwned::to_owned)
    };

    Ok(ListBucketPage {
        marker,
        max_keys: Some(max_keys),
    })
}

/// Build the version-listing page from the query.
fn versions_page_from_query(ctx: &RoutingContext) -> S3Result<VersionsPage> {
    let max_keys = parse_clamped(ctx.query_value("max-keys"), MAX_BUCKET_KEYS, MAX_BUCKET_KEYS)?;
    Ok(VersionsPage {
        key_marker: ctx.query_value("key-marker").map(ToOwned::to_owned),
        version_id_marker: ctx.query_value("version-id-marker").map(ToOwned::to_owned),
        max_keys,
    })
}

/// S3 represents "directories" under a trailing-slash prefix with a
/// zero-size placeholder entry when no real object carries the prefix key
/// itself.
fn synthesize_directory_placeholder(prefix: &Prefix, objects: &mut ObjectList) {
    if !prefix.prefix.ends_with('/') {
        return;
    }
    let has_self = objects
        .contents
        .iter()
        .any(|content| content.key == prefix.prefix);
    if !has_self {
        objects
            .contents
            .push(Content::directory_placeholder(prefix.prefix.clone()));
    }
}

/// Percent-encode an echoed prefix, keeping `/` literal.
fn url_encode_prefix(prefix: &str) -> String {
    utf8_percent_encode(prefix, PREFIX_ENCODE_SET).to_string()
}
