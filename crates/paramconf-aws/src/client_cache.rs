//! Shared SSM client cache.
//!
//! Caches service clients (not just SdkConfig) so HTTP connection pools are
//! reused. Each unique (region, endpoint, profile) combination gets its own
//! cached client.
//!
//! A cached client's connection pool is bound to the runtime it was built on,
//! so clients are only ever built and driven on the one runtime held here.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use once_cell::sync::{Lazy, OnceCell};
use tokio::runtime::Runtime;

/// Cache key: (region, endpoint, profile)
type CacheKey = (String, Option<String>, Option<String>);

/// Upper bound for one SSM call including retries
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

static CLIENT_CACHE: Lazy<RwLock<HashMap<CacheKey, aws_sdk_ssm::Client>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// The process-wide runtime every cached client runs on
pub fn runtime() -> std::io::Result<&'static Runtime> {
    RUNTIME.get_or_try_init(Runtime::new)
}

/// Get or create an SSM client for the given region/endpoint/profile.
///
/// Must be driven on [`runtime`].
pub async fn get_client(
    region: &str,
    endpoint: Option<&str>,
    profile: Option<&str>,
) -> aws_sdk_ssm::Client {
    let key = (
        region.to_string(),
        endpoint.map(|s| s.to_string()),
        profile.map(|s| s.to_string()),
    );

    // Fast path for cached clients
    {
        let cache = CLIENT_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = cache.get(&key) {
            return client.clone();
        }
    }

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .timeout_config(
            TimeoutConfig::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .operation_timeout(OPERATION_TIMEOUT)
                .build(),
        );

    if let Some(endpoint) = endpoint {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    if let Some(profile) = profile {
        config_loader = config_loader.profile_name(profile);
    }

    let sdk_config = config_loader.load().await;
    let client = aws_sdk_ssm::Client::new(&sdk_config);

    log::debug!(
        "Created SSM client (region={}, endpoint={:?}, profile={:?})",
        region,
        endpoint,
        profile
    );

    // Another thread may have inserted while we were building
    let mut cache = CLIENT_CACHE.write().unwrap_or_else(|e| e.into_inner());
    cache.entry(key).or_insert(client).clone()
}

/// Drop every cached client.
pub fn clear() {
    CLIENT_CACHE
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}
