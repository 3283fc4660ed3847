use std::{
    fs,
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use k8s_openapi::{
    apimachinery::pkg::{apis::meta::v1::APIResourceList, version::Info},
    chrono::{DateTime, TimeDelta, Utc},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

pub mod client;

/// How long a cached discovery snapshot is trusted with `--cached`.
pub const DISCOVERY_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Source of discovery data for one invocation.
pub trait DiscoveryGateway {
    /// Reads the server version; used as a reachability probe.
    fn server_version(&self) -> impl Future<Output = Result<Info>>;

    /// Lists every resource at the version the server prefers, one block per group-version.
    fn server_preferred_resources(&self) -> impl Future<Output = Result<Vec<APIResourceList>>>;
}

/// Represent the discovery cache file format,
/// which includes the timestamp of when the groups were fetched
/// and the raw group-version blocks.
#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoveryCacheFile {
    /// The timestamp when the resources were saved to the cache.
    updated_at: DateTime<Utc>,
    /// The preferred resource lists as returned by the server.
    groups: Vec<APIResourceList>,
}

impl DiscoveryCacheFile {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Utc::now() - self.updated_at <= ttl
    }

    pub fn into_groups(self) -> Vec<APIResourceList> {
        self.groups
    }
}

/// Default cache directory, `$HOME/.kube/cache`, shared with kubectl.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kube").join("cache"))
}

/// Location of the discovery cache for the cluster served at `server`.
pub fn discovery_cache_path(cache_dir: &Path, server: &str) -> PathBuf {
    cache_dir
        .join("api-categories")
        .join(format!("{}.json", sanitize_server(server)))
}

/// Reduces a server URL to a file-name-safe key: scheme and trailing slashes are
/// dropped, every other unsafe character becomes `_`.
fn sanitize_server(server: &str) -> String {
    let server = server
        .strip_prefix("https://")
        .or_else(|| server.strip_prefix("http://"))
        .unwrap_or(server)
        .trim_end_matches('/');
    server
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Load the discovery cache from a file at the specified path.
pub fn load_discovery_cache(path: &Path) -> anyhow::Result<DiscoveryCacheFile> {
    let cache_data = fs::read_to_string(path).context("Failed to read discovery cache file")?;
    serde_json::from_str(&cache_data).context("Failed to parse discovery cache file")
}

/// Save the discovery cache to a file at the specified path.
///
/// The file is written next to its destination and renamed into place.
pub fn save_discovery_cache(path: &Path, groups: &[APIResourceList]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory at {:?}", parent))?;
    }

    let cache_file = DiscoveryCacheFile {
        updated_at: Utc::now(),
        groups: groups.to_vec(),
    };

    let cache_data = serde_json::to_vec(&cache_file)
        .context("Failed to serialize discovery cache data to JSON")?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, cache_data)
        .with_context(|| format!("Failed to write discovery cache to {:?}", tmp_path))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move discovery cache into {:?}", path))?;
    Ok(())
}

/// Load cached group-version blocks, rejecting a cache older than `cache_ttl`.
///
/// This function never performs live discovery against the Kubernetes cluster.
pub fn load_cached_groups(
    cache_path: &Path,
    cache_ttl: Option<Duration>,
) -> anyhow::Result<Vec<APIResourceList>> {
    let cache = load_discovery_cache(cache_path)?;

    if let Some(ttl) = cache_ttl {
        if !cache.is_fresh(ttl) {
            let cache_age = Utc::now() - cache.updated_at;
            return Err(anyhow::anyhow!(
                "discovery cache expired at {cache_path:?} (age: {cache_age:?}, ttl: {ttl:?})"
            ));
        }
    }

    Ok(cache.into_groups())
}

/// A gateway that answers resource listings from disk when allowed to.
///
/// The version probe always reaches the server. Without `use_cache`, or when the
/// cache is missing or stale, resources are fetched live and the cache rewritten.
#[derive(Debug)]
pub struct CachedDiscovery<G> {
    inner: G,
    cache_path: Option<PathBuf>,
    ttl: Duration,
    use_cache: bool,
}

impl<G> CachedDiscovery<G> {
    pub fn new(inner: G, cache_path: Option<PathBuf>, use_cache: bool) -> Self {
        Self {
            inner,
            cache_path,
            ttl: DISCOVERY_CACHE_TTL,
            use_cache,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cached_groups(&self, path: &Path) -> Option<Vec<APIResourceList>> {
        if !self.use_cache {
            debug!("Discovery cache invalidated for {path:?}");
            return None;
        }
        match load_cached_groups(path, Some(self.ttl)) {
            Ok(groups) => {
                debug!("Using discovery cache at {path:?}");
                Some(groups)
            }
            Err(err) => {
                debug!("Discovery cache unavailable: {err:#}");
                None
            }
        }
    }
}

impl<G: DiscoveryGateway> DiscoveryGateway for CachedDiscovery<G> {
    async fn server_version(&self) -> Result<Info> {
        self.inner.server_version().await
    }

    async fn server_preferred_resources(&self) -> Result<Vec<APIResourceList>> {
        let Some(path) = self.cache_path.as_deref() else {
            return self.inner.server_preferred_resources().await;
        };
        if let Some(groups) = self.cached_groups(path) {
            return Ok(groups);
        }

        let groups = self.inner.server_preferred_resources().await?;
        match save_discovery_cache(path, &groups) {
            Ok(()) => debug!("Wrote discovery cache to {path:?}"),
            Err(err) => warn!("Unable to write discovery cache: {err:#}"),
        }
        Ok(groups)
    }
}
