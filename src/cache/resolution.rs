use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::CacheBackend;
use crate::ids::RouteId;
use crate::resolver::{RequestDescriptor, Resolution, ResolutionStats};
use crate::router::RouteRegistry;

/// Serialized form of a [`Resolution`].
///
/// Only identifiers are stored; the route and router are looked up again in
/// the current registry when the entry is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResolution {
    pub router: String,
    pub route_id: RouteId,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default)]
    pub resource_path: Option<String>,
}

impl From<&Resolution> for CachedResolution {
    fn from(resolution: &Resolution) -> Self {
        Self {
            router: resolution.router.name().to_string(),
            route_id: resolution.route.id(),
            language: resolution.language.clone(),
            params: resolution.params.clone(),
            resource_path: resolution.resource_path.clone(),
        }
    }
}

impl CachedResolution {
    /// Rebuild a full resolution against `registry`.
    ///
    /// `None` when the router or the route is no longer registered.
    pub fn rehydrate(self, registry: &RouteRegistry) -> Option<Resolution> {
        let router = registry.get_router(&self.router)?;
        let route = router.find_by_id(self.route_id)?;
        Some(Resolution {
            route: Arc::clone(route),
            router: Arc::clone(router),
            language: self.language,
            params: self.params,
            resource_path: self.resource_path,
            stats: ResolutionStats {
                from_cache: true,
                ..ResolutionStats::default()
            },
        })
    }
}

/// Resolution cache on top of a [`CacheBackend`].
#[derive(Clone)]
pub struct ResolutionCache {
    backend: Arc<dyn CacheBackend>,
    server_id: String,
    read_timeout: Duration,
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("server_id", &self.server_id)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl ResolutionCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        server_id: impl Into<String>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            server_id: server_id.into(),
            read_timeout,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Key for a request against the registry at `version`
    pub fn key(&self, version: u64, req: &RequestDescriptor<'_>) -> String {
        let mut key = format!("{}:{}:{} {}|", self.server_id, version, req.method, req.path);
        for (i, lang) in req.languages.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(lang);
        }
        key
    }

    /// Read an entry.
    ///
    /// Timeouts, backend errors and undecodable entries are reported as a miss;
    /// an undecodable entry is also removed.
    pub async fn lookup(&self, key: &str) -> Option<CachedResolution> {
        let raw = match tokio::time::timeout(self.read_timeout, self.backend.get(key)).await {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => {
                debug!(cache_key = %key, "Resolution cache miss");
                return None;
            }
            Ok(Err(e)) => {
                warn!(cache_key = %key, error = %e, "Resolution cache read failed");
                return None;
            }
            Err(_) => {
                warn!(
                    cache_key = %key,
                    timeout_ms = self.read_timeout.as_millis(),
                    "Resolution cache read timed out"
                );
                return None;
            }
        };
        match serde_json::from_str::<CachedResolution>(&raw) {
            Ok(entry) => {
                debug!(cache_key = %key, route_id = %entry.route_id, "Resolution cache hit");
                Some(entry)
            }
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Dropping undecodable resolution cache entry");
                self.invalidate(key.to_string());
                None
            }
        }
    }

    /// Write a resolution on a background task.
    pub fn store(&self, key: String, resolution: &Resolution) -> JoinHandle<()> {
        let entry = CachedResolution::from(resolution);
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let value = match serde_json::to_string(&entry) {
                Ok(value) => value,
                Err(e) => {
                    warn!(cache_key = %key, error = %e, "Failed to encode resolution");
                    return;
                }
            };
            if let Err(e) = backend.set(&key, value).await {
                warn!(cache_key = %key, error = %e, "Resolution cache write failed");
            }
        })
    }

    /// Remove an entry on a background task.
    pub fn invalidate(&self, key: String) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            match backend.remove(&key).await {
                Ok(()) => debug!(cache_key = %key, "Resolution cache entry removed"),
                Err(e) => warn!(cache_key = %key, error = %e, "Resolution cache removal failed"),
            }
        })
    }
}
