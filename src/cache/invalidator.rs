use std::sync::Arc;

use coralpress_api_types::InvalidationRequest;
use metrics::counter;
use tracing::info;

use super::keys::Dependency;
use super::registry::DependencyRegistry;
use super::store::ResponseStore;
use super::METRIC_CACHE_INVALIDATED;

/// Drops cached responses affected by a content change.
#[derive(Clone)]
pub struct Invalidator {
    store: Arc<ResponseStore>,
    registry: Arc<DependencyRegistry>,
}

impl Invalidator {
    pub fn new(store: Arc<ResponseStore>, registry: Arc<DependencyRegistry>) -> Self {
        Self { store, registry }
    }

    /// Invalidate everything built from `request`'s target; returns the number
    /// of cache keys dropped.
    pub fn invalidate(&self, request: &InvalidationRequest) -> usize {
        self.invalidate_dependency(&Dependency::from(request))
    }

    pub fn invalidate_dependency(&self, dep: &Dependency) -> usize {
        let mut keys = self.registry.take_dependents(dep);
        if let Dependency::Path(path) = dep {
            keys.extend(self.store.keys_for_path(path));
        }

        for key in &keys {
            self.store.remove(key);
            self.registry.unregister(key);
        }

        let dropped = keys.len();
        counter!(METRIC_CACHE_INVALIDATED).increment(dropped as u64);
        info!(
            target = "coralpress::cache",
            dependency = %dep,
            dropped,
            "cache invalidated"
        );
        dropped
    }

    /// Drop every cached response.
    pub fn invalidate_all(&self) {
        self.store.clear();
        self.registry.clear();
        info!(target = "coralpress::cache", "cache cleared");
    }
}
