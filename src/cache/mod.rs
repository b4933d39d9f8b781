//! Response cache with tag- and path-based invalidation.
//!
//! Rendered public responses are kept in an LRU store with a TTL. While a
//! handler runs, the services it calls record what the response depends on
//! (`deps::record`); the middleware registers the stored entry under those
//! dependencies so a later revalidation can drop exactly the affected entries.
//!
//! ```toml
//! [cache]
//! enabled = true
//! response_limit = 200
//! ttl_seconds = 300
//! ```

mod config;
pub mod deps;
mod invalidator;
mod keys;
mod lock;
mod middleware;
mod registry;
mod store;

pub use config::CacheConfig;
pub use invalidator::Invalidator;
pub use keys::{CacheKey, Dependency, hash_query, normalize_path};
pub use middleware::{CACHE_STATUS_HEADER, CacheState, response_cache_layer};
pub use registry::DependencyRegistry;
pub use store::{CachedResponse, Lookup, ResponseStore};

pub const METRIC_CACHE_HIT: &str = "coralpress_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "coralpress_cache_miss_total";
pub const METRIC_CACHE_EVICT: &str = "coralpress_cache_evict_total";
pub const METRIC_CACHE_INVALIDATED: &str = "coralpress_cache_invalidated_total";
