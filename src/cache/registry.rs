//! Bidirectional dependency registry.
//!
//! Maps each dependency to the cache keys built from it, and each key back to
//! its dependencies so evicted entries can be cleaned up.
//!
//! Every invalidation advances an epoch. A render that started before the
//! epoch moved may have read stale content and is refused registration.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::{CacheKey, Dependency};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

#[derive(Default)]
struct Maps {
    dependents: HashMap<Dependency, HashSet<CacheKey>>,
    dependencies: HashMap<CacheKey, HashSet<Dependency>>,
    epoch: u64,
}

#[derive(Default)]
pub struct DependencyRegistry {
    maps: RwLock<Maps>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` was built from `deps`, replacing earlier mappings.
    pub fn register(&self, key: CacheKey, deps: HashSet<Dependency>) {
        let mut maps = rw_write(&self.maps, SOURCE, "register");
        attach(&mut maps, key, deps);
    }

    /// Current invalidation epoch.
    pub fn epoch(&self) -> u64 {
        rw_read(&self.maps, SOURCE, "epoch").epoch
    }

    /// Register `key` only if no invalidation ran since `epoch` was read.
    pub fn register_if_current(
        &self,
        key: CacheKey,
        deps: HashSet<Dependency>,
        epoch: u64,
    ) -> bool {
        let mut maps = rw_write(&self.maps, SOURCE, "register_if_current");
        if maps.epoch != epoch {
            return false;
        }
        attach(&mut maps, key, deps);
        true
    }

    pub fn keys_for(&self, dep: &Dependency) -> HashSet<CacheKey> {
        rw_read(&self.maps, SOURCE, "keys_for")
            .dependents
            .get(dep)
            .cloned()
            .unwrap_or_default()
    }

    pub fn dependencies_of(&self, key: &CacheKey) -> HashSet<Dependency> {
        rw_read(&self.maps, SOURCE, "dependencies_of")
            .dependencies
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget `key` and every mapping that points at it.
    pub fn unregister(&self, key: &CacheKey) {
        let mut maps = rw_write(&self.maps, SOURCE, "unregister");
        detach(&mut maps, key);
    }

    /// Remove `dep` and every key registered under it; returns those keys.
    pub fn take_dependents(&self, dep: &Dependency) -> HashSet<CacheKey> {
        let mut maps = rw_write(&self.maps, SOURCE, "take_dependents");
        maps.epoch = maps.epoch.wrapping_add(1);
        let keys = maps.dependents.remove(dep).unwrap_or_default();
        for key in &keys {
            detach(&mut maps, key);
        }
        keys
    }

    pub fn clear(&self) {
        let mut maps = rw_write(&self.maps, SOURCE, "clear");
        maps.epoch = maps.epoch.wrapping_add(1);
        maps.dependents.clear();
        maps.dependencies.clear();
    }

    pub fn dependency_count(&self) -> usize {
        rw_read(&self.maps, SOURCE, "dependency_count").dependents.len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.maps, SOURCE, "key_count").dependencies.len()
    }
}

fn attach(maps: &mut Maps, key: CacheKey, deps: HashSet<Dependency>) {
    detach(maps, &key);
    for dep in &deps {
        maps.dependents
            .entry(dep.clone())
            .or_default()
            .insert(key.clone());
    }
    maps.dependencies.insert(key, deps);
}

fn detach(maps: &mut Maps, key: &CacheKey) {
    let Some(deps) = maps.dependencies.remove(key) else {
        return;
    };
    for dep in deps {
        if let Some(keys) = maps.dependents.get_mut(&dep) {
            keys.remove(key);
            if keys.is_empty() {
                maps.dependents.remove(&dep);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn deps(items: &[Dependency]) -> HashSet<Dependency> {
        items.iter().cloned().collect()
    }

    #[test]
    fn register_and_lookup_both_ways() {
        let registry = DependencyRegistry::new();
        let key = CacheKey::new("/en/team", None);
        let team = Dependency::tag("team-members");

        registry.register(key.clone(), deps(&[team.clone(), Dependency::path("/en/team")]));

        assert!(registry.keys_for(&team).contains(&key));
        assert!(registry.dependencies_of(&key).contains(&team));
        assert_eq!(registry.dependency_count(), 2);
    }

    #[test]
    fn unregister_cleans_up_mappings() {
        let registry = DependencyRegistry::new();
        let key = CacheKey::new("/en", None);
        registry.register(key.clone(), deps(&[Dependency::tag("pages")]));

        registry.unregister(&key);

        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.dependency_count(), 0);
    }

    #[test]
    fn take_dependents_detaches_every_key() {
        let registry = DependencyRegistry::new();
        let team = Dependency::tag("team-members");
        let en = CacheKey::new("/en/about", None);
        let de = CacheKey::new("/de/about", None);
        registry.register(en.clone(), deps(&[team.clone(), Dependency::tag("pages")]));
        registry.register(de.clone(), deps(&[team.clone()]));

        let taken = registry.take_dependents(&team);

        assert_eq!(taken.len(), 2);
        assert!(taken.contains(&en) && taken.contains(&de));
        assert!(registry.keys_for(&Dependency::tag("pages")).is_empty());
        assert_eq!(registry.key_count(), 0);
    }

    #[test]
    fn re_registering_replaces_dependencies() {
        let registry = DependencyRegistry::new();
        let key = CacheKey::new("/en", None);
        registry.register(key.clone(), deps(&[Dependency::tag("old")]));
        registry.register(key.clone(), deps(&[Dependency::tag("new")]));

        assert!(registry.keys_for(&Dependency::tag("old")).is_empty());
        assert!(registry.keys_for(&Dependency::tag("new")).contains(&key));
    }

    #[test]
    fn registration_is_refused_after_an_invalidation() {
        let registry = DependencyRegistry::new();
        let key = CacheKey::new("/en/about", None);
        let epoch = registry.epoch();

        registry.take_dependents(&Dependency::tag("team-members"));

        assert!(!registry.register_if_current(key.clone(), deps(&[Dependency::tag("pages")]), epoch));
        assert_eq!(registry.key_count(), 0);
        assert!(registry.register_if_current(key, deps(&[Dependency::tag("pages")]), registry.epoch()));
        assert_eq!(registry.key_count(), 1);
    }

    #[test]
    fn clear_advances_the_epoch() {
        let registry = DependencyRegistry::new();
        let before = registry.epoch();
        registry.clear();
        assert_ne!(registry.epoch(), before);
    }

    #[test]
    fn registry_recovers_from_poisoned_lock() {
        let registry = DependencyRegistry::new();
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = registry.maps.write().expect("lock acquired");
            panic!("poison registry lock");
        }));

        registry.register(CacheKey::new("/en", None), deps(&[Dependency::tag("pages")]));
        assert_eq!(registry.key_count(), 1);
    }
}
