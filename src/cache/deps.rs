//! Task-local dependency collection.
//!
//! Services call [`record`] before loading anything that shapes a response;
//! the cache middleware wraps the handler in [`with_collector`] and registers
//! the stored response under whatever was recorded.

use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;

use super::keys::Dependency;

tokio::task_local! {
    static DEPS: RefCell<HashSet<Dependency>>;
}

/// Record a dependency of the response being built.
///
/// Outside a collector (CLI rendering, tests) this does nothing.
pub fn record(dep: Dependency) {
    let _ = DEPS.try_with(|deps| {
        deps.borrow_mut().insert(dep);
    });
}

/// Run `f` with a fresh collector and return what it recorded.
pub async fn with_collector<F, R>(f: F) -> (R, HashSet<Dependency>)
where
    F: Future<Output = R>,
{
    DEPS.scope(RefCell::new(HashSet::new()), async move {
        let result = f.await;
        let collected = DEPS.try_with(RefCell::take).unwrap_or_default();
        (result, collected)
    })
    .await
}
