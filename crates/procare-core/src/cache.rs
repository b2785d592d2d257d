//! In-memory cache for provider resources listed under a parent key.
//!
//! Classrooms and accounts are fetched per school as the user drills into the
//! school list. Each list is fetched at most once per school; entries never
//! expire and are only dropped by `clear_all`.
//!
//! The cache keeps two maps. `cache` holds everything fetched so far, `view`
//! holds the lists currently shown. `invalidate` only hides a list from the
//! view: the next `get_or_fetch` for that key restores it from `cache`
//! without a remote call.

use std::collections::HashMap;
use std::future::Future;

use tracing::debug;

#[derive(Debug, Clone)]
pub struct ParentKeyedCache<T> {
    /// Resource kind, for log output
    name: &'static str,
    cache: HashMap<String, Vec<T>>,
    view: HashMap<String, Vec<T>>,
}

impl<T: Clone> ParentKeyedCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cache: HashMap::new(),
            view: HashMap::new(),
        }
    }

    /// Return the list for `parent_key`, calling `fetch` only on a cache miss.
    /// A failed fetch stores nothing and is returned to the caller as-is.
    pub async fn get_or_fetch<F, Fut, E>(&mut self, parent_key: &str, fetch: F) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(items) = self.cache.get(parent_key) {
            debug!(cache = self.name, key = parent_key, "Cache hit");
            self.view.insert(parent_key.to_string(), items.clone());
            return Ok(items.clone());
        }

        debug!(cache = self.name, key = parent_key, "Cache miss, fetching");
        let items = fetch().await?;
        self.cache.insert(parent_key.to_string(), items.clone());
        self.view.insert(parent_key.to_string(), items.clone());
        Ok(items)
    }

    /// Hide `parent_key` from the current view. The cached list is kept.
    pub fn invalidate(&mut self, parent_key: &str) {
        self.view.remove(parent_key);
    }

    /// Drop every cached list. The current view is left as it is.
    pub fn clear_all(&mut self) {
        debug!(cache = self.name, entries = self.cache.len(), "Clearing cache");
        self.cache.clear();
    }

    /// Lists currently shown, by parent key.
    pub fn view(&self) -> &HashMap<String, Vec<T>> {
        &self.view
    }

    pub fn is_cached(&self, parent_key: &str) -> bool {
        self.cache.contains_key(parent_key)
    }
}
