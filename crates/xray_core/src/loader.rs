use std::collections::HashMap;

use crate::tree::ObjectTree;
use crate::urls::normalize_url;

/// Loads secondary pages (author pages) as object trees.
///
/// Implementations swallow their own failures: a page that cannot be
/// fetched or parsed is simply `None`.
#[async_trait::async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Option<ObjectTree>;
}

/// Loader that never fetches anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLoader;

#[async_trait::async_trait]
impl PageLoader for OfflineLoader {
    async fn load(&self, _url: &str) -> Option<ObjectTree> {
        None
    }
}

/// Loader backed by pre-parsed pages, keyed by normalized URL.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    pages: HashMap<String, ObjectTree>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, tree: ObjectTree) -> Self {
        self.pages.insert(normalize_url(url), tree);
        self
    }
}

#[async_trait::async_trait]
impl PageLoader for MemoryLoader {
    async fn load(&self, url: &str) -> Option<ObjectTree> {
        self.pages.get(&normalize_url(url)).cloned()
    }
}
