use engine_logging::engine_debug;
use serde_json::Value;
use xray_core::{ObjectTree, PageLoader};

use crate::adapters::activity::ObjectResolver;
use crate::fetch::{AcceptMode, FetchRequest, Fetcher};
use crate::mf2::parse_html;
use crate::RawDocument;

/// Secondary fetches made while handling one request: author pages and
/// ActivityStreams references. Each fetch gets half of the primary budget.
pub(crate) struct FetchingLoader<'a> {
    fetcher: &'a dyn Fetcher,
    primary: &'a FetchRequest,
    include_mf1: bool,
}

impl<'a> FetchingLoader<'a> {
    pub(crate) fn new(fetcher: &'a dyn Fetcher, primary: &'a FetchRequest, include_mf1: bool) -> Self {
        Self {
            fetcher,
            primary,
            include_mf1,
        }
    }

    /// Fetches `url` with a halved budget. Failures and non-2xx responses
    /// are logged and swallowed.
    pub(crate) async fn fetch_secondary(&self, url: &str, accept: AcceptMode) -> Option<RawDocument> {
        let request = self.primary.halved(url, accept);
        match self.fetcher.fetch(&request).await {
            Ok(document) if (200..300).contains(&document.status) => Some(document),
            Ok(document) => {
                engine_debug!("{url}: secondary fetch returned {}", document.status);
                None
            }
            Err(err) => {
                engine_debug!("{url}: secondary fetch failed: {err}");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl PageLoader for FetchingLoader<'_> {
    async fn load(&self, url: &str) -> Option<ObjectTree> {
        let document = self.fetch_secondary(url, AcceptMode::Html).await?;
        let body = document.body.trim_start();
        if body.starts_with('{') {
            return serde_json::from_str(body)
                .inspect_err(|err| engine_debug!("{url}: unreadable mf2 JSON: {err}"))
                .ok();
        }
        Some(parse_html(&document.body, &document.final_url, self.include_mf1))
    }
}

#[async_trait::async_trait]
impl ObjectResolver for FetchingLoader<'_> {
    async fn resolve(&self, url: &str) -> Option<Value> {
        let document = self.fetch_secondary(url, AcceptMode::ActivityPub).await?;
        match serde_json::from_str::<Value>(&document.body) {
            Ok(value) if value.is_object() => Some(value),
            Ok(_) => None,
            Err(err) => {
                engine_debug!("{url}: referenced object is not JSON: {err}");
                None
            }
        }
    }
}
