//! Format adapters and the site adapter registry.

pub mod activity;
pub mod json_feed;
pub mod xml_feed;

use url::Url;
use xray_core::sanitize::{sanitize, strip, SanitizeOptions};
use xray_core::text::is_name_prefix_of;
use xray_core::{Entry, HtmlValue};

use crate::fetch::FetchRequest;
use crate::{ParseOptions, RawDocument, SourceFormat, XrayError};

/// Text plus sanitized markup from a field that carries HTML (or plain text
/// when `is_html` is false). The markup is dropped when it adds nothing.
pub(crate) fn markup_value(
    raw: &str,
    is_html: bool,
    options: &SanitizeOptions<'_>,
) -> Option<HtmlValue> {
    if !is_html {
        let text = raw.trim();
        return (!text.is_empty()).then(|| HtmlValue {
            text: text.to_string(),
            html: None,
        });
    }
    let text = strip(raw);
    let html = sanitize(raw, options);
    if text.is_empty() && html.is_empty() {
        return None;
    }
    let same_as_text = html == text || (!html.contains('<') && strip(&html) == text);
    let html = (!html.is_empty() && !same_as_text).then_some(html);
    Some(HtmlValue { text, html })
}

/// Feed titles are often the first words of the post; keep only real ones.
pub(crate) fn distinct_name(name: Option<String>, content: Option<&HtmlValue>) -> Option<String> {
    let name = name.map(|name| name.trim().to_string()).filter(|name| !name.is_empty())?;
    match content {
        Some(content) if is_name_prefix_of(&name, &content.text) => None,
        _ => Some(name),
    }
}

/// What a site adapter hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOutput {
    pub entry: Entry,
    pub source_format: SourceFormat,
    pub original: Option<String>,
}

/// Site-specific handling for URLs a generic parser cannot read well.
///
/// Adapters are consulted in registration order; the first whose
/// [`SiteAdapter::matches`] returns true owns the URL.
#[async_trait::async_trait]
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, url: &Url) -> bool;

    /// Adjusts the primary request, e.g. to ask an API endpoint instead.
    fn prepare(&self, request: FetchRequest) -> FetchRequest {
        request
    }

    async fn parse(
        &self,
        document: &RawDocument,
        options: &ParseOptions,
    ) -> Result<AdapterOutput, XrayError>;
}

#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SiteAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Box<dyn SiteAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn find(&self, url: &str) -> Option<&dyn SiteAdapter> {
        let url = Url::parse(url).ok()?;
        self.adapters
            .iter()
            .find(|adapter| adapter.matches(&url))
            .map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
