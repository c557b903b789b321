use std::sync::Arc;

use engine_logging::engine_info;
use xray_core::verify::verify_target;
use xray_core::{Entry, ObjectTree};

use crate::adapters::{AdapterRegistry, SiteAdapter};
use crate::fetch::{validate_url, FetchSettings, Fetcher, ReqwestFetcher};
use crate::parser::Dispatcher;
use crate::{Envelope, FailureKind, ParseOptions, RawDocument, SourceFormat, XrayError};

/// Entry point: fetches a URL, or takes an already fetched body, and turns
/// it into an [`Envelope`].
pub struct XRay {
    fetcher: Arc<dyn Fetcher>,
    adapters: AdapterRegistry,
}

impl XRay {
    pub fn new(settings: FetchSettings) -> Self {
        Self::with_fetcher(Arc::new(ReqwestFetcher::new(settings)))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            adapters: AdapterRegistry::new(),
        }
    }

    /// Registers a site adapter. Adapters are tried in registration order.
    pub fn with_adapter(mut self, adapter: impl SiteAdapter + 'static) -> Self {
        self.adapters.register(Box::new(adapter));
        self
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub async fn parse(&self, url: &str, options: &ParseOptions) -> Result<Envelope, XrayError> {
        let url = url.trim();
        validate_url(url).map_err(|err| XrayError::from_fetch(url, err))?;

        let adapter = self.adapters.find(url);
        let mut request = options.fetch_request(url);
        if let Some(adapter) = adapter {
            engine_info!("{url}: handled by the {} adapter", adapter.name());
            request = adapter.prepare(request);
        }

        let document = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|err| XrayError::from_fetch(url, err))?;
        Dispatcher::new(self.fetcher.as_ref(), options, &request)
            .dispatch(&document, adapter)
            .await
    }

    /// Parses a body the caller already has. Secondary fetches (author
    /// pages, alternates, references) still go out over the network.
    pub async fn process(
        &self,
        url: &str,
        body: impl Into<String>,
        options: &ParseOptions,
    ) -> Result<Envelope, XrayError> {
        let url = url.trim();
        validate_url(url).map_err(|err| XrayError::from_fetch(url, err))?;

        let document = RawDocument::from_body(url, body, None);
        let request = options.fetch_request(url);
        Dispatcher::new(self.fetcher.as_ref(), options, &request)
            .dispatch(&document, self.adapters.find(url))
            .await
    }

    /// Normalizes an object tree the caller parsed elsewhere.
    pub async fn normalize(
        &self,
        tree: &ObjectTree,
        url: &str,
        options: &ParseOptions,
    ) -> Result<Envelope, XrayError> {
        let url = url.trim();
        validate_url(url).map_err(|err| XrayError::from_fetch(url, err))?;

        let request = options.fetch_request(url);
        let entry = Dispatcher::new(self.fetcher.as_ref(), options, &request)
            .normalize(tree, url)
            .await
            .unwrap_or(Entry::Unknown);

        let mut envelope = Envelope::new(entry, url, 200);
        envelope.source_format = Some(SourceFormat::Mf2Json);
        if let Some(target) = options.target.as_deref() {
            // No markup to fall back on, so only the entry itself counts.
            let verification = verify_target(envelope.entry(), None, None, target, || false);
            if !verification.found() {
                return Err(XrayError::new(
                    FailureKind::NoLinkFound,
                    url,
                    verification.description().unwrap_or_default(),
                ));
            }
            envelope.info.found = Some(true);
        }
        Ok(envelope)
    }
}
