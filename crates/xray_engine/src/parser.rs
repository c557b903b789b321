//! Content dispatcher: decides what a fetched document is and routes it to
//! the matching reader.

use engine_logging::{engine_debug, engine_info, engine_warn};
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use xray_core::verify::verify_target;
use xray_core::{apply_post_type, Entry, MediaType, Normalizer, ObjectTree, Verification};

use crate::adapters::activity::{is_activity_streams, ActivityParser};
use crate::adapters::json_feed::{is_json_feed, parse_json_feed};
use crate::adapters::xml_feed::{looks_like_xml_feed, parse_xml_feed};
use crate::adapters::SiteAdapter;
use crate::fetch::{AcceptMode, FetchRequest, Fetcher};
use crate::loader::FetchingLoader;
use crate::mf2::{parse_html, parse_page};
use crate::types::{DataRels, Info};
use crate::{Envelope, FailureKind, ParseOptions, RawDocument, SourceFormat, XrayError};

const MF2_JSON: &str = "application/mf2+json";

/// What one reader made of the document, before verification.
struct Outcome {
    entry: Entry,
    source_format: Option<SourceFormat>,
    code: u16,
    original: Option<String>,
    info: Info,
    parsed_url: Option<String>,
    canonical: Option<String>,
    /// The body is HTML, so link verification also scans the raw markup.
    is_html: bool,
}

impl Outcome {
    fn new(entry: Option<Entry>, source_format: SourceFormat, code: u16) -> Self {
        Self {
            entry: entry.unwrap_or(Entry::Unknown),
            source_format: Some(source_format),
            code,
            original: None,
            info: Info::default(),
            parsed_url: None,
            canonical: None,
            is_html: false,
        }
    }

    fn unknown(code: u16) -> Self {
        Self {
            source_format: None,
            ..Self::new(None, SourceFormat::Mf2Html, code)
        }
    }
}

pub(crate) struct Dispatcher<'a> {
    fetcher: &'a dyn Fetcher,
    options: &'a ParseOptions,
    /// The primary request; secondary fetches take half of its budget.
    request: &'a FetchRequest,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(
        fetcher: &'a dyn Fetcher,
        options: &'a ParseOptions,
        request: &'a FetchRequest,
    ) -> Self {
        Self {
            fetcher,
            options,
            request,
        }
    }

    fn loader(&self) -> FetchingLoader<'_> {
        FetchingLoader::new(self.fetcher, self.request, self.options.include_mf1)
    }

    pub(crate) async fn dispatch(
        &self,
        document: &RawDocument,
        adapter: Option<&dyn SiteAdapter>,
    ) -> Result<Envelope, XrayError> {
        if document.body.trim().is_empty() {
            if document.status == 410 {
                return Ok(Envelope::new(Entry::Unknown, &document.final_url, 410));
            }
            return Err(XrayError::new(
                FailureKind::NoContent,
                &document.url,
                "We did not get a response body when fetching the URL",
            ));
        }

        let mut outcome = match adapter {
            Some(adapter) => self.site(adapter, document).await,
            None => self.detect(document).await?,
        };
        outcome.original = match self.options.include_original {
            true => outcome.original.or_else(|| Some(document.body.clone())),
            false => None,
        };

        if let Some(target) = self.options.target.as_deref() {
            self.verify(document, &mut outcome, target)?;
        }
        // The normalizer tags mf2 output itself.
        if !matches!(
            outcome.source_format,
            Some(SourceFormat::Mf2Html | SourceFormat::Mf2Json)
        ) {
            apply_post_type(&mut outcome.entry);
        }

        let mut envelope = Envelope::new(outcome.entry, &document.final_url, outcome.code);
        envelope.source_format = outcome.source_format;
        envelope.original = outcome.original;
        envelope.info = outcome.info;
        envelope.parsed_url = outcome.parsed_url;
        envelope.data.rels = outcome.canonical.map(|canonical| DataRels { canonical });
        Ok(envelope)
    }

    async fn site(&self, adapter: &dyn SiteAdapter, document: &RawDocument) -> Outcome {
        match adapter.parse(document, self.options).await {
            Ok(output) => Outcome {
                original: output.original,
                ..Outcome::new(Some(output.entry), output.source_format, document.status)
            },
            Err(err) => {
                engine_warn!("{} adapter could not parse {}: {err}", adapter.name(), document.url);
                Outcome::unknown(document.status)
            }
        }
    }

    async fn detect(&self, document: &RawDocument) -> Result<Outcome, XrayError> {
        let body = document.body.trim_start();
        let media_type = document.content_type.as_deref().and_then(MediaType::parse);

        if body.starts_with('{') {
            match serde_json::from_str::<Value>(body) {
                Ok(json) => return Ok(self.json(document, &json).await),
                Err(err) if media_type.as_ref().is_some_and(MediaType::is_json) => {
                    return Err(XrayError::new(
                        FailureKind::InvalidContent,
                        &document.url,
                        format!("The JSON response could not be parsed: {err}"),
                    ));
                }
                Err(err) => engine_debug!("{}: body is not JSON ({err}), trying HTML", document.url),
            }
        }

        if looks_like_xml_feed(body) {
            let feed = parse_xml_feed(body, &document.final_url, self.options.allow_iframe_video);
            if let Some(feed) = feed {
                return Ok(Outcome::new(Some(feed), SourceFormat::FeedXml, document.status));
            }
        }

        Ok(self.html(document).await)
    }

    /// JSON Feed is checked before the object tree because both carry `items`.
    async fn json(&self, document: &RawDocument, json: &Value) -> Outcome {
        let url = &document.final_url;
        if is_json_feed(json) {
            let feed = parse_json_feed(json, url, self.options.allow_iframe_video);
            return Outcome::new(feed, SourceFormat::FeedJson, document.status);
        }
        if json.get("items").is_some() {
            let entry = self.mf2_json(json, url).await;
            return Outcome::new(entry, SourceFormat::Mf2Json, document.status);
        }
        if is_activity_streams(json) {
            let entry = self.activity(json, url).await;
            return Outcome::new(entry, SourceFormat::ActivityJson, document.status);
        }
        engine_info!("{url}: JSON document of no known shape");
        Outcome::unknown(document.status)
    }

    async fn mf2_json(&self, json: &Value, url: &str) -> Option<Entry> {
        let tree = match ObjectTree::deserialize(json) {
            Ok(tree) => tree,
            Err(err) => {
                engine_debug!("{url}: items do not form an object tree: {err}");
                return None;
            }
        };
        self.normalize(&tree, url).await
    }

    async fn activity(&self, json: &Value, url: &str) -> Option<Entry> {
        let loader = self.loader();
        ActivityParser::new(&loader, url, self.options.allow_iframe_video)
            .parse(json)
            .await
    }

    pub(crate) async fn normalize(&self, tree: &ObjectTree, url: &str) -> Option<Entry> {
        let loader = self.loader();
        Normalizer::new(&loader, self.options.normalize_options())
            .normalize(tree, url)
            .await
    }

    async fn html(&self, document: &RawDocument) -> Outcome {
        let url = &document.final_url;
        let fragment = Url::parse(&document.url)
            .ok()
            .and_then(|requested| requested.fragment().map(str::to_string));
        let parsed = parse_page(&document.body, url, self.options.include_mf1, fragment.as_deref());

        let code = match parsed.meta_status {
            Some(status) => {
                engine_debug!("{url}: status overridden to {status} by meta tag");
                status
            }
            None => document.status,
        };
        let canonical = parsed.tree.rel("canonical").first().cloned();

        let mut outcome = match self.alternate(&parsed.tree).await {
            Some(alternate) => alternate,
            None => {
                let entry = self.normalize(&parsed.tree, url).await;
                Outcome::new(entry, SourceFormat::Mf2Html, code)
            }
        };
        outcome.code = code;
        outcome.info.found_fragment = parsed.found_fragment;
        outcome.canonical = canonical;
        outcome.is_html = true;
        outcome
    }

    /// Reads the first usable alternate representation the page links to.
    async fn alternate(&self, tree: &ObjectTree) -> Option<Outcome> {
        let alternates: Vec<(&String, MediaType)> = tree
            .rel_urls
            .iter()
            .filter(|(_, rel)| rel.rels.iter().any(|r| r == "alternate"))
            .filter_map(|(href, rel)| Some((href, MediaType::parse(rel.media_type.as_deref()?)?)))
            .collect();

        if let Some((href, _)) = alternates.iter().find(|(_, media)| media.essence() == MF2_JSON) {
            if let Some(outcome) = self.mf2_alternate(href).await {
                return Some(outcome);
            }
        }
        if self.options.ignore_as2 {
            return None;
        }
        if let Some((href, _)) = alternates.iter().find(|(_, media)| media.is_activity_streams()) {
            if let Some(outcome) = self.activity_alternate(href).await {
                return Some(outcome);
            }
        }
        None
    }

    async fn mf2_alternate(&self, href: &str) -> Option<Outcome> {
        let document = self.loader().fetch_secondary(href, AcceptMode::Json).await?;
        let json: Value = serde_json::from_str(&document.body).ok()?;
        json.get("items")?;
        let entry = self.mf2_json(&json, &document.final_url).await?;
        engine_info!("parsed mf2 JSON alternate {href}");
        Some(Outcome {
            parsed_url: Some(document.final_url.clone()),
            ..Outcome::new(Some(entry), SourceFormat::Mf2Json, document.status)
        })
    }

    async fn activity_alternate(&self, href: &str) -> Option<Outcome> {
        let document = self.loader().fetch_secondary(href, AcceptMode::ActivityPub).await?;
        let json: Value = serde_json::from_str(&document.body).ok()?;
        if !is_activity_streams(&json) {
            return None;
        }
        let entry = self.activity(&json, &document.final_url).await?;
        engine_info!("parsed ActivityStreams alternate {href}");
        Some(Outcome {
            parsed_url: Some(document.final_url.clone()),
            ..Outcome::new(Some(entry), SourceFormat::ActivityJson, document.status)
        })
    }

    fn verify(&self, document: &RawDocument, outcome: &mut Outcome, target: &str) -> Result<(), XrayError> {
        let base = Url::parse(&document.final_url).ok();
        let raw_html = outcome.is_html.then_some(document.body.as_str());
        let verification = verify_target(&outcome.entry, raw_html, base.as_ref(), target, || {
            has_strict_objects(&document.body, &document.final_url)
        });

        match verification {
            Verification::Found => {
                outcome.info.found = Some(true);
                Ok(())
            }
            Verification::FoundInHtmlOnly => {
                engine_debug!("{}: link to {target} found outside any object", document.url);
                outcome.entry = Entry::Unknown;
                outcome.info.found = Some(true);
                Ok(())
            }
            Verification::NotInObject | Verification::NotInHtml => Err(XrayError::new(
                FailureKind::NoLinkFound,
                &document.url,
                verification.description().unwrap_or_default(),
            )),
        }
    }
}

/// Re-parses the page without legacy class names and reports whether any
/// recognized object remains.
fn has_strict_objects(html: &str, url: &str) -> bool {
    parse_html(html, url, false)
        .walk()
        .iter()
        .any(|item| item.kind().is_some())
}
