use crate::entry::{Card, HtmlValue, Refs};
use crate::sanitize::{sanitize, strip, SanitizeOptions};
use crate::text::is_name_prefix_of;
use crate::tree::{Item, PropertyValue};
use crate::urls::{contains_url, is_http_url};

use super::{Normalizer, ResolveContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ArrayMode {
    /// Strings pass through; objects contribute their URL or plain value.
    Plaintext,
    /// Only absolute URLs, either verbatim or from an object's `url`.
    Urls,
}

/// First value of a URL-typed single property, if it is an absolute URL.
pub(super) fn single_url(item: &Item, property: &str) -> Option<String> {
    item.plaintexts(property)
        .into_iter()
        .next()
        .filter(|url| is_http_url(url))
}

/// Reads a dual text/html property. The text comes from the source value,
/// never from stripping the sanitized markup.
pub(super) fn html_value(
    item: &Item,
    property: &str,
    options: &SanitizeOptions<'_>,
) -> Option<HtmlValue> {
    let value = item.values(property).first()?;
    let (text, raw_html) = match value {
        PropertyValue::Rich(rich) => (rich.value.trim().to_string(), Some(rich.html.as_str())),
        PropertyValue::Item(nested) => (
            nested.value.as_deref().unwrap_or_default().trim().to_string(),
            nested.html.as_deref(),
        ),
        other => (other.plaintext().unwrap_or_default().trim().to_string(), None),
    };

    let html = raw_html
        .map(|raw| sanitize(raw, options))
        .filter(|html| !html.is_empty() && !same_as_text(html, &text));
    if text.is_empty() && html.is_none() {
        return None;
    }
    Some(HtmlValue { text, html })
}

fn same_as_text(html: &str, text: &str) -> bool {
    html == text || (!html.contains('<') && strip(html) == text)
}

/// Drops a name that merely repeats the start of the content.
pub(super) fn dedupe_name(name: Option<String>, content: Option<&HtmlValue>) -> Option<String> {
    match (name, content) {
        (Some(name), Some(content)) if is_name_prefix_of(&name, &content.text) => None,
        (name, _) => name,
    }
}

/// Builds a card from an `h-card` item. When `preferred_url` is among the
/// card's URLs it wins over the first one.
pub fn parse_card(item: &Item, preferred_url: Option<&str>) -> Card {
    let urls: Vec<String> = item
        .plaintexts("url")
        .into_iter()
        .filter(|url| is_http_url(url))
        .collect();
    let url = match preferred_url {
        Some(preferred) if contains_url(&urls, preferred) => Some(preferred.to_string()),
        _ => urls.into_iter().next(),
    };

    Card {
        name: item.plaintext("name"),
        nickname: item.plaintext("nickname"),
        url,
        photo: single_url(item, "photo"),
        note: item.plaintext("note"),
        latitude: item.plaintext("latitude"),
        longitude: item.plaintext("longitude"),
        locality: item.plaintext("locality"),
        region: item.plaintext("region"),
        country: item
            .plaintext("country-name")
            .or_else(|| item.plaintext("country")),
    }
}

/// Embedded card property such as a check-in venue: a bare URL becomes a
/// URL-only card, a nested object contributes a fixed subset of fields.
pub(super) fn embedded_card(item: &Item, property: &str) -> Option<Card> {
    let card = match item.values(property).first()? {
        PropertyValue::Item(nested) => {
            let parsed = parse_card(nested, None);
            Card {
                name: parsed.name,
                latitude: parsed.latitude,
                longitude: parsed.longitude,
                locality: parsed.locality,
                region: parsed.region,
                country: parsed.country,
                url: parsed.url,
                ..Card::default()
            }
        }
        other => {
            let url = other.plaintext().map(str::trim).filter(|url| is_http_url(url))?;
            Card::from_url(url)
        }
    };
    card.is_usable().then_some(card)
}

impl Normalizer<'_> {
    /// Collects every value of an array property, resolving nested objects
    /// that carry a URL into `refs`.
    pub(super) async fn collect_array(
        &self,
        item: &Item,
        property: &str,
        mode: ArrayMode,
        ctx: &ResolveContext,
        refs: &mut Refs,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for value in item.values(property) {
            let candidate = match value {
                PropertyValue::Item(nested) => {
                    match nested.plaintext("url").filter(|url| is_http_url(url)) {
                        Some(url) => {
                            if !refs.contains_key(&url) {
                                if let Some(resolved) = self.resolve_ref(nested, &url, ctx).await {
                                    refs.insert(url.clone(), resolved);
                                }
                            }
                            Some(url)
                        }
                        None => match mode {
                            ArrayMode::Plaintext => nested
                                .value
                                .clone()
                                .or_else(|| nested.plaintext("name")),
                            ArrayMode::Urls => nested.value.clone(),
                        },
                    }
                }
                other => other.plaintext().map(str::to_string),
            };

            let Some(candidate) = candidate else {
                continue;
            };
            let mut candidate = candidate.trim();
            if property == "category" {
                candidate = candidate.trim_start_matches('#');
            }
            if candidate.is_empty() || (mode == ArrayMode::Urls && !is_http_url(candidate)) {
                continue;
            }
            if !out.iter().any(|existing| existing == candidate) {
                out.push(candidate.to_string());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::RichText;

    fn rich(value: &str, html: &str) -> PropertyValue {
        PropertyValue::Rich(RichText {
            value: value.to_string(),
            html: html.to_string(),
        })
    }

    #[test]
    fn html_is_dropped_when_it_matches_text() {
        let item = Item::new(&["h-entry"]).with("content", rich("Hello & bye", "Hello &amp; bye"));
        let value = html_value(&item, "content", &SanitizeOptions::default()).unwrap();
        assert_eq!(value.text, "Hello & bye");
        assert_eq!(value.html, None);
    }

    #[test]
    fn html_keeps_markup_and_text_comes_from_source_value() {
        let item = Item::new(&["h-entry"])
            .with("content", rich("Hi there", "<p>Hi <b>there</b><script>x</script></p>"));
        let value = html_value(&item, "content", &SanitizeOptions::default()).unwrap();
        assert_eq!(value.text, "Hi there");
        assert_eq!(value.html.as_deref(), Some("<p>Hi <b>there</b></p>"));
    }

    #[test]
    fn card_prefers_requested_url() {
        let item = Item::new(&["h-card"])
            .with_text("name", "Ann")
            .with_text("url", "https://ann.example/")
            .with_text("url", "https://social.example/@ann");
        let card = parse_card(&item, Some("https://social.example/@ann"));
        assert_eq!(card.url.as_deref(), Some("https://social.example/@ann"));
        assert_eq!(parse_card(&item, None).url.as_deref(), Some("https://ann.example/"));
    }

    #[test]
    fn embedded_card_accepts_bare_url_or_object() {
        let venue = Item::new(&["h-card"])
            .with_text("name", "Cafe")
            .with_text("latitude", "45.5")
            .with_text("note", "ignored");
        let item = Item::new(&["h-entry"]).with("checkin", PropertyValue::Item(venue));
        let card = embedded_card(&item, "checkin").unwrap();
        assert_eq!(card.name.as_deref(), Some("Cafe"));
        assert_eq!(card.latitude.as_deref(), Some("45.5"));
        assert_eq!(card.note, None);

        let item = Item::new(&["h-entry"]).with_text("checkin", "https://cafe.example/");
        assert_eq!(
            embedded_card(&item, "checkin"),
            Some(Card::from_url("https://cafe.example/"))
        );
    }
}
