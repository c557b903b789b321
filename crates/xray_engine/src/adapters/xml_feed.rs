//! RSS and Atom feeds, read with `feed-rs`.

use engine_logging::engine_debug;
use url::Url;
use xray_core::sanitize::{strip, SanitizeOptions};
use xray_core::urls::is_http_url;
use xray_core::{Card, Entry, Feed, Post};

use super::{distinct_name, markup_value};

/// Cheap sniff for an XML feed body.
pub fn looks_like_xml_feed(body: &str) -> bool {
    let head = body.trim_start();
    ["<?xml", "<rss", "<feed", "<rdf:RDF"]
        .iter()
        .any(|marker| head.starts_with(marker))
}

/// Parses an RSS or Atom document. `None` when the body is not a feed, so
/// the caller can fall back to HTML.
pub fn parse_xml_feed(body: &str, url: &str, allow_iframe_video: bool) -> Option<Entry> {
    let parsed = match feed_rs::parser::parse(body.as_bytes()) {
        Ok(parsed) => parsed,
        Err(err) => {
            engine_debug!("{url}: not an RSS/Atom feed: {err}");
            return None;
        }
    };

    let base = Url::parse(url).ok();
    let options = SanitizeOptions {
        allow_images: true,
        allow_iframe_video,
        base_url: base.as_ref(),
    };

    let author = parsed.authors.first().and_then(card_from_person);
    let items = parsed
        .entries
        .iter()
        .map(|entry| Entry::Entry(post_from_entry(entry, author.as_ref(), &options)))
        .collect();

    Some(Entry::Feed(Feed {
        name: parsed.title.as_ref().map(text_of).filter(|name| !name.is_empty()),
        url: alternate_link(&parsed.links).or_else(|| Some(url.to_string())),
        author,
        items,
    }))
}

fn post_from_entry(
    entry: &feed_rs::model::Entry,
    feed_author: Option<&Card>,
    options: &SanitizeOptions<'_>,
) -> Post {
    let content = entry
        .content
        .as_ref()
        .and_then(|content| {
            let body = content.body.as_deref()?;
            markup_value(body, is_markup(&content.content_type.essence().to_string(), body), options)
        })
        .or_else(|| {
            let summary = entry.summary.as_ref()?;
            markup_value(
                &summary.content,
                is_markup(&summary.content_type.essence().to_string(), &summary.content),
                options,
            )
        });

    let mut post = Post {
        name: distinct_name(entry.title.as_ref().map(text_of), content.as_ref()),
        uid: Some(entry.id.trim().to_string()).filter(|id| !id.is_empty()),
        url: alternate_link(&entry.links),
        published: entry.published.or(entry.updated).map(|date| date.to_rfc3339()),
        content,
        author: entry
            .authors
            .first()
            .and_then(card_from_person)
            .or_else(|| feed_author.cloned()),
        ..Post::default()
    };

    for category in &entry.categories {
        let term = category.term.trim().trim_start_matches('#');
        if !term.is_empty() && !post.category.iter().any(|existing| existing == term) {
            post.category.push(term.to_string());
        }
    }

    let enclosure = entry.media.iter().flat_map(|media| &media.content).find_map(|content| {
        let url = content.url.as_ref()?.to_string();
        let mime = content.content_type.as_ref()?.essence().to_string();
        Some((url, mime))
    });
    if let Some((url, mime)) = enclosure {
        match mime.split('/').next() {
            Some("image") => post.photo.push(url),
            Some("audio") => post.audio.push(url),
            Some("video") => post.video.push(url),
            _ => {}
        }
    }

    post
}

fn text_of(text: &feed_rs::model::Text) -> String {
    if is_html_mime(&text.content_type.essence().to_string()) {
        strip(&text.content)
    } else {
        text.content.trim().to_string()
    }
}

fn is_html_mime(essence: &str) -> bool {
    essence == "text/html" || essence == "application/xhtml+xml"
}

/// RSS descriptions are declared as plain text but routinely carry HTML.
fn is_markup(essence: &str, body: &str) -> bool {
    is_html_mime(essence) || (body.contains('<') && body.contains('>'))
}

fn alternate_link(links: &[feed_rs::model::Link]) -> Option<String> {
    links
        .iter()
        .find(|link| link.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .map(|link| link.href.trim().to_string())
        .filter(|href| is_http_url(href))
}

fn card_from_person(person: &feed_rs::model::Person) -> Option<Card> {
    let card = Card {
        name: Some(person.name.trim().to_string()).filter(|name| !name.is_empty()),
        url: person
            .uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| is_http_url(uri))
            .map(str::to_string),
        ..Card::default()
    };
    card.is_usable().then_some(card)
}
