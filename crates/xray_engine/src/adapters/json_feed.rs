//! JSON Feed (https://jsonfeed.org) documents.

use serde::Deserialize;
use serde_json::Value;
use url::Url;
use xray_core::sanitize::SanitizeOptions;
use xray_core::urls::is_http_url;
use xray_core::{Card, Entry, Feed, Post};

use super::{distinct_name, markup_value};

const VERSION_PREFIX: &str = "https://jsonfeed.org/version/";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonFeed {
    title: Option<String>,
    home_page_url: Option<String>,
    feed_url: Option<String>,
    author: Option<JsonAuthor>,
    authors: Vec<JsonAuthor>,
    items: Vec<JsonItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonItem {
    id: Option<Value>,
    url: Option<String>,
    title: Option<String>,
    content_html: Option<String>,
    content_text: Option<String>,
    summary: Option<String>,
    image: Option<String>,
    date_published: Option<String>,
    date_modified: Option<String>,
    tags: Vec<String>,
    author: Option<JsonAuthor>,
    authors: Vec<JsonAuthor>,
    attachments: Vec<JsonAttachment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonAuthor {
    name: Option<String>,
    url: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonAttachment {
    url: Option<String>,
    mime_type: Option<String>,
}

pub fn is_json_feed(document: &Value) -> bool {
    document
        .get("version")
        .and_then(Value::as_str)
        .is_some_and(|version| version.starts_with(VERSION_PREFIX))
}

pub fn parse_json_feed(document: &Value, url: &str, allow_iframe_video: bool) -> Option<Entry> {
    let feed = JsonFeed::deserialize(document).ok()?;
    let base = Url::parse(url).ok();
    let options = SanitizeOptions {
        allow_images: true,
        allow_iframe_video,
        base_url: base.as_ref(),
    };

    let feed_author = feed
        .authors
        .first()
        .or(feed.author.as_ref())
        .and_then(card_from_author);
    let items = feed
        .items
        .iter()
        .map(|item| Entry::Entry(post_from_item(item, feed_author.as_ref(), &options)))
        .collect();

    Some(Entry::Feed(Feed {
        name: feed.title.map(|title| title.trim().to_string()),
        url: feed
            .home_page_url
            .or(feed.feed_url)
            .filter(|candidate| is_http_url(candidate))
            .or_else(|| Some(url.to_string())),
        author: feed_author,
        items,
    }))
}

fn post_from_item(item: &JsonItem, feed_author: Option<&Card>, options: &SanitizeOptions<'_>) -> Post {
    let content = item
        .content_html
        .as_deref()
        .and_then(|html| markup_value(html, true, options))
        .or_else(|| {
            item.content_text
                .as_deref()
                .and_then(|text| markup_value(text, false, options))
        });

    let uid = match &item.id {
        Some(Value::String(id)) => Some(id.trim().to_string()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    let mut post = Post {
        name: distinct_name(item.title.clone(), content.as_ref()),
        uid: uid.filter(|id| !id.is_empty()),
        url: item.url.clone().filter(|url| is_http_url(url)),
        published: item.date_published.clone(),
        updated: item.date_modified.clone(),
        summary: item.summary.clone(),
        content,
        author: item
            .authors
            .first()
            .or(item.author.as_ref())
            .and_then(card_from_author)
            .or_else(|| feed_author.cloned()),
        ..Post::default()
    };

    for tag in &item.tags {
        let tag = tag.trim().trim_start_matches('#');
        if !tag.is_empty() && !post.category.iter().any(|existing| existing == tag) {
            post.category.push(tag.to_string());
        }
    }

    if let Some(image) = item.image.as_ref().filter(|image| is_http_url(image)) {
        post.photo.push(image.clone());
    }
    for attachment in &item.attachments {
        let (Some(url), Some(mime)) = (&attachment.url, &attachment.mime_type) else {
            continue;
        };
        let slot = match mime.split('/').next() {
            Some("image") => &mut post.photo,
            Some("audio") => &mut post.audio,
            Some("video") => &mut post.video,
            _ => continue,
        };
        if is_http_url(url) && !slot.contains(url) {
            slot.push(url.clone());
        }
    }

    post
}

fn card_from_author(author: &JsonAuthor) -> Option<Card> {
    let card = Card {
        name: author.name.clone().filter(|name| !name.trim().is_empty()),
        url: author.url.clone().filter(|url| is_http_url(url)),
        photo: author.avatar.clone().filter(|avatar| is_http_url(avatar)),
        ..Card::default()
    };
    card.is_usable().then_some(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn items_map_tags_image_and_summary() {
        let document = json!({
            "version": "https://jsonfeed.org/version/1.1",
            "title": "Notes",
            "home_page_url": "https://notes.example/",
            "authors": [{"name": "Ann", "url": "https://notes.example/about"}],
            "items": [{
                "id": 42,
                "url": "https://notes.example/42",
                "content_text": "Short note",
                "summary": "A note",
                "image": "https://notes.example/42.jpg",
                "tags": ["#life", "rust"]
            }]
        });
        assert!(is_json_feed(&document));

        let Some(Entry::Feed(feed)) = parse_json_feed(&document, "https://notes.example/feed.json", false) else {
            panic!("expected a feed");
        };
        assert_eq!(feed.url.as_deref(), Some("https://notes.example/"));
        let Entry::Entry(post) = &feed.items[0] else {
            panic!("expected an entry");
        };
        assert_eq!(post.uid.as_deref(), Some("42"));
        assert_eq!(post.summary.as_deref(), Some("A note"));
        assert_eq!(post.category, vec!["life".to_string(), "rust".to_string()]);
        assert_eq!(post.photo, vec!["https://notes.example/42.jpg".to_string()]);
        assert_eq!(post.content.as_ref().map(|c| c.text.as_str()), Some("Short note"));
        assert_eq!(post.author.as_ref().and_then(|a| a.name.as_deref()), Some("Ann"));
    }

    #[test]
    fn other_json_is_not_a_feed() {
        assert!(!is_json_feed(&json!({"version": "1.0"})));
        assert!(!is_json_feed(&json!({"items": []})));
    }
}
