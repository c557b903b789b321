//! ActivityStreams 2.0 documents (ActivityPub objects and activities).

use engine_logging::engine_debug;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use url::Url;
use xray_core::sanitize::{strip, SanitizeOptions};
use xray_core::urls::is_http_url;
use xray_core::{Card, Entry, Event, Post, Refs};

use super::markup_value;

const AS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

const ACTOR_TYPES: &[&str] = &["Person", "Service", "Organization", "Application", "Group"];
const POST_TYPES: &[&str] = &["Note", "Article", "Page", "Question", "Image", "Video", "Audio"];

/// Looks up ActivityStreams objects referenced by URL.
#[async_trait::async_trait]
pub trait ObjectResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Option<Value>;
}

/// True when `@context` is, or contains, the ActivityStreams namespace.
pub fn is_activity_streams(document: &Value) -> bool {
    match document.get("@context") {
        Some(Value::String(context)) => context == AS_CONTEXT,
        Some(Value::Array(contexts)) => contexts
            .iter()
            .any(|context| context.as_str() == Some(AS_CONTEXT)),
        _ => false,
    }
}

pub struct ActivityParser<'a> {
    resolver: &'a dyn ObjectResolver,
    base: Option<Url>,
    allow_iframe_video: bool,
}

impl<'a> ActivityParser<'a> {
    pub fn new(resolver: &'a dyn ObjectResolver, url: &str, allow_iframe_video: bool) -> Self {
        Self {
            resolver,
            base: Url::parse(url).ok(),
            allow_iframe_video,
        }
    }

    /// Converts the document to an entry; `None` for types with no mapping.
    pub async fn parse(&self, document: &Value) -> Option<Entry> {
        self.convert(document, true).await
    }

    fn convert<'s>(&'s self, object: &'s Value, resolve_refs: bool) -> BoxFuture<'s, Option<Entry>> {
        async move {
            let kind = object.get("type").and_then(Value::as_str).unwrap_or_default();
            match kind {
                "Create" | "Update" => {
                    let inner = self.dereference(object.get("object")?).await?;
                    self.convert(&inner, resolve_refs).await
                }
                "Announce" | "Like" => self.activity(object, kind, resolve_refs).await,
                "Event" => Some(Entry::Event(self.event(object).await)),
                _ if ACTOR_TYPES.contains(&kind) => Some(Entry::Card(card_from_actor(object))),
                _ if POST_TYPES.contains(&kind) => {
                    Some(Entry::Entry(self.post(object, kind, resolve_refs).await))
                }
                _ => {
                    engine_debug!("no mapping for ActivityStreams type {kind:?}");
                    None
                }
            }
        }
        .boxed()
    }

    async fn post(&self, object: &Value, kind: &str, resolve_refs: bool) -> Post {
        let options = self.sanitize_options();
        let content = string_field(object, "content")
            .and_then(|html| markup_value(&html, true, &options));

        let mut post = Post {
            name: matches!(kind, "Article" | "Page")
                .then(|| string_field(object, "name"))
                .flatten(),
            uid: string_field(object, "id"),
            url: object.get("url").and_then(link_of).or_else(|| string_field(object, "id")),
            published: string_field(object, "published"),
            updated: string_field(object, "updated"),
            summary: string_field(object, "summary").map(|summary| strip(&summary)),
            content,
            ..Post::default()
        };

        for tag in as_list(object.get("tag")) {
            if tag.get("type").and_then(Value::as_str) != Some("Hashtag") {
                continue;
            }
            if let Some(name) = string_field(tag, "name") {
                let name = name.trim_start_matches('#').to_string();
                if !name.is_empty() && !post.category.contains(&name) {
                    post.category.push(name);
                }
            }
        }

        for attachment in as_list(object.get("attachment")) {
            let Some(url) = attachment.get("url").and_then(link_of) else {
                continue;
            };
            let media_type = string_field(attachment, "mediaType").unwrap_or_default();
            let family = media_type
                .split('/')
                .next()
                .map(str::to_string)
                .or_else(|| string_field(attachment, "type").map(|t| t.to_ascii_lowercase()));
            let slot = match family.as_deref() {
                Some("image") => &mut post.photo,
                Some("video") => &mut post.video,
                Some("audio") => &mut post.audio,
                _ => continue,
            };
            if !slot.contains(&url) {
                slot.push(url);
            }
        }

        let mut refs = Refs::new();
        if let Some(reply_to) = object.get("inReplyTo").and_then(link_of) {
            if resolve_refs {
                self.resolve_into(&reply_to, &mut refs).await;
            }
            post.in_reply_to.push(reply_to);
        }
        post.refs = refs;

        post.author = match object.get("attributedTo") {
            Some(actor) => self.actor_card(actor).await,
            None => None,
        };
        post
    }

    async fn activity(&self, activity: &Value, kind: &str, resolve_refs: bool) -> Option<Entry> {
        let target = activity.get("object")?;
        let target_url = link_of(target)?;

        let mut post = Post {
            uid: string_field(activity, "id"),
            url: activity.get("url").and_then(link_of).or_else(|| string_field(activity, "id")),
            published: string_field(activity, "published"),
            ..Post::default()
        };
        if kind == "Announce" {
            post.repost_of.push(target_url.clone());
        } else {
            post.like_of.push(target_url.clone());
        }

        if resolve_refs {
            match target {
                Value::Object(_) => {
                    if let Some(entry) = self.convert(target, false).await {
                        post.refs.insert(target_url, entry);
                    }
                }
                _ => self.resolve_into(&target_url, &mut post.refs).await,
            }
        }

        post.author = match activity.get("actor") {
            Some(actor) => self.actor_card(actor).await,
            None => None,
        };
        Some(Entry::Entry(post))
    }

    async fn event(&self, object: &Value) -> Event {
        let options = self.sanitize_options();
        let mut event = Event {
            name: string_field(object, "name"),
            summary: string_field(object, "summary").map(|summary| strip(&summary)),
            published: string_field(object, "published"),
            start: string_field(object, "startTime"),
            end: string_field(object, "endTime"),
            url: object.get("url").and_then(link_of).or_else(|| string_field(object, "id")),
            content: string_field(object, "content")
                .and_then(|html| markup_value(&html, true, &options)),
            ..Event::default()
        };
        if let Some(location) = object.get("location") {
            let place = string_field(location, "name").or_else(|| link_of(location));
            event.location.extend(place);
        }
        event.author = match object.get("attributedTo") {
            Some(actor) => self.actor_card(actor).await,
            None => None,
        };
        event
    }

    /// Author card for an `attributedTo` or `actor` value, fetching the actor
    /// when only its URL is given.
    async fn actor_card(&self, actor: &Value) -> Option<Card> {
        let actor = match actor {
            Value::Array(actors) => actors.first()?,
            other => other,
        };
        let resolved = self.dereference(actor).await;
        match resolved {
            Some(document) => {
                let card = card_from_actor(&document);
                card.is_usable().then_some(card)
            }
            None => link_of(actor).map(Card::from_url),
        }
    }

    async fn resolve_into(&self, url: &str, refs: &mut Refs) {
        let Some(document) = self.resolver.resolve(url).await else {
            engine_debug!("{url}: referenced object unavailable");
            return;
        };
        if let Some(entry) = self.convert(&document, false).await {
            refs.insert(url.to_string(), entry);
        }
    }

    /// Inline objects are used as they are; bare URLs are fetched.
    async fn dereference(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Object(_) => Some(value.clone()),
            Value::String(url) if is_http_url(url) => self.resolver.resolve(url).await,
            _ => None,
        }
    }

    fn sanitize_options(&self) -> SanitizeOptions<'_> {
        SanitizeOptions {
            allow_images: true,
            allow_iframe_video: self.allow_iframe_video,
            base_url: self.base.as_ref(),
        }
    }
}

fn card_from_actor(actor: &Value) -> Card {
    let nickname = string_field(actor, "preferredUsername");
    Card {
        name: string_field(actor, "name").or_else(|| nickname.clone()),
        nickname,
        url: actor.get("url").and_then(link_of).or_else(|| string_field(actor, "id")),
        photo: actor.get("icon").and_then(link_of),
        note: string_field(actor, "summary")
            .map(|summary| strip(&summary))
            .filter(|note| !note.is_empty()),
        ..Card::default()
    }
}

fn string_field(object: &Value, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// A URL from a string, a link object (`href`, `url`, `id`) or a list of
/// either.
fn link_of(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.trim().to_string()).filter(|url| is_http_url(url)),
        Value::Array(values) => values.iter().find_map(link_of),
        Value::Object(_) => ["href", "url", "id"]
            .iter()
            .find_map(|key| value.get(*key).and_then(link_of)),
        _ => None,
    }
}

fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(values)) => values.iter().collect(),
        Some(other) => vec![other],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NoResolver;

    #[async_trait::async_trait]
    impl ObjectResolver for NoResolver {
        async fn resolve(&self, _url: &str) -> Option<Value> {
            None
        }
    }

    #[test]
    fn context_detection_accepts_string_or_list() {
        assert!(is_activity_streams(&json!({"@context": AS_CONTEXT})));
        assert!(is_activity_streams(
            &json!({"@context": [AS_CONTEXT, {"sensitive": "as:sensitive"}]})
        ));
        assert!(!is_activity_streams(&json!({"items": []})));
    }

    #[tokio::test]
    async fn inline_note_with_inline_actor() {
        let document = json!({
            "@context": AS_CONTEXT,
            "type": "Note",
            "id": "https://social.example/notes/1",
            "url": "https://social.example/@ann/1",
            "content": "<p>Hello <a href=\"https://social.example/tags/rust\">#rust</a></p>",
            "tag": [{"type": "Hashtag", "name": "#rust"}, {"type": "Mention", "name": "@bob"}],
            "attachment": [{"type": "Document", "mediaType": "image/png", "url": "https://social.example/a.png"}],
            "attributedTo": {"type": "Person", "id": "https://social.example/@ann", "preferredUsername": "ann"}
        });
        let parser = ActivityParser::new(&NoResolver, "https://social.example/notes/1", false);

        let Some(Entry::Entry(post)) = parser.parse(&document).await else {
            panic!("expected an entry");
        };
        assert_eq!(post.url.as_deref(), Some("https://social.example/@ann/1"));
        assert_eq!(post.category, vec!["rust".to_string()]);
        assert_eq!(post.photo, vec!["https://social.example/a.png".to_string()]);
        assert_eq!(post.content.as_ref().map(|c| c.text.as_str()), Some("Hello #rust"));
        let author = post.author.unwrap();
        assert_eq!(author.name.as_deref(), Some("ann"));
        assert_eq!(author.url.as_deref(), Some("https://social.example/@ann"));
    }

    #[tokio::test]
    async fn unreachable_actor_becomes_url_card() {
        let document = json!({
            "@context": AS_CONTEXT,
            "type": "Announce",
            "id": "https://social.example/boosts/1",
            "actor": "https://social.example/@ann",
            "object": "https://other.example/notes/9"
        });
        let parser = ActivityParser::new(&NoResolver, "https://social.example/boosts/1", false);

        let Some(Entry::Entry(post)) = parser.parse(&document).await else {
            panic!("expected an entry");
        };
        assert_eq!(post.repost_of, vec!["https://other.example/notes/9".to_string()]);
        assert!(post.refs.is_empty());
        assert_eq!(post.author, Some(Card::from_url("https://social.example/@ann")));
    }
}
