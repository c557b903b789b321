//! Canonical entry: the normalized output shape shared by every source format.
//!
//! Array fields are skipped when empty so that an absent key always means
//! "nothing qualifying was found".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::post_type::PostType;
use crate::tree::ItemKind;

/// Nested objects resolved while extracting a parent, keyed by absolute URL.
pub type Refs = BTreeMap<String, Entry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Entry(Post),
    Event(Event),
    Card(Card),
    Feed(Feed),
    Review(Review),
    Recipe(Recipe),
    Product(Product),
    Item(ItemEntry),
    Repo(Repo),
    Unknown,
}

/// Text with an optional sanitized HTML rendition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlValue {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Post {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsvp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<HtmlValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub video: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub syndication: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invitee: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub in_reply_to: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub like_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repost_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bookmark_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quotation_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub follow_of: Vec<String>,
    #[serde(with = "tagged_card", skip_serializing_if = "Option::is_none")]
    pub checkin: Option<Card>,
    #[serde(with = "tagged_card", skip_serializing_if = "Option::is_none")]
    pub author: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: Refs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attendee: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invitee: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<HtmlValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<HtmlValue>,
    #[serde(with = "tagged_card", skip_serializing_if = "Option::is_none")]
    pub author: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: Refs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Review {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<HtmlValue>,
    #[serde(with = "tagged_card", skip_serializing_if = "Option::is_none")]
    pub author: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: Refs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Recipe {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(rename = "yield", skip_serializing_if = "Option::is_none")]
    pub yield_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingredient: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<HtmlValue>,
    #[serde(with = "tagged_card", skip_serializing_if = "Option::is_none")]
    pub author: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<PostType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: Refs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub brand: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<HtmlValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: Refs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<String>,
}

/// Identity record for a person, organization or place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(with = "tagged_card", skip_serializing_if = "Option::is_none")]
    pub author: Option<Card>,
    pub items: Vec<Entry>,
}

/// Source-code repository, produced by site adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(with = "tagged_card", skip_serializing_if = "Option::is_none")]
    pub author: Option<Card>,
}

impl Card {
    /// A card needs at least one of name, url or photo to identify anyone.
    pub fn is_usable(&self) -> bool {
        self.name.is_some() || self.url.is_some() || self.photo.is_some()
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Entry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Entry::Entry(_) => "entry",
            Entry::Event(_) => "event",
            Entry::Card(_) => "card",
            Entry::Feed(_) => "feed",
            Entry::Review(_) => "review",
            Entry::Recipe(_) => "recipe",
            Entry::Product(_) => "product",
            Entry::Item(_) => "item",
            Entry::Repo(_) => "repo",
            Entry::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Entry::Unknown)
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Entry::Entry(post) => post.url.as_deref(),
            Entry::Event(event) => event.url.as_deref(),
            Entry::Card(card) => card.url.as_deref(),
            Entry::Feed(feed) => feed.url.as_deref(),
            Entry::Review(review) => review.url.as_deref(),
            Entry::Recipe(recipe) => recipe.url.as_deref(),
            Entry::Product(product) => product.url.as_deref(),
            Entry::Item(item) => item.url.as_deref(),
            Entry::Repo(repo) => repo.url.as_deref(),
            Entry::Unknown => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Entry::Entry(post) => post.name.as_deref(),
            Entry::Event(event) => event.name.as_deref(),
            Entry::Card(card) => card.name.as_deref(),
            Entry::Feed(feed) => feed.name.as_deref(),
            Entry::Review(review) => review.name.as_deref(),
            Entry::Recipe(recipe) => recipe.name.as_deref(),
            Entry::Product(product) => product.name.as_deref(),
            Entry::Item(item) => item.name.as_deref(),
            Entry::Repo(repo) => repo.name.as_deref(),
            Entry::Unknown => None,
        }
    }

    pub fn refs(&self) -> Option<&Refs> {
        match self {
            Entry::Entry(post) => Some(&post.refs),
            Entry::Event(event) => Some(&event.refs),
            Entry::Review(review) => Some(&review.refs),
            Entry::Recipe(recipe) => Some(&recipe.refs),
            Entry::Product(product) => Some(&product.refs),
            _ => None,
        }
    }

    /// The entry without its nested refs, as embedded in a feed.
    pub fn without_refs(mut self) -> Self {
        match &mut self {
            Entry::Entry(post) => post.refs.clear(),
            Entry::Event(event) => event.refs.clear(),
            Entry::Review(review) => review.refs.clear(),
            Entry::Recipe(recipe) => recipe.refs.clear(),
            Entry::Product(product) => product.refs.clear(),
            _ => {}
        }
        self
    }

    /// URL-only placeholder for an object that is already being resolved.
    pub fn stub(kind: ItemKind, url: &str) -> Self {
        let url = Some(url.to_string());
        match kind {
            ItemKind::Entry => Entry::Entry(Post {
                url,
                ..Post::default()
            }),
            ItemKind::Event => Entry::Event(Event {
                url,
                ..Event::default()
            }),
            ItemKind::Review => Entry::Review(Review {
                url,
                ..Review::default()
            }),
            ItemKind::Recipe => Entry::Recipe(Recipe {
                url,
                ..Recipe::default()
            }),
            ItemKind::Product => Entry::Product(Product {
                url,
                ..Product::default()
            }),
            ItemKind::Item => Entry::Item(ItemEntry {
                url,
                ..ItemEntry::default()
            }),
            ItemKind::Card => Entry::Card(Card {
                url,
                ..Card::default()
            }),
            ItemKind::Feed => Entry::Feed(Feed {
                url,
                ..Feed::default()
            }),
        }
    }

    pub fn post_type(&self) -> Option<PostType> {
        match self {
            Entry::Entry(post) => post.post_type,
            Entry::Event(event) => event.post_type,
            Entry::Review(review) => review.post_type,
            Entry::Recipe(recipe) => recipe.post_type,
            _ => None,
        }
    }
}

/// Serializes an embedded card with its `"type": "card"` tag.
mod tagged_card {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Card, Entry};

    #[derive(Serialize)]
    struct TaggedCard<'a> {
        #[serde(rename = "type")]
        kind: &'static str,
        #[serde(flatten)]
        card: &'a Card,
    }

    pub fn serialize<S: Serializer>(card: &Option<Card>, serializer: S) -> Result<S::Ok, S::Error> {
        match card {
            Some(card) => TaggedCard { kind: "card", card }.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Card>, D::Error> {
        Ok(match Option::<Entry>::deserialize(deserializer)? {
            Some(Entry::Card(card)) => Some(card),
            _ => None,
        })
    }
}
