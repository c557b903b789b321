//! Generic object tree: the microformats2 view of a document.
//!
//! The serde shape matches microformats2 JSON so a tree can be read from an
//! `application/mf2+json` body or produced by the HTML parser and written
//! back out unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTree {
    pub items: Vec<Item>,
    #[serde(default)]
    pub rels: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "rel-urls")]
    pub rel_urls: BTreeMap<String, RelUrl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelUrl {
    #[serde(default)]
    pub rels: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub types: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Item>,
    /// Plain value of an item that is nested as a property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Markup of an item nested as an `e-*` property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A single property value.
///
/// Variant order matters for deserialization: an object carrying `type` is an
/// item, one carrying `html` is rich text, one carrying only `value` (an
/// image with `alt`, for instance) is plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Item(Item),
    Rich(RichText),
    Plain(PlainValue),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub value: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Kinds of objects the normalization engine knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Entry,
    Event,
    Review,
    Recipe,
    Product,
    Item,
    Card,
    Feed,
}

impl ItemKind {
    pub fn from_type(label: &str) -> Option<Self> {
        match label {
            "h-entry" | "h-cite" => Some(ItemKind::Entry),
            "h-event" => Some(ItemKind::Event),
            "h-review" => Some(ItemKind::Review),
            "h-recipe" => Some(ItemKind::Recipe),
            "h-product" => Some(ItemKind::Product),
            "h-item" => Some(ItemKind::Item),
            "h-card" => Some(ItemKind::Card),
            "h-feed" => Some(ItemKind::Feed),
            _ => None,
        }
    }

    /// Entry-like kinds are the ones a page can be "about".
    pub fn is_entry_like(self) -> bool {
        !matches!(self, ItemKind::Card | ItemKind::Feed)
    }
}

impl PropertyValue {
    /// Plaintext form of the value; nested items contribute their `value`.
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            PropertyValue::Plain(plain) => Some(&plain.value),
            PropertyValue::Rich(rich) => Some(&rich.value),
            PropertyValue::Item(item) => item.value.as_deref(),
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            PropertyValue::Item(item) => Some(item),
            _ => None,
        }
    }
}

impl Item {
    pub fn new(types: &[&str]) -> Self {
        Self {
            types: types.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Builder-style helper used by adapters and tests.
    pub fn with(mut self, property: &str, value: PropertyValue) -> Self {
        self.properties
            .entry(property.to_string())
            .or_default()
            .push(value);
        self
    }

    pub fn with_text(self, property: &str, value: &str) -> Self {
        self.with(property, PropertyValue::Text(value.to_string()))
    }

    pub fn kind(&self) -> Option<ItemKind> {
        self.types.iter().find_map(|t| ItemKind::from_type(t))
    }

    pub fn has_type(&self, label: &str) -> bool {
        self.types.iter().any(|t| t == label)
    }

    pub fn values(&self, property: &str) -> &[PropertyValue] {
        self.properties
            .get(property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_property(&self, property: &str) -> bool {
        !self.values(property).is_empty()
    }

    /// First plaintext value of a property, trimmed, empty strings skipped.
    pub fn plaintext(&self, property: &str) -> Option<String> {
        self.values(property)
            .iter()
            .filter_map(PropertyValue::plaintext)
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Every plaintext value of a property, in document order.
    pub fn plaintexts(&self, property: &str) -> Vec<String> {
        self.values(property)
            .iter()
            .filter_map(PropertyValue::plaintext)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }
}

impl ObjectTree {
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn rel(&self, rel: &str) -> &[String] {
        self.rels.get(rel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Depth-first walk over items and their children, in document order.
    pub fn walk(&self) -> Vec<&Item> {
        let mut out = Vec::new();
        for item in &self.items {
            collect_depth_first(item, &mut out);
        }
        out
    }
}

/// Splits a microformats class (`p-name`, `dt-published`, `h-entry`) into
/// its prefix and name. Anything else yields `None`.
pub fn split_microformat_class(class: &str) -> Option<(&str, &str)> {
    let (prefix, name) = class.split_once('-')?;
    if !matches!(prefix, "h" | "p" | "u" | "dt" | "e") || name.is_empty() {
        return None;
    }
    let valid = name
        .split('-')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    valid.then_some((prefix, name))
}

fn collect_depth_first<'a>(item: &'a Item, out: &mut Vec<&'a Item>) {
    out.push(item);
    for child in &item.children {
        collect_depth_first(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_all_value_shapes() {
        let json = r#"{
            "items": [{
                "type": ["h-entry"],
                "properties": {
                    "name": ["Hello"],
                    "content": [{"value": "Hi", "html": "<b>Hi</b>"}],
                    "photo": [{"value": "https://a.example/p.jpg", "alt": "a cat"}],
                    "author": [{"type": ["h-card"], "properties": {"name": ["Ann"]}, "value": "Ann"}]
                }
            }],
            "rels": {"me": ["https://a.example/"]}
        }"#;
        let tree: ObjectTree = serde_json::from_str(json).unwrap();
        let item = &tree.items[0];
        assert_eq!(item.kind(), Some(ItemKind::Entry));
        assert!(matches!(item.values("content")[0], PropertyValue::Rich(_)));
        assert!(matches!(item.values("photo")[0], PropertyValue::Plain(_)));
        assert!(matches!(item.values("author")[0], PropertyValue::Item(_)));
        assert_eq!(item.plaintext("author").as_deref(), Some("Ann"));
        assert_eq!(tree.rel("me"), ["https://a.example/".to_string()]);
        assert!(tree.rel("author").is_empty());
    }

    #[test]
    fn microformat_classes_are_recognized() {
        assert_eq!(split_microformat_class("dt-published"), Some(("dt", "published")));
        assert_eq!(split_microformat_class("h-x-app"), Some(("h", "x-app")));
        assert_eq!(split_microformat_class("p-"), None);
        assert_eq!(split_microformat_class("entry-title"), None);
        assert_eq!(split_microformat_class("p-Name"), None);
    }
}
