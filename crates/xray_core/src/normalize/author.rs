//! Authorship discovery for entry-like objects.

use engine_logging::engine_debug;

use crate::entry::Card;
use crate::tree::{Item, ObjectTree, PropertyValue};
use crate::urls::{contains_url, intersects, is_http_url};

use super::fields::parse_card;
use super::{Normalizer, Page};

impl Normalizer<'_> {
    /// Finds the author of `item`: an embedded card, a plain name, or a card
    /// discovered on the author page named by the item or by `rel=author`.
    pub(super) async fn find_author(&self, item: &Item, page: &Page<'_>) -> Option<Card> {
        let author_url = match item.values("author").first() {
            Some(PropertyValue::Item(card)) if card.has_type("h-card") => {
                let parsed = parse_card(card, None);
                return parsed.is_usable().then_some(parsed);
            }
            Some(PropertyValue::Item(other)) => {
                return other
                    .value
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(Card::from_name)
                    .or_else(|| other.plaintext("name").map(Card::from_name));
            }
            Some(value) => {
                let text = value.plaintext().map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    return None;
                }
                if !is_http_url(text) {
                    return Some(Card::from_name(text));
                }
                text.to_string()
            }
            None => page.tree.rel("author").first()?.clone(),
        };

        engine_debug!("{}: looking up author page {}", page.url, author_url);
        if let Some(author_page) = self.load_page(&author_url).await {
            if let Some(card) = card_on_author_page(&author_page, &author_url) {
                return Some(card);
            }
        }

        let on_original = page_cards(page.tree)
            .into_iter()
            .find(|card| contains_url(&card.plaintexts("url"), &author_url));
        if let Some(card) = on_original {
            return Some(parse_card(card, Some(&author_url)));
        }

        None
    }
}

/// A card whose `url` and `uid` both name the page, else one whose `url`
/// matches the page's `rel=me` links.
fn card_on_author_page(author_page: &ObjectTree, author_url: &str) -> Option<Card> {
    let cards = || author_page.items.iter().filter(|item| item.has_type("h-card"));

    let representative = cards().find(|card| {
        contains_url(&card.plaintexts("url"), author_url)
            && contains_url(&card.plaintexts("uid"), author_url)
    });
    if let Some(card) = representative {
        return Some(parse_card(card, Some(author_url)));
    }

    let rel_me = author_page.rel("me");
    cards()
        .find(|card| intersects(&card.plaintexts("url"), rel_me))
        .map(|card| parse_card(card, Some(author_url)))
}

/// Every card on the page: top-level and nested items, plus cards embedded
/// as `author` properties.
fn page_cards(tree: &ObjectTree) -> Vec<&Item> {
    let mut cards = Vec::new();
    for item in tree.walk() {
        if item.has_type("h-card") {
            cards.push(item);
        }
        for value in item.values("author") {
            if let Some(card) = value.as_item().filter(|card| card.has_type("h-card")) {
                cards.push(card);
            }
        }
    }
    cards
}
