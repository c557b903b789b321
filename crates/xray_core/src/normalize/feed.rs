use std::collections::VecDeque;

use crate::entry::{Entry, Feed};
use crate::tree::{Item, ItemKind};

use super::fields::{parse_card, single_url};
use super::{Normalizer, Page, ResolveContext};

impl Normalizer<'_> {
    /// Flattens the page into a feed. The root is `root` when given, else the
    /// first `h-feed` found breadth-first, else a leading `h-card`, else a
    /// synthetic root over every top-level item that is neither card nor feed.
    pub(super) async fn flatten_feed(
        &self,
        page: &Page<'_>,
        ctx: &ResolveContext,
        root: Option<&Item>,
    ) -> Option<Entry> {
        let items = &page.tree.items;
        let mut feed = Feed::default();

        let children: Vec<&Item> = match root.or_else(|| find_feed_breadth_first(items)) {
            Some(root) => {
                feed.name = root.plaintext("name");
                feed.url = single_url(root, "url");
                root.children.iter().collect()
            }
            None => match items.first().filter(|item| item.has_type("h-card")) {
                Some(card) => {
                    let author = parse_card(card, None);
                    feed.author = author.is_usable().then_some(author);
                    if card.children.is_empty() {
                        items
                            .iter()
                            .skip(1)
                            .filter(|item| !item.has_type("h-card"))
                            .collect()
                    } else {
                        card.children.iter().collect()
                    }
                }
                None => items
                    .iter()
                    .filter(|item| !matches!(item.kind(), Some(ItemKind::Card | ItemKind::Feed)))
                    .collect(),
            },
        };

        for child in children {
            let Some(kind) = child.kind().filter(|kind| *kind != ItemKind::Feed) else {
                continue;
            };
            if let Some(entry) = self.classify_item(child, kind, page, ctx).await {
                feed.items.push(entry.without_refs());
            }
        }

        Some(Entry::Feed(feed))
    }
}

fn find_feed_breadth_first(items: &[Item]) -> Option<&Item> {
    let mut queue: VecDeque<&Item> = items.iter().collect();
    while let Some(item) = queue.pop_front() {
        if item.has_type("h-feed") {
            return Some(item);
        }
        queue.extend(item.children.iter());
    }
    None
}
