//! Normalization engine: picks the main object of an object tree and turns it
//! into a canonical [`Entry`].
//!
//! Classification precedence, first match wins:
//! 1. the caller forces a feed,
//! 2. the tree holds exactly one recognized item,
//! 3. an item's `url` matches the page URL (permalink),
//! 4. the page has `rel=author` and a matching card: first non-card item,
//! 5. more than one entry-like item: the page is a feed,
//! 6. the first item is a feed,
//! 7. the first entry-like item in document order.

mod author;
mod feed;
mod fields;
mod kinds;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use engine_logging::engine_debug;
use futures_util::future::{BoxFuture, FutureExt};
use url::Url;

use crate::entry::{Card, Entry};
use crate::loader::PageLoader;
use crate::post_type;
use crate::sanitize::SanitizeOptions;
use crate::tree::{Item, ItemKind, ObjectTree};
use crate::urls::{contains_url, intersects, normalize_url};

pub use fields::parse_card;

/// Nested objects deeper than this are kept as URL-only stubs.
const MAX_REF_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Interpret the page as a feed regardless of its content.
    pub expect_feed: bool,
    /// Keep embedded YouTube/Vimeo iframes in sanitized HTML.
    pub allow_iframe_video: bool,
}

/// A tree together with the URL it was read from.
pub struct Page<'t> {
    pub tree: &'t ObjectTree,
    pub url: &'t str,
    base: Option<Url>,
}

impl<'t> Page<'t> {
    pub fn new(tree: &'t ObjectTree, url: &'t str) -> Self {
        Self {
            tree,
            url,
            base: Url::parse(url).ok(),
        }
    }
}

/// URLs currently being resolved on the way down from the top-level page.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    resolving: Vec<String>,
}

impl ResolveContext {
    pub fn root(url: &str) -> Self {
        Self {
            resolving: vec![normalize_url(url)],
        }
    }

    pub fn depth(&self) -> usize {
        self.resolving.len() - 1
    }

    /// Context for resolving `url` one level down, or `None` on a cycle or
    /// when the depth limit is reached.
    pub fn descend(&self, url: &str) -> Option<Self> {
        let url = normalize_url(url);
        if self.resolving.contains(&url) || self.depth() >= MAX_REF_DEPTH {
            return None;
        }
        let mut resolving = self.resolving.clone();
        resolving.push(url);
        Some(Self { resolving })
    }
}

pub struct Normalizer<'a> {
    loader: &'a dyn PageLoader,
    options: NormalizeOptions,
    pages: Mutex<HashMap<String, Option<ObjectTree>>>,
}

impl<'a> Normalizer<'a> {
    pub fn new(loader: &'a dyn PageLoader, options: NormalizeOptions) -> Self {
        Self {
            loader,
            options,
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Classifies `tree` fetched from `url`. `None` means no recognizable
    /// object, which callers report as `unknown`.
    pub async fn normalize(&self, tree: &ObjectTree, url: &str) -> Option<Entry> {
        let page = Page::new(tree, url);
        let ctx = ResolveContext::root(url);
        let mut entry = self.classify_tree(&page, &ctx).await?;
        post_type::apply(&mut entry);
        Some(entry)
    }

    fn classify_tree<'s>(
        &'s self,
        page: &'s Page<'_>,
        ctx: &'s ResolveContext,
    ) -> BoxFuture<'s, Option<Entry>> {
        async move {
            let items = &page.tree.items;

            if self.options.expect_feed && ctx.depth() == 0 {
                return self.flatten_feed(page, ctx, None).await;
            }

            if let [only] = items.as_slice() {
                if let Some(kind) = only.kind() {
                    return self.classify_item(only, kind, page, ctx).await;
                }
            }

            let permalink = items.iter().find_map(|item| {
                let kind = item.kind()?;
                contains_url(&item.plaintexts("url"), page.url).then_some((item, kind))
            });
            if let Some((item, kind)) = permalink {
                engine_debug!("{}: permalink match on {:?}", page.url, kind);
                return self.classify_item(item, kind, page, ctx).await;
            }

            let rel_authors = page.tree.rel("author");
            let author_card_present = !rel_authors.is_empty()
                && items.iter().any(|item| {
                    item.has_type("h-card") && intersects(&item.plaintexts("url"), rel_authors)
                });
            if author_card_present {
                let work = page.tree.walk().into_iter().find_map(|item| {
                    let kind = item.kind()?;
                    (kind != ItemKind::Card).then_some((item, kind))
                });
                if let Some((item, kind)) = work {
                    return self.classify_item(item, kind, page, ctx).await;
                }
            }

            let entry_like = page
                .tree
                .walk()
                .into_iter()
                .filter(|item| item.kind().is_some_and(ItemKind::is_entry_like))
                .count();
            if entry_like > 1 {
                return self.flatten_feed(page, ctx, None).await;
            }

            if let Some(first) = items.first().filter(|item| item.has_type("h-feed")) {
                return self.flatten_feed(page, ctx, Some(first)).await;
            }

            let fallback = page.tree.walk().into_iter().find_map(|item| {
                let kind = item.kind().filter(|kind| kind.is_entry_like())?;
                Some((item, kind))
            });
            match fallback {
                Some((item, kind)) => self.classify_item(item, kind, page, ctx).await,
                None => None,
            }
        }
        .boxed()
    }

    fn classify_item<'s>(
        &'s self,
        item: &'s Item,
        kind: ItemKind,
        page: &'s Page<'_>,
        ctx: &'s ResolveContext,
    ) -> BoxFuture<'s, Option<Entry>> {
        async move {
            match kind {
                ItemKind::Entry => Some(Entry::Entry(self.extract_entry(item, page, ctx).await)),
                ItemKind::Event => Some(Entry::Event(self.extract_event(item, page, ctx).await)),
                ItemKind::Review => Some(Entry::Review(self.extract_review(item, page, ctx).await)),
                ItemKind::Recipe => Some(Entry::Recipe(self.extract_recipe(item, page, ctx).await)),
                ItemKind::Product => {
                    Some(Entry::Product(self.extract_product(item, page, ctx).await))
                }
                ItemKind::Item => Some(Entry::Item(kinds::extract_item(item))),
                ItemKind::Card => {
                    let card: Card = parse_card(item, Some(page.url));
                    card.is_usable().then_some(Entry::Card(card))
                }
                ItemKind::Feed => self.flatten_feed(page, ctx, Some(item)).await,
            }
        }
        .boxed()
    }

    /// Classifies a nested object on its own, stubbing it when it is already
    /// being resolved further up.
    async fn resolve_ref(&self, nested: &Item, url: &str, ctx: &ResolveContext) -> Option<Entry> {
        let kind = nested.kind()?;
        let Some(child_ctx) = ctx.descend(url) else {
            engine_debug!("{url}: already being resolved, keeping a stub");
            return Some(Entry::stub(kind, url));
        };
        let sub_tree = ObjectTree::from_items(vec![nested.clone()]);
        let sub_page = Page::new(&sub_tree, url);
        self.classify_tree(&sub_page, &child_ctx).await
    }

    fn sanitize_options<'p>(&self, page: &'p Page<'_>) -> SanitizeOptions<'p> {
        SanitizeOptions {
            allow_images: true,
            allow_iframe_video: self.options.allow_iframe_video,
            base_url: page.base.as_ref(),
        }
    }

    fn lock_pages(&self) -> MutexGuard<'_, HashMap<String, Option<ObjectTree>>> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads a secondary page once per normalization call.
    async fn load_page(&self, url: &str) -> Option<ObjectTree> {
        let key = normalize_url(url);
        let cached = self.lock_pages().get(&key).cloned();
        if let Some(cached) = cached {
            return cached;
        }
        let loaded = self.loader.load(url).await;
        if loaded.is_none() {
            engine_debug!("{url}: secondary page unavailable");
        }
        self.lock_pages().insert(key, loaded.clone());
        loaded
    }
}
