use crate::entry::{Event, ItemEntry, Post, Product, Recipe, Refs, Review};
use crate::tree::Item;

use super::fields::{dedupe_name, embedded_card, html_value, single_url, ArrayMode};
use super::{Normalizer, Page, ResolveContext};

const ENTRY_URL_ARRAYS: &[&str] = &[
    "photo",
    "video",
    "audio",
    "syndication",
    "in-reply-to",
    "like-of",
    "repost-of",
    "bookmark-of",
    "quotation-of",
    "follow-of",
];

impl Normalizer<'_> {
    pub(super) async fn extract_entry(
        &self,
        item: &Item,
        page: &Page<'_>,
        ctx: &ResolveContext,
    ) -> Post {
        let mut refs = Refs::new();
        let content = html_value(item, "content", &self.sanitize_options(page));

        let mut post = Post {
            name: dedupe_name(item.plaintext("name"), content.as_ref()),
            published: item.plaintext("published"),
            updated: item.plaintext("updated"),
            url: single_url(item, "url"),
            uid: item.plaintext("uid"),
            summary: item.plaintext("summary"),
            rsvp: item.plaintext("rsvp").map(|rsvp| rsvp.to_ascii_lowercase()),
            content,
            checkin: embedded_card(item, "checkin"),
            ..Post::default()
        };

        post.category = self
            .collect_array(item, "category", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        post.invitee = self
            .collect_array(item, "invitee", ArrayMode::Plaintext, ctx, &mut refs)
            .await;

        for property in ENTRY_URL_ARRAYS {
            let values = self
                .collect_array(item, property, ArrayMode::Urls, ctx, &mut refs)
                .await;
            let slot = match *property {
                "photo" => &mut post.photo,
                "video" => &mut post.video,
                "audio" => &mut post.audio,
                "syndication" => &mut post.syndication,
                "in-reply-to" => &mut post.in_reply_to,
                "like-of" => &mut post.like_of,
                "repost-of" => &mut post.repost_of,
                "bookmark-of" => &mut post.bookmark_of,
                "quotation-of" => &mut post.quotation_of,
                _ => &mut post.follow_of,
            };
            *slot = values;
        }

        post.author = self.find_author(item, page).await;
        post.refs = refs;
        post
    }

    pub(super) async fn extract_event(
        &self,
        item: &Item,
        page: &Page<'_>,
        ctx: &ResolveContext,
    ) -> Event {
        let mut refs = Refs::new();
        let sanitize = self.sanitize_options(page);
        let content = html_value(item, "content", &sanitize);

        let mut event = Event {
            name: dedupe_name(item.plaintext("name"), content.as_ref()),
            summary: item.plaintext("summary"),
            published: item.plaintext("published"),
            start: item.plaintext("start"),
            end: item.plaintext("end"),
            duration: item.plaintext("duration"),
            url: single_url(item, "url"),
            description: html_value(item, "description", &sanitize),
            content,
            ..Event::default()
        };

        event.location = self
            .collect_array(item, "location", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        event.category = self
            .collect_array(item, "category", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        event.attendee = self
            .collect_array(item, "attendee", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        event.invitee = self
            .collect_array(item, "invitee", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        event.photo = self
            .collect_array(item, "photo", ArrayMode::Urls, ctx, &mut refs)
            .await;

        event.author = self.find_author(item, page).await;
        event.refs = refs;
        event
    }

    pub(super) async fn extract_review(
        &self,
        item: &Item,
        page: &Page<'_>,
        ctx: &ResolveContext,
    ) -> Review {
        let mut refs = Refs::new();
        let content = html_value(item, "content", &self.sanitize_options(page));

        let mut review = Review {
            name: dedupe_name(item.plaintext("name"), content.as_ref()),
            published: item.plaintext("published"),
            rating: item.plaintext("rating"),
            best: item.plaintext("best"),
            worst: item.plaintext("worst"),
            url: single_url(item, "url"),
            content,
            ..Review::default()
        };

        review.category = self
            .collect_array(item, "category", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        review.item = self
            .collect_array(item, "item", ArrayMode::Urls, ctx, &mut refs)
            .await;

        review.author = self.find_author(item, page).await;
        review.refs = refs;
        review
    }

    pub(super) async fn extract_recipe(
        &self,
        item: &Item,
        page: &Page<'_>,
        ctx: &ResolveContext,
    ) -> Recipe {
        let mut refs = Refs::new();

        let mut recipe = Recipe {
            name: item.plaintext("name"),
            summary: item.plaintext("summary"),
            published: item.plaintext("published"),
            yield_: item.plaintext("yield"),
            duration: item.plaintext("duration"),
            url: single_url(item, "url"),
            instructions: html_value(item, "instructions", &self.sanitize_options(page)),
            ..Recipe::default()
        };

        recipe.ingredient = self
            .collect_array(item, "ingredient", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        recipe.category = self
            .collect_array(item, "category", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        recipe.photo = self
            .collect_array(item, "photo", ArrayMode::Urls, ctx, &mut refs)
            .await;

        recipe.author = self.find_author(item, page).await;
        recipe.refs = refs;
        recipe
    }

    pub(super) async fn extract_product(
        &self,
        item: &Item,
        page: &Page<'_>,
        ctx: &ResolveContext,
    ) -> Product {
        let mut refs = Refs::new();

        let mut product = Product {
            name: item.plaintext("name"),
            identifier: item.plaintext("identifier"),
            price: item.plaintext("price"),
            url: single_url(item, "url"),
            description: html_value(item, "description", &self.sanitize_options(page)),
            ..Product::default()
        };

        product.category = self
            .collect_array(item, "category", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        product.brand = self
            .collect_array(item, "brand", ArrayMode::Plaintext, ctx, &mut refs)
            .await;
        product.photo = self
            .collect_array(item, "photo", ArrayMode::Urls, ctx, &mut refs)
            .await;

        product.refs = refs;
        product
    }
}

pub(super) fn extract_item(item: &Item) -> ItemEntry {
    let mut photo: Vec<String> = Vec::new();
    for url in item.plaintexts("photo") {
        if crate::urls::is_http_url(&url) && !photo.contains(&url) {
            photo.push(url);
        }
    }
    ItemEntry {
        name: item.plaintext("name"),
        url: single_url(item, "url"),
        photo,
    }
}
