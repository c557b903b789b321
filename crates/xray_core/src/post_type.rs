//! Post type discovery on a finished entry.

use serde::{Deserialize, Serialize};

use crate::entry::{Entry, Post};
use crate::text::collapse_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Note,
    Article,
    Reply,
    Like,
    Repost,
    Bookmark,
    Follow,
    Rsvp,
    Checkin,
    Photo,
    Video,
    Audio,
    Event,
    Recipe,
    Review,
}

/// Derives the post type. Structural kinds pass through; kinds without a
/// post type (cards, feeds, products) yield `None`.
pub fn discover(entry: &Entry) -> Option<PostType> {
    match entry {
        Entry::Event(_) => Some(PostType::Event),
        Entry::Recipe(_) => Some(PostType::Recipe),
        Entry::Review(_) => Some(PostType::Review),
        Entry::Entry(post) => Some(discover_post(post)),
        _ => None,
    }
}

fn discover_post(post: &Post) -> PostType {
    let checks: [(bool, PostType); 10] = [
        (post.rsvp.is_some(), PostType::Rsvp),
        (!post.repost_of.is_empty(), PostType::Repost),
        (!post.like_of.is_empty(), PostType::Like),
        (!post.in_reply_to.is_empty(), PostType::Reply),
        (!post.bookmark_of.is_empty(), PostType::Bookmark),
        (!post.follow_of.is_empty(), PostType::Follow),
        (post.checkin.is_some(), PostType::Checkin),
        (!post.video.is_empty(), PostType::Video),
        (!post.audio.is_empty(), PostType::Audio),
        (!post.photo.is_empty(), PostType::Photo),
    ];
    if let Some((_, post_type)) = checks.into_iter().find(|(present, _)| *present) {
        return post_type;
    }

    let name = match post.name.as_deref().map(collapse_whitespace) {
        Some(name) if !name.is_empty() => name,
        _ => return PostType::Note,
    };
    let body = post
        .content
        .as_ref()
        .map(|content| content.text.as_str())
        .or(post.summary.as_deref())
        .map(collapse_whitespace)
        .unwrap_or_default();

    if body.starts_with(&name) {
        PostType::Note
    } else {
        PostType::Article
    }
}

/// Stores the discovered post type on the entry and, for feeds, on each item.
pub fn apply(entry: &mut Entry) {
    if let Entry::Feed(feed) = entry {
        for item in &mut feed.items {
            apply(item);
        }
        return;
    }
    let post_type = discover(entry);
    match entry {
        Entry::Entry(post) => post.post_type = post_type,
        Entry::Event(event) => event.post_type = post_type,
        Entry::Review(review) => review.post_type = post_type,
        Entry::Recipe(recipe) => recipe.post_type = post_type,
        _ => {}
    }
}
