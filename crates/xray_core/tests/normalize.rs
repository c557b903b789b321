use std::sync::Once;

use pretty_assertions::assert_eq;
use serde_json::json;
use xray_core::{
    Card, Entry, MemoryLoader, NormalizeOptions, Normalizer, ObjectTree, OfflineLoader, PostType,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn tree(value: serde_json::Value) -> ObjectTree {
    serde_json::from_value(value).expect("valid object tree")
}

async fn normalize_offline(tree: &ObjectTree, url: &str) -> Option<Entry> {
    let loader = OfflineLoader;
    let normalizer = Normalizer::new(&loader, NormalizeOptions::default());
    normalizer.normalize(tree, url).await
}

#[tokio::test]
async fn single_card_becomes_card() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-card"],
            "properties": {
                "name": ["Ann Example"],
                "url": ["http://x.example/about"],
                "photo": ["http://x.example/ann.jpg"]
            }
        }]
    }));

    let entry = normalize_offline(&page, "http://x.example/about").await.unwrap();

    assert_eq!(
        serde_json::to_value(&entry).unwrap(),
        json!({
            "type": "card",
            "name": "Ann Example",
            "url": "http://x.example/about",
            "photo": "http://x.example/ann.jpg"
        })
    );
}

#[tokio::test]
async fn two_entries_without_permalink_become_feed_in_order() {
    init_logging();
    let page = tree(json!({
        "items": [
            {"type": ["h-entry"], "properties": {
                "url": ["https://blog.example/1"],
                "content": ["first post"]
            }},
            {"type": ["h-entry"], "properties": {
                "url": ["https://blog.example/2"],
                "content": ["second post"]
            }}
        ]
    }));

    let entry = normalize_offline(&page, "https://blog.example/").await.unwrap();

    let Entry::Feed(feed) = entry else {
        panic!("expected a feed, got {entry:?}");
    };
    let urls: Vec<_> = feed.items.iter().map(|item| item.url()).collect();
    assert_eq!(
        urls,
        vec![Some("https://blog.example/1"), Some("https://blog.example/2")]
    );
    assert!(feed
        .items
        .iter()
        .all(|item| item.post_type() == Some(PostType::Note)));
}

#[tokio::test]
async fn permalink_match_wins_over_feed() {
    init_logging();
    let page = tree(json!({
        "items": [
            {"type": ["h-entry"], "properties": {
                "url": ["https://blog.example/1"], "content": ["one"]
            }},
            {"type": ["h-entry"], "properties": {
                "url": ["https://BLOG.example/2"], "content": ["two"]
            }}
        ]
    }));

    let entry = normalize_offline(&page, "https://blog.example/2").await.unwrap();

    assert_eq!(entry.type_name(), "entry");
    assert_eq!(entry.url(), Some("https://BLOG.example/2"));
}

#[tokio::test]
async fn repost_without_content_omits_content_key() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "url": ["https://me.example/r/1"],
                "repost-of": ["https://them.example/post/9"]
            }
        }]
    }));

    let entry = normalize_offline(&page, "https://me.example/r/1").await.unwrap();
    let value = serde_json::to_value(&entry).unwrap();

    assert_eq!(value["post-type"], json!("repost"));
    assert_eq!(value["repost-of"], json!(["https://them.example/post/9"]));
    assert!(value.get("content").is_none());
    assert!(value.get("photo").is_none());
}

#[tokio::test]
async fn photo_reply_is_classified_as_reply() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "photo": ["https://me.example/cat.jpg"],
                "in-reply-to": ["https://them.example/post/1"],
                "content": ["nice"]
            }
        }]
    }));

    let entry = normalize_offline(&page, "https://me.example/").await.unwrap();

    assert_eq!(entry.post_type(), Some(PostType::Reply));
}

#[tokio::test]
async fn name_repeating_content_is_dropped() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "name": ["Just  setting up my..."],
                "content": [{"value": "Just setting up my blog today", "html": "Just setting up my blog today"}]
            }
        }]
    }));

    let entry = normalize_offline(&page, "https://me.example/").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.name, None);
    let content = post.content.unwrap();
    assert_eq!(content.text, "Just setting up my blog today");
    assert_eq!(content.html, None);
    assert_eq!(post.post_type, Some(PostType::Note));
}

#[tokio::test]
async fn nested_reply_context_is_collected_into_refs() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "url": ["https://me.example/reply"],
                "content": ["agreed"],
                "in-reply-to": [{
                    "type": ["h-cite"],
                    "properties": {
                        "url": ["https://them.example/post"],
                        "name": ["Their post"],
                        "author": ["Bob"]
                    },
                    "value": "https://them.example/post"
                }]
            }
        }]
    }));

    let entry = normalize_offline(&page, "https://me.example/reply").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.in_reply_to, vec!["https://them.example/post".to_string()]);
    let cited = &post.refs["https://them.example/post"];
    assert_eq!(cited.name(), Some("Their post"));
    let Entry::Entry(cited) = cited else {
        panic!("expected the cited post to be an entry");
    };
    assert_eq!(cited.author, Some(Card::from_name("Bob")));
}

#[tokio::test]
async fn self_reference_resolves_to_stub() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "url": ["https://me.example/loop"],
                "content": ["see myself"],
                "in-reply-to": [{
                    "type": ["h-cite"],
                    "properties": {
                        "url": ["https://me.example/loop"],
                        "content": ["should not be expanded"]
                    }
                }]
            }
        }]
    }));

    let entry = normalize_offline(&page, "https://me.example/loop").await.unwrap();
    let refs = entry.refs().unwrap();

    assert_eq!(
        serde_json::to_value(&refs["https://me.example/loop"]).unwrap(),
        json!({"type": "entry", "url": "https://me.example/loop"})
    );
}

#[tokio::test]
async fn author_card_with_url_and_uid_beats_rel_me_card() {
    init_logging();
    let author_page = tree(json!({
        "items": [
            {"type": ["h-card"], "properties": {
                "name": ["Ann Elsewhere"],
                "url": ["https://social.example/@ann"]
            }},
            {"type": ["h-card"], "properties": {
                "name": ["Ann"],
                "url": ["https://ann.example/"],
                "uid": ["https://ann.example/"],
                "photo": ["https://ann.example/me.jpg"]
            }}
        ],
        "rels": {"me": ["https://social.example/@ann"]}
    }));
    let loader = MemoryLoader::new().with_page("https://ann.example/", author_page);
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "content": ["hello"],
                "author": ["https://ann.example/"]
            }
        }]
    }));

    let normalizer = Normalizer::new(&loader, NormalizeOptions::default());
    let entry = normalizer
        .normalize(&page, "https://ann.example/notes/1")
        .await
        .unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(
        post.author,
        Some(Card {
            name: Some("Ann".into()),
            url: Some("https://ann.example/".into()),
            photo: Some("https://ann.example/me.jpg".into()),
            ..Card::default()
        })
    );
}

#[tokio::test]
async fn rel_me_card_is_used_without_representative_card() {
    init_logging();
    let author_page = tree(json!({
        "items": [
            {"type": ["h-card"], "properties": {
                "name": ["Someone else"],
                "url": ["https://other.example/"]
            }},
            {"type": ["h-card"], "properties": {
                "name": ["Ann"],
                "url": ["https://social.example/@ann"]
            }}
        ],
        "rels": {"me": ["https://social.example/@ann"]}
    }));
    let loader = MemoryLoader::new().with_page("https://ann.example/", author_page);
    let page = tree(json!({
        "items": [{"type": ["h-entry"], "properties": {"content": ["hi"]}}],
        "rels": {"author": ["https://ann.example/"]}
    }));

    let normalizer = Normalizer::new(&loader, NormalizeOptions::default());
    let entry = normalizer.normalize(&page, "https://ann.example/1").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.author.and_then(|card| card.name).as_deref(), Some("Ann"));
}

#[tokio::test]
async fn unmatched_author_url_leaves_author_absent() {
    init_logging();
    let author_page = tree(json!({
        "items": [{"type": ["h-entry"], "properties": {"content": ["not a card"]}}]
    }));
    let loader = MemoryLoader::new().with_page("https://ann.example/", author_page);
    let page = tree(json!({
        "items": [{"type": ["h-entry"], "properties": {"content": ["hi"]}}],
        "rels": {"author": ["https://ann.example/"]}
    }));

    let normalizer = Normalizer::new(&loader, NormalizeOptions::default());
    let entry = normalizer.normalize(&page, "https://ann.example/1").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.author, None);
}

#[tokio::test]
async fn unreachable_author_page_leaves_author_absent() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {"content": ["hi"], "author": ["https://gone.example/"]}
        }]
    }));

    let entry = normalize_offline(&page, "https://gone.example/1").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.author, None);
}

#[tokio::test]
async fn embedded_url_only_card_is_not_replaced_by_author_page() {
    init_logging();
    let author_page = tree(json!({
        "items": [{"type": ["h-card"], "properties": {
            "name": ["Fetched Ann"],
            "url": ["https://ann.example/"],
            "uid": ["https://ann.example/"]
        }}]
    }));
    let loader = MemoryLoader::new().with_page("https://ann.example/", author_page);
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "content": ["hi"],
                "author": [{"type": ["h-card"], "properties": {"url": ["https://ann.example/"]}}]
            }
        }]
    }));

    let normalizer = Normalizer::new(&loader, NormalizeOptions::default());
    let entry = normalizer.normalize(&page, "https://ann.example/2").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.author, Some(Card::from_url("https://ann.example/")));
}

#[tokio::test]
async fn plain_string_author_becomes_named_card() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {"content": ["hi"], "author": ["Ann Example"]}
        }]
    }));

    let entry = normalize_offline(&page, "https://blog.example/1").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.author, Some(Card::from_name("Ann Example")));
}

#[tokio::test]
async fn non_card_author_object_contributes_its_name() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-entry"],
            "properties": {
                "content": ["hi"],
                "author": [{"type": ["h-org"], "properties": {"name": ["Acme Co"]}}]
            }
        }]
    }));

    let entry = normalize_offline(&page, "https://blog.example/1").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.author, Some(Card::from_name("Acme Co")));
}

#[tokio::test]
async fn author_url_matches_nested_card_on_original_page() {
    init_logging();
    let page = tree(json!({
        "items": [
            {"type": ["h-entry"], "properties": {
                "url": ["https://blog.example/2"],
                "content": ["second"],
                "author": ["https://ann.example/"]
            }},
            {"type": ["h-entry"], "properties": {
                "url": ["https://blog.example/1"],
                "content": ["first"],
                "author": [{"type": ["h-card"], "properties": {
                    "name": ["Ann"],
                    "url": ["https://ann.example/"]
                }}]
            }}
        ]
    }));

    let entry = normalize_offline(&page, "https://blog.example/2").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(
        post.author,
        Some(Card {
            name: Some("Ann".into()),
            url: Some("https://ann.example/".into()),
            ..Card::default()
        })
    );
}

#[tokio::test]
async fn rel_author_card_selects_first_non_card_item() {
    init_logging();
    let page = tree(json!({
        "items": [
            {"type": ["h-card"], "properties": {
                "name": ["Ann"],
                "url": ["https://ann.example/"]
            }},
            {"type": ["h-entry"], "properties": {
                "name": ["Work"],
                "url": ["https://ann.example/work"]
            }}
        ],
        "rels": {"author": ["https://ann.example/"]}
    }));

    let entry = normalize_offline(&page, "https://ann.example/portfolio").await.unwrap();
    let Entry::Entry(post) = entry else {
        panic!("expected an entry");
    };

    assert_eq!(post.name.as_deref(), Some("Work"));
    assert_eq!(post.author.and_then(|card| card.name).as_deref(), Some("Ann"));
}

#[tokio::test]
async fn leading_feed_without_permalink_becomes_feed() {
    init_logging();
    let page = tree(json!({
        "items": [
            {"type": ["h-feed"], "properties": {"name": ["F"]}, "children": [
                {"type": ["h-entry"], "properties": {
                    "url": ["https://blog.example/1"],
                    "content": ["only post"]
                }}
            ]},
            {"type": ["h-card"], "properties": {"name": ["Ann"]}}
        ]
    }));

    let entry = normalize_offline(&page, "https://blog.example/").await.unwrap();
    let Entry::Feed(feed) = entry else {
        panic!("expected a feed");
    };

    assert_eq!(feed.name.as_deref(), Some("F"));
    assert_eq!(feed.items.len(), 1);
}

#[tokio::test]
async fn card_then_event_falls_back_to_event() {
    init_logging();
    let page = tree(json!({
        "items": [
            {"type": ["h-card"], "properties": {"name": ["Ann"]}},
            {"type": ["h-event"], "properties": {
                "name": ["Meetup"],
                "start": ["2026-05-01T18:00:00Z"]
            }}
        ]
    }));

    let entry = normalize_offline(&page, "https://events.example/").await.unwrap();

    assert_eq!(entry.type_name(), "event");
    assert_eq!(entry.name(), Some("Meetup"));
}

#[tokio::test]
async fn feed_root_under_card_is_flattened() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-card"],
            "properties": {"name": ["Blog Owner"], "url": ["https://owner.example/"]},
            "children": [{
                "type": ["h-feed"],
                "properties": {"name": ["Notes"]},
                "children": [
                    {"type": ["h-entry"], "properties": {"url": ["https://owner.example/a"], "name": ["A long title"], "content": ["body a"]}},
                    {"type": ["h-card"], "properties": {"name": ["skipped"]}},
                    {"type": ["h-entry"], "properties": {"url": ["https://owner.example/b"], "content": ["body b"]}}
                ]
            }]
        }]
    }));
    let options = NormalizeOptions {
        expect_feed: true,
        ..NormalizeOptions::default()
    };
    let loader = OfflineLoader;
    let normalizer = Normalizer::new(&loader, options);

    let first = normalizer.normalize(&page, "https://owner.example/").await.unwrap();
    let second = normalizer.normalize(&page, "https://owner.example/").await.unwrap();

    let summary = |entry: &Entry| -> Vec<(&'static str, Option<String>, Option<String>)> {
        let Entry::Feed(feed) = entry else {
            panic!("expected a feed");
        };
        feed.items
            .iter()
            .map(|item| {
                (
                    item.type_name(),
                    item.url().map(str::to_string),
                    item.name().map(str::to_string),
                )
            })
            .collect()
    };
    assert_eq!(summary(&first), summary(&second));
    assert_eq!(first.name(), Some("Notes"));
    assert_eq!(
        summary(&first),
        vec![
            ("entry", Some("https://owner.example/a".to_string()), Some("A long title".to_string())),
            ("card", None, Some("skipped".to_string())),
            ("entry", Some("https://owner.example/b".to_string()), None),
        ]
    );
}

#[tokio::test]
async fn normalizing_twice_is_byte_identical() {
    init_logging();
    let page = tree(json!({
        "items": [{
            "type": ["h-event"],
            "properties": {
                "name": ["Meetup"],
                "start": ["2024-05-01T18:00"],
                "location": [{"type": ["h-card"], "properties": {"name": ["Hall"], "url": ["https://hall.example/"]}}],
                "category": ["#indieweb", "rust", "#indieweb"]
            }
        }]
    }));

    let first = serde_json::to_string(&normalize_offline(&page, "https://e.example/").await).unwrap();
    let second = serde_json::to_string(&normalize_offline(&page, "https://e.example/").await).unwrap();

    assert_eq!(first, second);
    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["category"], json!(["indieweb", "rust"]));
    assert_eq!(value["location"], json!(["https://hall.example/"]));
    assert_eq!(value["post-type"], json!("event"));
    assert_eq!(value["refs"]["https://hall.example/"]["name"], json!("Hall"));
}

#[tokio::test]
async fn page_without_objects_is_none() {
    init_logging();
    let page = tree(json!({"items": []}));
    assert_eq!(normalize_offline(&page, "https://empty.example/").await, None);
}
