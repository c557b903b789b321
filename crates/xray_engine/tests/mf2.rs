use pretty_assertions::assert_eq;
use xray_core::{PlainValue, PropertyValue, RichText};
use xray_engine::{parse_html, parse_page};

const PAGE: &str = "https://blog.example/posts/";

#[test]
fn entry_properties_follow_value_rules() {
    let tree = parse_html(
        r#"<article class="h-entry">
             <h1 class="p-name">Title</h1>
             <time class="dt-published" datetime="2024-05-01T10:00:00Z">May 1</time>
             <a class="u-url" href="/posts/1">permalink</a>
             <img class="u-photo" src="img/a.jpg" alt="A cat">
             <abbr class="p-summary" title="Short">S</abbr>
             <div class="e-content"><p>Hello <b>world</b></p></div>
           </article>"#,
        PAGE,
        false,
    );

    assert_eq!(tree.items.len(), 1);
    let entry = &tree.items[0];
    assert_eq!(entry.types, vec!["h-entry".to_string()]);
    assert_eq!(entry.plaintext("name").as_deref(), Some("Title"));
    assert_eq!(entry.plaintext("published").as_deref(), Some("2024-05-01T10:00:00Z"));
    assert_eq!(entry.plaintext("url").as_deref(), Some("https://blog.example/posts/1"));
    assert_eq!(entry.plaintext("summary").as_deref(), Some("Short"));
    assert_eq!(
        entry.values("photo"),
        &[PropertyValue::Plain(PlainValue {
            value: "https://blog.example/posts/img/a.jpg".into(),
            alt: Some("A cat".into()),
        })]
    );
    assert_eq!(
        entry.values("content"),
        &[PropertyValue::Rich(RichText {
            value: "Hello world".into(),
            html: "<p>Hello <b>world</b></p>".into(),
        })]
    );
}

#[test]
fn nested_card_becomes_property_value() {
    let tree = parse_html(
        r#"<div class="h-entry">
             <a class="p-author h-card" href="/about">Ann</a>
             <p class="p-name">Hi</p>
           </div>"#,
        PAGE,
        false,
    );

    let author = tree.items[0].values("author")[0].as_item().unwrap();
    assert_eq!(author.types, vec!["h-card".to_string()]);
    assert_eq!(author.value.as_deref(), Some("Ann"));
    assert_eq!(author.plaintext("name").as_deref(), Some("Ann"));
    assert_eq!(author.plaintext("url").as_deref(), Some("https://blog.example/about"));
}

#[test]
fn implied_properties_on_a_bare_card() {
    let tree = parse_html(
        r#"<a class="h-card" href="https://ann.example/"><img src="/me.png" alt="Ann"></a>"#,
        PAGE,
        false,
    );

    let card = &tree.items[0];
    assert_eq!(card.plaintext("name").as_deref(), Some("Ann"));
    assert_eq!(card.plaintext("url").as_deref(), Some("https://ann.example/"));
    assert_eq!(card.plaintext("photo").as_deref(), Some("https://blog.example/me.png"));
}

#[test]
fn children_without_property_class_are_children() {
    let tree = parse_html(
        r#"<div class="h-feed">
             <div class="h-entry"><p class="p-name">One</p></div>
             <div class="h-entry"><p class="p-name">Two</p></div>
           </div>"#,
        PAGE,
        false,
    );

    let feed = &tree.items[0];
    assert_eq!(feed.children.len(), 2);
    assert_eq!(feed.children[1].plaintext("name").as_deref(), Some("Two"));
}

#[test]
fn legacy_classes_need_the_toggle() {
    let html = r#"<div class="hentry">
                    <h2 class="entry-title">Old post</h2>
                    <a rel="bookmark" href="/old">link</a>
                    <a rel="tag" href="/tags/history/">history</a>
                  </div>"#;

    assert!(parse_html(html, PAGE, false).items.is_empty());

    let tree = parse_html(html, PAGE, true);
    let entry = &tree.items[0];
    assert_eq!(entry.types, vec!["h-entry".to_string()]);
    assert_eq!(entry.plaintext("name").as_deref(), Some("Old post"));
    assert_eq!(entry.plaintext("url").as_deref(), Some("https://blog.example/old"));
    assert_eq!(entry.plaintexts("category"), vec!["history".to_string()]);
}

#[test]
fn rels_and_rel_urls_are_collected() {
    let tree = parse_html(
        r#"<head>
             <link rel="alternate" type="application/mf2+json" href="/posts/1.json">
             <link rel="canonical" href="https://blog.example/posts/1">
           </head>
           <body><a rel="me author" href="https://ann.example/">Ann</a></body>"#,
        PAGE,
        false,
    );

    assert_eq!(tree.rel("canonical"), &["https://blog.example/posts/1".to_string()]);
    assert_eq!(tree.rel("author"), &["https://ann.example/".to_string()]);
    let alternate = &tree.rel_urls["https://blog.example/posts/1.json"];
    assert_eq!(alternate.media_type.as_deref(), Some("application/mf2+json"));
    let me = &tree.rel_urls["https://ann.example/"];
    assert_eq!(me.rels, vec!["me".to_string(), "author".to_string()]);
    assert_eq!(me.text.as_deref(), Some("Ann"));
}

#[test]
fn fragment_restricts_parsing() {
    let html = r#"<div class="h-entry" id="a"><p class="p-name">First</p></div>
                  <div id="b"><div class="h-entry"><p class="p-name">Second</p></div></div>"#;

    let page = parse_page(html, PAGE, false, Some("b"));
    assert_eq!(page.found_fragment, Some(true));
    assert_eq!(page.tree.items.len(), 1);
    assert_eq!(page.tree.items[0].plaintext("name").as_deref(), Some("Second"));

    let missing = parse_page(html, PAGE, false, Some("nope"));
    assert_eq!(missing.found_fragment, Some(false));
    assert_eq!(missing.tree.items.len(), 2);
}
