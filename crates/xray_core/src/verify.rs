//! Link verification: does a parsed document actually reference a target URL?

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::entry::Entry;
use crate::urls::{normalize_url, resolve_url};

const LINK_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("img", "src"),
    ("video", "src"),
    ("video", "poster"),
    ("audio", "src"),
    ("source", "src"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The normalized entry references the target.
    Found,
    /// Only the raw HTML links to the target and the page carries no
    /// machine-readable object: report the page as `unknown`, link found.
    FoundInHtmlOnly,
    /// The HTML links to the target, but no recognized object does.
    NotInObject,
    /// The page does not link to the target at all.
    NotInHtml,
}

impl Verification {
    pub fn found(self) -> bool {
        matches!(self, Verification::Found | Verification::FoundInHtmlOnly)
    }

    pub fn description(self) -> Option<&'static str> {
        match self {
            Verification::Found | Verification::FoundInHtmlOnly => None,
            Verification::NotInObject => Some(
                "A link to the target was found in the HTML, but not inside any recognized object",
            ),
            Verification::NotInHtml => Some("The document does not contain a link to the target"),
        }
    }
}

/// Checks `entry` for `target`, falling back to the raw HTML.
///
/// `has_strict_objects` is only consulted when the link shows up in the HTML
/// alone; it should re-check the page without lenient parsing and report
/// whether any object remains.
pub fn verify_target(
    entry: &Entry,
    raw_html: Option<&str>,
    base: Option<&Url>,
    target: &str,
    has_strict_objects: impl FnOnce() -> bool,
) -> Verification {
    if !entry.is_unknown() && entry_links_to(entry, target) {
        return Verification::Found;
    }
    let in_html = raw_html.is_some_and(|html| html_links_to(html, target, base));
    if !in_html {
        return Verification::NotInHtml;
    }
    if entry.is_unknown() || !has_strict_objects() {
        Verification::FoundInHtmlOnly
    } else {
        Verification::NotInObject
    }
}

/// Walks every field of the entry, scanning `html` fields as markup.
pub fn entry_links_to(entry: &Entry, target: &str) -> bool {
    let Ok(value) = serde_json::to_value(entry) else {
        return false;
    };
    value_links_to(&value, &normalize_url(target))
}

fn value_links_to(value: &Value, target: &str) -> bool {
    match value {
        Value::String(text) => normalize_url(text) == target,
        Value::Array(values) => values.iter().any(|value| value_links_to(value, target)),
        Value::Object(map) => map.iter().any(|(key, value)| match (key.as_str(), value) {
            ("html", Value::String(html)) => html_links_to(html, target, None),
            _ => value_links_to(value, target),
        }),
        _ => false,
    }
}

/// True when the markup has an anchor or media element pointing at `target`.
pub fn html_links_to(html: &str, target: &str, base: Option<&Url>) -> bool {
    let target = normalize_url(target);
    let document = Html::parse_document(html);
    LINK_ATTRIBUTES.iter().any(|(tag, attribute)| {
        let Ok(selector) = Selector::parse(&format!("{tag}[{attribute}]")) else {
            return false;
        };
        document.select(&selector).any(|element| {
            element
                .value()
                .attr(attribute)
                .and_then(|raw| resolve_url(raw, base))
                .is_some_and(|url| normalize_url(url.as_str()) == target)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{HtmlValue, Post};

    #[test]
    fn finds_target_in_structural_field() {
        let entry = Entry::Entry(Post {
            in_reply_to: vec!["https://target.example/post".into()],
            ..Post::default()
        });
        assert!(entry_links_to(&entry, "https://TARGET.example/post"));
        assert!(!entry_links_to(&entry, "https://target.example/other"));
    }

    #[test]
    fn finds_target_inside_html_media() {
        let entry = Entry::Entry(Post {
            content: Some(HtmlValue {
                text: "look".into(),
                html: Some(r#"<p>look <img src="https://target.example/pic.jpg"></p>"#.into()),
            }),
            ..Post::default()
        });
        assert!(entry_links_to(&entry, "https://target.example/pic.jpg"));
    }

    #[test]
    fn relative_links_in_raw_html_resolve_against_base() {
        let base = Url::parse("https://target.example/blog/").unwrap();
        assert!(html_links_to(
            r#"<a href="post">x</a>"#,
            "https://target.example/blog/post",
            Some(&base)
        ));
    }
}
