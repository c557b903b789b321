//! Property value parsing rules for `p-`, `u-`, `dt-` and `e-` properties.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;
use url::Url;
use xray_core::urls::{absolutize, resolve_url};
use xray_core::{split_microformat_class, PlainValue, PropertyValue, RichText};

use super::Prefix;

pub(super) fn parse_value(
    element: ElementRef<'_>,
    prefix: Prefix,
    base: Option<&Url>,
) -> Option<PropertyValue> {
    match prefix {
        Prefix::Plain => Some(PropertyValue::Text(plain_value(element))),
        Prefix::Url => Some(url_value(element, base)),
        Prefix::Date => Some(PropertyValue::Text(date_value(element))),
        Prefix::Embedded => Some(PropertyValue::Rich(RichText {
            value: text_content(element).trim().to_string(),
            html: element.inner_html().trim().to_string(),
        })),
        Prefix::Tag => tag_value(element, base).map(PropertyValue::Text),
    }
}

pub(super) fn plain_value(element: ElementRef<'_>) -> String {
    if let Some(value) = value_class(element, false) {
        return value;
    }
    let node = element.value();
    let attribute = match node.name() {
        "abbr" | "link" => node.attr("title"),
        "data" | "input" => node.attr("value"),
        "img" | "area" => node.attr("alt"),
        _ => None,
    };
    attribute
        .map(str::to_string)
        .unwrap_or_else(|| text_content(element))
        .trim()
        .to_string()
}

pub(super) fn url_value(element: ElementRef<'_>, base: Option<&Url>) -> PropertyValue {
    let node = element.value();
    let from_attribute = match node.name() {
        "a" | "area" | "link" => node.attr("href"),
        "img" | "audio" | "source" | "iframe" => node.attr("src"),
        "video" => node.attr("src").or_else(|| node.attr("poster")),
        "object" => node.attr("data"),
        _ => None,
    };
    if let Some(raw) = from_attribute {
        let url = absolutize(raw, base);
        return match node.attr("alt").filter(|_| node.name() == "img") {
            Some(alt) => PropertyValue::Plain(PlainValue {
                value: url,
                alt: Some(alt.trim().to_string()),
            }),
            None => PropertyValue::Text(url),
        };
    }

    let text = value_class(element, false)
        .or_else(|| match node.name() {
            "abbr" => node.attr("title").map(str::to_string),
            "data" | "input" => node.attr("value").map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| text_content(element));
    PropertyValue::Text(absolutize(text.trim(), base))
}

pub(super) fn date_value(element: ElementRef<'_>) -> String {
    if let Some(value) = value_class(element, true) {
        return value;
    }
    let node = element.value();
    let attribute = match node.name() {
        "time" | "ins" | "del" => node.attr("datetime"),
        "abbr" => node.attr("title"),
        "data" | "input" => node.attr("value"),
        _ => None,
    };
    attribute
        .map(str::to_string)
        .unwrap_or_else(|| text_content(element))
        .trim()
        .to_string()
}

/// Legacy `rel=tag`: the last path segment of the link names the category.
fn tag_value(element: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let url = resolve_url(element.value().attr("href")?, base)?;
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Text content with images replaced by their `alt` text.
pub(super) fn text_content(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    append_text(*element, &mut out);
    out
}

fn append_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => match element.name() {
            "script" | "style" | "template" => {}
            "img" => out.push_str(element.attr("alt").unwrap_or_default()),
            _ => {
                for child in node.children() {
                    append_text(child, out);
                }
            }
        },
        _ => {}
    }
}

/// The value-class pattern: descendants classed `value` or `value-title`
/// supply the value instead of the whole element.
fn value_class(element: ElementRef<'_>, date: bool) -> Option<String> {
    let mut parts = Vec::new();
    collect_value_parts(element, date, &mut parts);
    if parts.is_empty() {
        return None;
    }
    if !date {
        return Some(parts.concat());
    }

    let date_part = parts.iter().find(|part| looks_like_date(part));
    let time_part = parts
        .iter()
        .find(|part| part.contains(':') && !looks_like_date(part));
    let joined = match (date_part, time_part) {
        (Some(date), Some(time)) => Some(format!("{date} {time}")),
        _ => None,
    };
    Some(joined.unwrap_or_else(|| parts.swap_remove(0)))
}

fn collect_value_parts(parent: ElementRef<'_>, date: bool, parts: &mut Vec<String>) {
    for child in parent.children().filter_map(ElementRef::wrap) {
        let node = child.value();
        if node
            .classes()
            .any(|class| split_microformat_class(class).is_some_and(|(prefix, _)| prefix == "h"))
        {
            continue;
        }
        if node.classes().any(|class| class == "value-title") {
            if let Some(title) = node.attr("title") {
                parts.push(title.trim().to_string());
            }
            continue;
        }
        if node.classes().any(|class| class == "value") {
            let attribute = match node.name() {
                "img" | "area" => node.attr("alt"),
                "data" | "input" => node.attr("value"),
                "abbr" => node.attr("title"),
                "time" | "ins" | "del" if date => node.attr("datetime"),
                _ => None,
            };
            let value = attribute
                .map(str::to_string)
                .unwrap_or_else(|| text_content(child));
            parts.push(value.trim().to_string());
            continue;
        }
        collect_value_parts(child, date, parts);
    }
}

fn looks_like_date(part: &str) -> bool {
    let bytes = part.as_bytes();
    bytes.len() >= 10 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}
