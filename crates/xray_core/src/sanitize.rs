//! Allow-list HTML sanitizer and plaintext stripper.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use url::Url;

use crate::tree::split_microformat_class;
use crate::urls::resolve_url;

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "cite", "code", "del", "em", "h1", "h2", "h3", "h4",
    "h5", "h6", "hr", "i", "li", "ol", "p", "pre", "q", "s", "small", "span", "strike", "strong",
    "sub", "sup", "time", "u", "ul",
];

/// Elements whose content is dropped along with the tag.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "script", "style", "noscript", "template", "title", "head", "object", "embed", "button",
    "select", "textarea", "iframe",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

const VIDEO_EMBED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "www.youtube-nocookie.com",
    "player.vimeo.com",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizeOptions<'a> {
    pub allow_images: bool,
    pub allow_iframe_video: bool,
    pub base_url: Option<&'a Url>,
}

/// Reduces `html` to the allow-listed tags and attributes.
pub fn sanitize(html: &str, options: &SanitizeOptions<'_>) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for child in fragment.root_element().children() {
        sanitize_node(child, options, &mut out);
    }
    out.trim().to_string()
}

fn sanitize_node(node: NodeRef<'_, Node>, options: &SanitizeOptions<'_>, out: &mut String) {
    match node.value() {
        Node::Text(text) => escape_text(text, out),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                sanitize_element(element, options, out);
            }
        }
        _ => {}
    }
}

fn sanitize_element(element: ElementRef<'_>, options: &SanitizeOptions<'_>, out: &mut String) {
    let tag = element.value().name().to_ascii_lowercase();

    if tag == "iframe" && options.allow_iframe_video {
        write_video_iframe(element, options, out);
        return;
    }
    if DROPPED_WITH_CONTENT.contains(&tag.as_str()) {
        return;
    }
    if tag == "img" {
        if options.allow_images {
            write_image(element, options, out);
        }
        return;
    }
    if !ALLOWED_TAGS.contains(&tag.as_str()) {
        for child in element.children() {
            sanitize_node(child, options, out);
        }
        return;
    }

    out.push('<');
    out.push_str(&tag);
    match tag.as_str() {
        "a" => {
            if let Some(href) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_url(href, options.base_url))
            {
                push_attr(out, "href", href.as_str());
            }
        }
        "time" => {
            if let Some(datetime) = element.value().attr("datetime") {
                push_attr(out, "datetime", datetime);
            }
        }
        _ => {}
    }
    push_classes(element, out);
    out.push('>');

    if VOID_TAGS.contains(&tag.as_str()) {
        return;
    }
    for child in element.children() {
        sanitize_node(child, options, out);
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn write_image(element: ElementRef<'_>, options: &SanitizeOptions<'_>, out: &mut String) {
    let Some(src) = element
        .value()
        .attr("src")
        .and_then(|src| resolve_url(src, options.base_url))
    else {
        return;
    };
    out.push_str("<img");
    push_attr(out, "src", src.as_str());
    for name in ["alt", "width", "height"] {
        if let Some(value) = element.value().attr(name) {
            push_attr(out, name, value);
        }
    }
    push_classes(element, out);
    out.push('>');
}

fn write_video_iframe(element: ElementRef<'_>, options: &SanitizeOptions<'_>, out: &mut String) {
    let Some(src) = element
        .value()
        .attr("src")
        .and_then(|src| resolve_url(src, options.base_url))
    else {
        return;
    };
    let embeddable = src
        .host_str()
        .is_some_and(|host| VIDEO_EMBED_HOSTS.contains(&host));
    if !embeddable {
        return;
    }
    out.push_str("<iframe");
    push_attr(out, "src", src.as_str());
    for name in ["width", "height"] {
        if let Some(value) = element.value().attr(name) {
            push_attr(out, name, value);
        }
    }
    if element.value().attr("allowfullscreen").is_some() {
        out.push_str(" allowfullscreen");
    }
    out.push_str("></iframe>");
}

/// Keeps only microformats class names.
fn push_classes(element: ElementRef<'_>, out: &mut String) {
    let classes: Vec<&str> = element
        .value()
        .classes()
        .filter(|class| split_microformat_class(class).is_some())
        .collect();
    if !classes.is_empty() {
        push_attr(out, "class", &classes.join(" "));
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Plaintext rendition of `html`: entities decoded, block boundaries become
/// line breaks, scripts and styles dropped.
pub fn strip(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for child in fragment.root_element().children() {
        strip_node(child, &mut out);
    }
    let lines: Vec<&str> = out.lines().map(str::trim).collect();
    let mut joined = String::new();
    let mut blank_run = 0;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        joined.push_str(line);
        joined.push('\n');
    }
    joined.trim().to_string()
}

fn strip_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            let tag = element.name().to_ascii_lowercase();
            match tag.as_str() {
                "script" | "style" | "noscript" | "template" | "head" => {}
                "br" => out.push('\n'),
                "p" | "div" | "li" | "blockquote" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5"
                | "h6" | "ul" | "ol" | "tr" | "section" | "article" | "figure" => {
                    out.push('\n');
                    for child in node.children() {
                        strip_node(child, out);
                    }
                    out.push('\n');
                }
                _ => {
                    for child in node.children() {
                        strip_node(child, out);
                    }
                }
            }
        }
        _ => {}
    }
}
