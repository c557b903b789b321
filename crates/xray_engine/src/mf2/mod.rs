//! Microformats parser: HTML to an [`ObjectTree`].
//!
//! Roots are `h-*` elements (or legacy root classes when enabled); their
//! `p-`, `u-`, `dt-` and `e-` descendants become properties. Nested roots
//! become property values when they also carry a property class, children
//! otherwise.

mod legacy;
mod rels;
mod values;

use scraper::{ElementRef, Html, Selector};
use url::Url;
use xray_core::urls::resolve_url;
use xray_core::{split_microformat_class, Item, ObjectTree, PropertyValue};

use values::{parse_value, plain_value, text_content, url_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Prefix {
    /// `p-*`
    Plain,
    /// `u-*`
    Url,
    /// `dt-*`
    Date,
    /// `e-*`
    Embedded,
    /// Legacy `rel=tag` link.
    Tag,
}

impl Prefix {
    fn from_class_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "p" => Some(Prefix::Plain),
            "u" => Some(Prefix::Url),
            "dt" => Some(Prefix::Date),
            "e" => Some(Prefix::Embedded),
            _ => None,
        }
    }
}

/// Parse result with the page-level facts the dispatcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHtml {
    pub tree: ObjectTree,
    /// Status from `<meta http-equiv="Status">`, overriding the HTTP one.
    pub meta_status: Option<u16>,
    /// Whether the requested fragment id was found; `None` without fragment.
    pub found_fragment: Option<bool>,
}

/// Parses every microformat in `html`. Relative URLs resolve against
/// `<base href>` or `url`.
pub fn parse_html(html: &str, url: &str, include_mf1: bool) -> ObjectTree {
    parse_page(html, url, include_mf1, None).tree
}

/// Like [`parse_html`], restricted to the element whose `id` is `fragment`
/// when it exists. Rels always cover the whole document.
pub fn parse_page(html: &str, url: &str, include_mf1: bool, fragment: Option<&str>) -> ParsedHtml {
    let document = Html::parse_document(html);
    let page_url = Url::parse(url).ok();
    let base = document_base(&document, page_url.as_ref()).or(page_url);
    let parser = Parser {
        base: base.as_ref(),
        include_mf1,
    };

    let mut tree = ObjectTree::default();
    let mut found_fragment = None;
    let scope = match fragment.filter(|id| !id.is_empty()) {
        Some(id) => {
            let target = find_by_id(&document, id);
            found_fragment = Some(target.is_some());
            target.unwrap_or_else(|| document.root_element())
        }
        None => document.root_element(),
    };
    parser.parse_within(scope, &mut tree.items);
    rels::collect_rels(&document, base.as_ref(), &mut tree);

    ParsedHtml {
        tree,
        meta_status: meta_status(&document),
        found_fragment,
    }
}

fn document_base(document: &Html, page_url: Option<&Url>) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    resolve_url(href, page_url)
}

fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().id() == Some(id))
}

fn meta_status(document: &Html) -> Option<u16> {
    let selector = Selector::parse("meta[http-equiv][content]").ok()?;
    document
        .select(&selector)
        .find(|meta| {
            meta.value()
                .attr("http-equiv")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("status"))
        })
        .and_then(|meta| {
            let content = meta.value().attr("content")?.trim();
            let digits: String = content.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
}

struct Root {
    types: Vec<String>,
    legacy: bool,
}

/// Which kinds of properties an item has, for the implied-property rules.
#[derive(Default)]
struct Seen {
    plain_or_embedded: bool,
    url: bool,
    nested: bool,
}

impl Seen {
    fn note(&mut self, prefix: Prefix) {
        match prefix {
            Prefix::Plain | Prefix::Embedded | Prefix::Tag => self.plain_or_embedded = true,
            Prefix::Url => self.url = true,
            Prefix::Date => {}
        }
    }
}

struct Parser<'b> {
    base: Option<&'b Url>,
    include_mf1: bool,
}

impl Parser<'_> {
    fn parse_within(&self, element: ElementRef<'_>, items: &mut Vec<Item>) {
        match self.root(element) {
            Some(root) => items.push(self.parse_item(element, &root)),
            None => self.find_roots(element, items),
        }
    }

    fn find_roots(&self, parent: ElementRef<'_>, items: &mut Vec<Item>) {
        for element in parent.children().filter_map(ElementRef::wrap) {
            self.parse_within(element, items);
        }
    }

    fn root(&self, element: ElementRef<'_>) -> Option<Root> {
        let mut types: Vec<String> = element
            .value()
            .classes()
            .filter(|class| split_microformat_class(class).is_some_and(|(prefix, _)| prefix == "h"))
            .map(str::to_string)
            .collect();
        if !types.is_empty() {
            types.sort();
            types.dedup();
            return Some(Root {
                types,
                legacy: false,
            });
        }
        if !self.include_mf1 {
            return None;
        }
        let types = legacy::root_types(element.value().classes());
        (!types.is_empty()).then_some(Root { types, legacy: true })
    }

    fn parse_item(&self, element: ElementRef<'_>, root: &Root) -> Item {
        let mut item = Item {
            types: root.types.clone(),
            id: element.value().id().map(str::to_string),
            ..Item::default()
        };
        let mut seen = Seen::default();
        self.scan(element, root, &mut item, &mut seen);
        if !root.legacy {
            self.imply(element, &mut item, &seen);
        }
        item
    }

    fn properties(&self, element: ElementRef<'_>, root: &Root) -> Vec<(Prefix, String)> {
        let node = element.value();
        let mut found: Vec<(Prefix, String)> = Vec::new();
        let mut push = |prefix: Prefix, name: &str| {
            if !found.iter().any(|(p, n)| *p == prefix && n == name) {
                found.push((prefix, name.to_string()));
            }
        };

        if !root.legacy {
            for class in node.classes() {
                if let Some((prefix, name)) = split_microformat_class(class) {
                    if let Some(prefix) = Prefix::from_class_prefix(prefix) {
                        push(prefix, name);
                    }
                }
            }
            return found;
        }

        for class in node.classes() {
            if let Some((prefix, name)) = legacy::property(&root.types, class) {
                push(prefix, name);
            }
        }
        if matches!(node.name(), "a" | "link") {
            for rel in node.attr("rel").unwrap_or_default().split_ascii_whitespace() {
                match rel.to_ascii_lowercase().as_str() {
                    "bookmark" => push(Prefix::Url, "url"),
                    "tag" => push(Prefix::Tag, "category"),
                    _ => {}
                }
            }
        }
        found
    }

    fn scan(&self, parent: ElementRef<'_>, root: &Root, item: &mut Item, seen: &mut Seen) {
        for element in parent.children().filter_map(ElementRef::wrap) {
            let properties = self.properties(element, root);
            let nested_root = self.root(element).or_else(|| {
                if !root.legacy {
                    return None;
                }
                properties.iter().find_map(|(_, name)| {
                    legacy::implied_root(&root.types, name).map(|implied| Root {
                        types: vec![implied.to_string()],
                        legacy: true,
                    })
                })
            });

            let Some(nested_root) = nested_root else {
                for (prefix, name) in &properties {
                    seen.note(*prefix);
                    if let Some(value) = parse_value(element, *prefix, self.base) {
                        push_value(item, name, value);
                    }
                }
                self.scan(element, root, item, seen);
                continue;
            };

            seen.nested = true;
            let nested = self.parse_item(element, &nested_root);
            if properties.is_empty() {
                item.children.push(nested);
                continue;
            }
            for (prefix, name) in &properties {
                seen.note(*prefix);
                let mut value = nested.clone();
                value.value = Some(self.nested_value(element, &value, *prefix));
                if *prefix == Prefix::Embedded {
                    value.html = Some(element.inner_html().trim().to_string());
                }
                push_value(item, name, PropertyValue::Item(value));
            }
        }
    }

    /// The plain `value` of a nested microformat used as a property.
    fn nested_value(&self, element: ElementRef<'_>, nested: &Item, prefix: Prefix) -> String {
        match prefix {
            Prefix::Plain | Prefix::Tag => nested
                .plaintext("name")
                .unwrap_or_else(|| plain_value(element)),
            Prefix::Url => nested.plaintext("url").unwrap_or_else(|| {
                url_value(element, self.base)
                    .plaintext()
                    .unwrap_or_default()
                    .to_string()
            }),
            Prefix::Date => values::date_value(element),
            Prefix::Embedded => text_content(element).trim().to_string(),
        }
    }

    fn imply(&self, element: ElementRef<'_>, item: &mut Item, seen: &Seen) {
        if seen.nested {
            return;
        }
        if !item.has_property("name") && !seen.plain_or_embedded {
            let name = implied_name(element);
            if !name.is_empty() {
                push_value(item, "name", PropertyValue::Text(name));
            }
        }
        if !item.has_property("photo") && !seen.url {
            if let Some(photo) = self.implied(element, &["img", "object"]) {
                push_value(item, "photo", url_value(photo, self.base));
            }
        }
        if !item.has_property("url") && !seen.url {
            if let Some(link) = self.implied(element, &["a", "area"]) {
                if link.value().attr("href").is_some() {
                    push_value(item, "url", url_value(link, self.base));
                }
            }
        }
    }

    /// The element itself, its only child or its only grandchild, when that
    /// element is one of `tags` and not a microformat of its own.
    fn implied<'a>(&self, element: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
        let usable = |candidate: &ElementRef<'a>| {
            let node = candidate.value();
            tags.contains(&node.name())
                && (node.attr("src").is_some()
                    || node.attr("data").is_some()
                    || node.attr("href").is_some())
        };
        if usable(&element) {
            return Some(element);
        }
        let child = only_child(element).filter(|child| self.root(*child).is_none())?;
        if usable(&child) {
            return Some(child);
        }
        only_child(child)
            .filter(|grandchild| self.root(*grandchild).is_none())
            .filter(usable)
    }
}

fn implied_name(element: ElementRef<'_>) -> String {
    let attribute_of = |candidate: ElementRef<'_>| {
        let node = candidate.value();
        match node.name() {
            "img" | "area" => node.attr("alt").map(str::to_string),
            "abbr" => node.attr("title").map(str::to_string),
            _ => None,
        }
    };
    attribute_of(element)
        .or_else(|| only_child(element).and_then(attribute_of))
        .or_else(|| {
            only_child(element)
                .and_then(only_child)
                .and_then(attribute_of)
        })
        .unwrap_or_else(|| text_content(element))
        .trim()
        .to_string()
}

fn only_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut children = element.children().filter_map(ElementRef::wrap);
    let first = children.next()?;
    children.next().is_none().then_some(first)
}

fn push_value(item: &mut Item, name: &str, value: PropertyValue) {
    item.properties
        .entry(name.to_string())
        .or_default()
        .push(value);
}
