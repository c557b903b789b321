use scraper::{Html, Selector};
use url::Url;
use xray_core::urls::resolve_url;
use xray_core::{ObjectTree, RelUrl};

/// Fills `rels` and `rel-urls` from every `a`, `area` and `link` with both
/// `rel` and `href`.
pub(super) fn collect_rels(document: &Html, base: Option<&Url>, tree: &mut ObjectTree) {
    let Ok(selector) = Selector::parse("a[rel][href], area[rel][href], link[rel][href]") else {
        return;
    };

    for element in document.select(&selector) {
        let node = element.value();
        let Some(url) = node.attr("href").and_then(|href| resolve_url(href, base)) else {
            continue;
        };
        let url = String::from(url);
        let mut rels: Vec<String> = Vec::new();
        for rel in node.attr("rel").unwrap_or_default().split_ascii_whitespace() {
            let rel = rel.to_ascii_lowercase();
            if !rels.contains(&rel) {
                rels.push(rel);
            }
        }
        if rels.is_empty() {
            continue;
        }

        for rel in &rels {
            let urls = tree.rels.entry(rel.clone()).or_default();
            if !urls.contains(&url) {
                urls.push(url.clone());
            }
        }

        let entry = tree.rel_urls.entry(url).or_insert_with(RelUrl::default);
        for rel in rels {
            if !entry.rels.contains(&rel) {
                entry.rels.push(rel);
            }
        }
        if entry.media_type.is_none() {
            entry.media_type = node.attr("type").map(str::to_string);
        }
        if entry.hreflang.is_none() {
            entry.hreflang = node.attr("hreflang").map(str::to_string);
        }
        if entry.text.is_none() {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                entry.text = Some(text.to_string());
            }
        }
    }
}
