//! Microformats1 class names and their microformats2 equivalents.

use super::Prefix;

const ROOTS: &[(&str, &str)] = &[
    ("hentry", "h-entry"),
    ("hfeed", "h-feed"),
    ("vcard", "h-card"),
    ("vevent", "h-event"),
    ("hreview", "h-review"),
    ("hrecipe", "h-recipe"),
    ("hproduct", "h-product"),
];

const ENTRY: &[(&str, Prefix, &str)] = &[
    ("entry-title", Prefix::Plain, "name"),
    ("entry-summary", Prefix::Plain, "summary"),
    ("entry-content", Prefix::Embedded, "content"),
    ("published", Prefix::Date, "published"),
    ("updated", Prefix::Date, "updated"),
    ("author", Prefix::Plain, "author"),
    ("category", Prefix::Plain, "category"),
];

const CARD: &[(&str, Prefix, &str)] = &[
    ("fn", Prefix::Plain, "name"),
    ("nickname", Prefix::Plain, "nickname"),
    ("photo", Prefix::Url, "photo"),
    ("logo", Prefix::Url, "logo"),
    ("url", Prefix::Url, "url"),
    ("uid", Prefix::Url, "uid"),
    ("email", Prefix::Url, "email"),
    ("note", Prefix::Plain, "note"),
    ("org", Prefix::Plain, "org"),
    ("latitude", Prefix::Plain, "latitude"),
    ("longitude", Prefix::Plain, "longitude"),
    ("locality", Prefix::Plain, "locality"),
    ("region", Prefix::Plain, "region"),
    ("country-name", Prefix::Plain, "country-name"),
    ("street-address", Prefix::Plain, "street-address"),
    ("postal-code", Prefix::Plain, "postal-code"),
];

const EVENT: &[(&str, Prefix, &str)] = &[
    ("summary", Prefix::Plain, "name"),
    ("dtstart", Prefix::Date, "start"),
    ("dtend", Prefix::Date, "end"),
    ("duration", Prefix::Date, "duration"),
    ("description", Prefix::Embedded, "description"),
    ("url", Prefix::Url, "url"),
    ("location", Prefix::Plain, "location"),
    ("category", Prefix::Plain, "category"),
    ("attendee", Prefix::Plain, "attendee"),
];

const REVIEW: &[(&str, Prefix, &str)] = &[
    ("summary", Prefix::Plain, "name"),
    ("item", Prefix::Plain, "item"),
    ("reviewer", Prefix::Plain, "author"),
    ("dtreviewed", Prefix::Date, "published"),
    ("rating", Prefix::Plain, "rating"),
    ("best", Prefix::Plain, "best"),
    ("worst", Prefix::Plain, "worst"),
    ("description", Prefix::Embedded, "content"),
];

const RECIPE: &[(&str, Prefix, &str)] = &[
    ("fn", Prefix::Plain, "name"),
    ("ingredient", Prefix::Plain, "ingredient"),
    ("yield", Prefix::Plain, "yield"),
    ("instructions", Prefix::Embedded, "instructions"),
    ("duration", Prefix::Date, "duration"),
    ("photo", Prefix::Url, "photo"),
    ("summary", Prefix::Plain, "summary"),
    ("author", Prefix::Plain, "author"),
    ("published", Prefix::Date, "published"),
];

const PRODUCT: &[(&str, Prefix, &str)] = &[
    ("fn", Prefix::Plain, "name"),
    ("photo", Prefix::Url, "photo"),
    ("brand", Prefix::Plain, "brand"),
    ("category", Prefix::Plain, "category"),
    ("description", Prefix::Embedded, "description"),
    ("identifier", Prefix::Url, "identifier"),
    ("url", Prefix::Url, "url"),
    ("review", Prefix::Plain, "review"),
    ("price", Prefix::Plain, "price"),
];

/// The reviewed thing of an `hreview` when it carries no root class itself.
const ITEM: &[(&str, Prefix, &str)] = &[
    ("fn", Prefix::Plain, "name"),
    ("url", Prefix::Url, "url"),
    ("photo", Prefix::Url, "photo"),
];

/// Microformats2 root types for the legacy root classes on an element,
/// sorted.
pub(super) fn root_types<'a>(classes: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut types: Vec<String> = classes
        .filter_map(|class| {
            ROOTS
                .iter()
                .find(|(legacy, _)| *legacy == class)
                .map(|(_, modern)| modern.to_string())
        })
        .collect();
    types.sort();
    types.dedup();
    types
}

/// Maps a legacy property class inside a root of `root_types`.
pub(super) fn property(root_types: &[String], class: &str) -> Option<(Prefix, &'static str)> {
    root_types.iter().find_map(|root| {
        table(root)
            .iter()
            .find(|(legacy, _, _)| *legacy == class)
            .map(|(_, prefix, name)| (*prefix, *name))
    })
}

/// A property element that implies its own root even without a root class.
pub(super) fn implied_root(root_types: &[String], property: &str) -> Option<&'static str> {
    let in_review = root_types.iter().any(|root| root == "h-review");
    (in_review && property == "item").then_some("h-item")
}

fn table(root: &str) -> &'static [(&'static str, Prefix, &'static str)] {
    match root {
        "h-entry" => ENTRY,
        "h-card" => CARD,
        "h-event" => EVENT,
        "h-review" => REVIEW,
        "h-recipe" => RECIPE,
        "h-product" => PRODUCT,
        "h-item" => ITEM,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_roots_map_and_sort() {
        assert_eq!(
            root_types(["vcard", "hentry", "other"].into_iter()),
            vec!["h-card".to_string(), "h-entry".to_string()]
        );
    }

    #[test]
    fn property_lookup_depends_on_root() {
        let event = vec!["h-event".to_string()];
        assert_eq!(property(&event, "summary"), Some((Prefix::Plain, "name")));
        let entry = vec!["h-entry".to_string()];
        assert_eq!(property(&entry, "summary"), None);
        assert_eq!(property(&entry, "entry-summary"), Some((Prefix::Plain, "summary")));
    }
}
