/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a trailing `...` or `…` left behind by title truncation.
pub fn strip_trailing_ellipsis(input: &str) -> &str {
    let trimmed = input.trim_end();
    trimmed
        .strip_suffix("...")
        .or_else(|| trimmed.strip_suffix('\u{2026}'))
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

/// True when `name` is only a (possibly truncated) copy of the start of `body`.
pub fn is_name_prefix_of(name: &str, body: &str) -> bool {
    let name = collapse_whitespace(strip_trailing_ellipsis(name));
    if name.is_empty() {
        return true;
    }
    collapse_whitespace(body).starts_with(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsis_variants_are_stripped() {
        assert_eq!(strip_trailing_ellipsis("Hello world..."), "Hello world");
        assert_eq!(strip_trailing_ellipsis("Hello world\u{2026}"), "Hello world");
        assert_eq!(strip_trailing_ellipsis("Hello world"), "Hello world");
    }

    #[test]
    fn name_prefix_ignores_whitespace_differences() {
        assert!(is_name_prefix_of(
            "Hello   big\nworld...",
            "Hello big world, this is the rest of the post"
        ));
        assert!(!is_name_prefix_of("A Title", "Some content"));
    }
}
