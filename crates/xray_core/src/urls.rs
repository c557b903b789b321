use url::Url;

/// True when `candidate` is an absolute http(s) URL with a host.
pub fn is_http_url(candidate: &str) -> bool {
    match Url::parse(candidate.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Normalizes a URL for comparison: lower-cased host, `/` for an empty path.
///
/// Strings that do not parse are returned trimmed and otherwise unchanged.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        // `Url` already lower-cases the host and turns an empty path into `/`
        // for special schemes.
        Ok(url) => url.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Compares two URLs after normalization.
pub fn urls_match(a: &str, b: &str) -> bool {
    normalize_url(a) == normalize_url(b)
}

pub fn contains_url(haystack: &[String], needle: &str) -> bool {
    let needle = normalize_url(needle);
    haystack.iter().any(|candidate| normalize_url(candidate) == needle)
}

pub fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|candidate| contains_url(b, candidate))
}

/// Resolves `reference` against `base`, skipping fragments and scripts.
pub fn resolve_url(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}

/// Resolves `reference` against `base`, keeping it verbatim when that fails.
pub fn absolutize(reference: &str, base: Option<&Url>) -> String {
    resolve_url(reference, base)
        .map(String::from)
        .unwrap_or_else(|| reference.trim().to_string())
}
