/// Parsed `Content-Type` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub type_: String,
    pub subtype: String,
    /// Structured syntax suffix (`json` for `activity+json`), else the subtype.
    pub format: String,
    pub charset: Option<String>,
    pub profile: Option<String>,
}

impl MediaType {
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let essence = parts.next()?.trim().to_ascii_lowercase();
        let (type_, subtype) = essence.split_once('/')?;
        let (type_, subtype) = (type_.trim(), subtype.trim());
        if type_.is_empty() || subtype.is_empty() {
            return None;
        }

        let format = subtype
            .rsplit_once('+')
            .map(|(_, suffix)| suffix)
            .unwrap_or(subtype)
            .to_string();

        let mut charset = None;
        let mut profile = None;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches(['"', '\'']).to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "charset" => charset = Some(value.to_ascii_lowercase()),
                "profile" => profile = Some(value),
                _ => {}
            }
        }

        Some(Self {
            type_: type_.to_string(),
            subtype: subtype.to_string(),
            format,
            charset,
            profile,
        })
    }

    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    pub fn is_html(&self) -> bool {
        self.format == "html"
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }

    pub fn is_xml(&self) -> bool {
        self.format == "xml"
    }

    pub fn is_activity_streams(&self) -> bool {
        self.subtype == "activity+json"
            || (self.subtype == "ld+json"
                && self
                    .profile
                    .as_deref()
                    .is_some_and(|p| p.contains("https://www.w3.org/ns/activitystreams")))
    }
}
