use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use xray_core::Entry;

/// Fixed error vocabulary reported in the `error` field of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidContent,
    NoContent,
    Unauthorized,
    Forbidden,
    Timeout,
    DnsError,
    SslError,
    TooManyRedirects,
    ConnectionError,
    NoLinkFound,
}

impl FailureKind {
    pub fn code(self) -> &'static str {
        match self {
            FailureKind::InvalidUrl => "invalid_url",
            FailureKind::InvalidContent => "invalid_content",
            FailureKind::NoContent => "no_content",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Forbidden => "forbidden",
            FailureKind::Timeout => "timeout",
            FailureKind::DnsError => "dns_error",
            FailureKind::SslError => "ssl_error",
            FailureKind::TooManyRedirects => "too_many_redirects",
            FailureKind::ConnectionError => "connection_error",
            FailureKind::NoLinkFound => "no_link_found",
        }
    }

    /// Input errors are rejected with 400; everything else is a soft error
    /// delivered with 200 so automated callers can branch on `error`.
    pub fn http_status(self) -> u16 {
        match self {
            FailureKind::InvalidUrl => 400,
            _ => 200,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status that triggered the failure, when there was one.
    pub status: Option<u16>,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// A fetched resource with its body decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Response headers, names lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub redirect_count: usize,
}

impl RawDocument {
    /// A document that was not fetched by us, such as a body handed in by a
    /// caller.
    pub fn from_body(url: &str, body: impl Into<String>, content_type: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            content_type: content_type.map(str::to_string),
            headers: BTreeMap::new(),
            body: body.into(),
            redirect_count: 0,
        }
    }
}

/// Which pipeline produced the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Mf2Html,
    Mf2Json,
    ActivityJson,
    FeedXml,
    FeedJson,
    /// A registered site adapter, by name.
    Site(String),
}

impl SourceFormat {
    pub fn as_str(&self) -> &str {
        match self {
            SourceFormat::Mf2Html => "mf2+html",
            SourceFormat::Mf2Json => "mf2+json",
            SourceFormat::ActivityJson => "activity+json",
            SourceFormat::FeedXml => "feed+xml",
            SourceFormat::FeedJson => "feed+json",
            SourceFormat::Site(name) => name,
        }
    }
}

impl Serialize for SourceFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_fragment: Option<bool>,
}

impl Info {
    fn is_empty(&self) -> bool {
        self.found.is_none() && self.found_fragment.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRels {
    pub canonical: String,
}

/// The entry as delivered, plus page-level relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeData {
    #[serde(flatten)]
    pub entry: Entry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rels: Option<DataRels>,
}

impl From<Entry> for EnvelopeData {
    fn from(entry: Entry) -> Self {
        Self { entry, rels: None }
    }
}

/// Successful result of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub data: EnvelopeData,
    pub url: String,
    pub code: u16,
    #[serde(rename = "source-format", skip_serializing_if = "Option::is_none")]
    pub source_format: Option<SourceFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(skip_serializing_if = "Info::is_empty")]
    pub info: Info,
    #[serde(rename = "parsed-url", skip_serializing_if = "Option::is_none")]
    pub parsed_url: Option<String>,
}

impl Envelope {
    pub fn new(entry: Entry, url: impl Into<String>, code: u16) -> Self {
        Self {
            data: entry.into(),
            url: url.into(),
            code,
            source_format: None,
            original: None,
            info: Info::default(),
            parsed_url: None,
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.data.entry
    }
}

/// Serialized shape of a failed parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: &'static str,
    pub error_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{url}: {kind}: {description}")]
pub struct XrayError {
    pub kind: FailureKind,
    pub description: String,
    pub url: String,
    pub error_code: Option<u16>,
}

impl XrayError {
    pub fn new(kind: FailureKind, url: &str, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            url: url.to_string(),
            error_code: None,
        }
    }

    pub fn from_fetch(url: &str, err: FetchError) -> Self {
        Self {
            kind: err.kind,
            description: err.message,
            url: url.to_string(),
            error_code: err.status,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.kind.code(),
            error_description: self.description.clone(),
            error_code: self.error_code,
            url: self.url.clone(),
        }
    }
}
