use std::collections::BTreeMap;
use std::error::Error as _;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::decode::decode_body;
use crate::{FailureKind, FetchError, RawDocument};

const USER_AGENT: &str = concat!("xray/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_bytes: 5 * 1024 * 1024,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Which representation to ask the server for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptMode {
    #[default]
    Default,
    Html,
    Json,
    ActivityPub,
    Xml,
    Feed,
}

impl AcceptMode {
    pub fn header_value(self) -> &'static str {
        match self {
            AcceptMode::Default => {
                "application/mf2+json;q=1.0, text/html;q=0.9, application/activity+json;q=0.8, \
                 application/ld+json;q=0.7, */*;q=0.1"
            }
            AcceptMode::Html => "text/html, application/xhtml+xml;q=0.9, */*;q=0.1",
            AcceptMode::Json => {
                "application/mf2+json, application/json;q=0.9, application/activity+json;q=0.8"
            }
            AcceptMode::ActivityPub => {
                "application/activity+json, \
                 application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\""
            }
            AcceptMode::Xml => {
                "application/atom+xml, application/rss+xml, application/xml;q=0.9, text/xml;q=0.8"
            }
            AcceptMode::Feed => {
                "application/mf2+json;q=1.0, application/feed+json;q=0.9, \
                 application/atom+xml;q=0.9, application/rss+xml;q=0.9, text/html;q=0.8, */*;q=0.1"
            }
        }
    }
}

/// One outgoing request and its budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Duration,
    pub max_redirects: usize,
    pub accept: AcceptMode,
    pub token: Option<String>,
}

impl FetchRequest {
    /// Budget for a secondary request made while a primary one is already
    /// spent: half the timeout and redirects, no credentials.
    pub fn halved(&self, url: &str, accept: AcceptMode) -> Self {
        Self {
            url: url.to_string(),
            timeout: self.timeout / 2,
            max_redirects: self.max_redirects.div_ceil(2),
            accept,
            token: None,
        }
    }
}

/// Rejects anything that is not an absolute http(s) URL with a host.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::new(FailureKind::InvalidUrl, "Missing URL"));
    }
    let url = Url::parse(trimmed)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("Invalid URL: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::new(
            FailureKind::InvalidUrl,
            format!("Unsupported scheme: {}", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::new(FailureKind::InvalidUrl, "URL has no host"));
    }
    Ok(url)
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(
        &self,
        request: &FetchRequest,
        redirect_counter: Arc<AtomicUsize>,
    ) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = request.max_redirects;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count > redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(request.timeout)
            .redirect(policy)
            .user_agent(self.settings.user_agent.as_str())
            .build()
            .map_err(|err| FetchError::new(FailureKind::ConnectionError, err.to_string()))
    }

    fn too_large(&self) -> FetchError {
        FetchError::new(
            FailureKind::InvalidContent,
            format!("Response exceeds {} bytes", self.settings.max_bytes),
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, FetchError> {
        let parsed = validate_url(&request.url)?;
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = self.build_client(request, redirect_counter.clone())?;

        engine_info!("fetching {}", request.url);
        let mut builder = client
            .get(parsed)
            .header(ACCEPT, request.accept.header_value());
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        match status.as_u16() {
            401 => {
                return Err(FetchError::new(FailureKind::Unauthorized, status.to_string())
                    .with_status(401))
            }
            403 => {
                return Err(
                    FetchError::new(FailureKind::Forbidden, status.to_string()).with_status(403)
                )
            }
            _ => {}
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.settings.max_bytes)
        {
            return Err(self.too_large());
        }

        let final_url = response.url().to_string();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > self.settings.max_bytes {
                return Err(self.too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        let body = decode_body(&bytes, content_type.as_deref())
            .map_err(|err| FetchError::new(FailureKind::InvalidContent, err.to_string()))?;
        let redirect_count = redirect_counter.load(Ordering::Relaxed);
        engine_debug!(
            "{}: {} {} bytes as {}, {} redirects",
            request.url,
            status.as_u16(),
            bytes.len(),
            body.encoding_label,
            redirect_count
        );

        Ok(RawDocument {
            url: request.url.clone(),
            final_url,
            status: status.as_u16(),
            content_type,
            headers,
            body: body.text,
            redirect_count,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::TooManyRedirects, err.to_string());
    }

    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    let lowered = chain.to_ascii_lowercase();
    let kind = if lowered.contains("dns") || lowered.contains("lookup") || lowered.contains("resolve")
    {
        FailureKind::DnsError
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
        FailureKind::SslError
    } else {
        FailureKind::ConnectionError
    };
    FetchError::new(kind, chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation_rejects_non_http() {
        assert!(validate_url("https://a.example/x").is_ok());
        for bad in ["", "not a url", "ftp://a.example/", "mailto:ann@a.example"] {
            let err = validate_url(bad).unwrap_err();
            assert_eq!(err.kind, FailureKind::InvalidUrl, "{bad}");
        }
    }

    #[test]
    fn halved_request_splits_budget_and_drops_token() {
        let request = FetchRequest {
            url: "https://a.example/".into(),
            timeout: Duration::from_secs(15),
            max_redirects: 5,
            accept: AcceptMode::Default,
            token: Some("secret".into()),
        };
        let secondary = request.halved("https://b.example/", AcceptMode::Json);
        assert_eq!(secondary.timeout, Duration::from_millis(7500));
        assert_eq!(secondary.max_redirects, 3);
        assert_eq!(secondary.token, None);
        assert_eq!(secondary.url, "https://b.example/");
    }
}
