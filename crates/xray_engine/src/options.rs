use std::time::Duration;

use serde::{Deserialize, Serialize};
use xray_core::NormalizeOptions;

use crate::fetch::{AcceptMode, FetchRequest};

/// What the caller expects the page to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expect {
    Feed,
}

/// Per-call parse options. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Request timeout in seconds.
    pub timeout: u64,
    pub max_redirects: usize,
    /// Only succeed when the document links to this URL.
    pub target: Option<String>,
    pub expect: Option<Expect>,
    pub accept: Option<AcceptMode>,
    /// Also parse legacy (microformats1) class names.
    pub include_mf1: bool,
    /// Skip ActivityStreams alternates advertised by HTML pages.
    pub ignore_as2: bool,
    pub allow_iframe_video: bool,
    /// Echo the fetched body in the envelope's `original` field.
    pub include_original: bool,
    /// Sent as a bearer token on the primary request.
    pub token: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            timeout: 15,
            max_redirects: 5,
            target: None,
            expect: None,
            accept: None,
            include_mf1: true,
            ignore_as2: false,
            allow_iframe_video: false,
            include_original: false,
            token: None,
        }
    }
}

impl ParseOptions {
    pub fn expects_feed(&self) -> bool {
        self.expect == Some(Expect::Feed)
    }

    pub fn accept_mode(&self) -> AcceptMode {
        match (self.accept, self.expects_feed()) {
            (Some(mode), _) => mode,
            (None, true) => AcceptMode::Feed,
            (None, false) => AcceptMode::Default,
        }
    }

    /// The primary request for `url` under these options.
    pub fn fetch_request(&self, url: &str) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            timeout: Duration::from_secs(self.timeout),
            max_redirects: self.max_redirects,
            accept: self.accept_mode(),
            token: self.token.clone(),
        }
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            expect_feed: self.expects_feed(),
            allow_iframe_video: self.allow_iframe_video,
        }
    }
}
