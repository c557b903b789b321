use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine_logging::LevelFilter;
use xray_engine::{AcceptMode, Expect, ParseOptions};

/// Fetch a URL and print its normalized entry as JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "xray", version, about)]
pub(crate) struct Cli {
    /// URL to parse
    pub(crate) url: String,

    /// RON file with parse options and fetch settings; flags override it
    #[arg(long, env = "XRAY_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Parse this file (or `-` for stdin) instead of fetching the URL
    #[arg(long)]
    pub(crate) body: Option<PathBuf>,

    /// Only succeed if the document links to this URL
    #[arg(long)]
    pub(crate) target: Option<String>,

    #[arg(long, value_enum)]
    pub(crate) expect: Option<ExpectArg>,

    #[arg(long, value_enum)]
    pub(crate) accept: Option<AcceptArg>,

    /// Request timeout in seconds
    #[arg(long)]
    pub(crate) timeout: Option<u64>,

    #[arg(long)]
    pub(crate) max_redirects: Option<usize>,

    /// Ignore legacy microformats class names
    #[arg(long)]
    pub(crate) no_mf1: bool,

    /// Do not follow ActivityStreams alternates
    #[arg(long)]
    pub(crate) ignore_as2: bool,

    /// Keep YouTube and Vimeo iframes in sanitized HTML
    #[arg(long)]
    pub(crate) allow_iframe_video: bool,

    /// Include the fetched document in the output
    #[arg(long)]
    pub(crate) include_original: bool,

    /// Bearer token for the primary request
    #[arg(long, env = "XRAY_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub(crate) pretty: bool,

    #[arg(long, default_value_t = LevelFilter::Warn)]
    pub(crate) log_level: LevelFilter,

    /// Also write the log to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpectArg {
    Feed,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AcceptArg {
    Html,
    Json,
    Activitypub,
    Xml,
    Feed,
}

impl From<AcceptArg> for AcceptMode {
    fn from(arg: AcceptArg) -> Self {
        match arg {
            AcceptArg::Html => AcceptMode::Html,
            AcceptArg::Json => AcceptMode::Json,
            AcceptArg::Activitypub => AcceptMode::ActivityPub,
            AcceptArg::Xml => AcceptMode::Xml,
            AcceptArg::Feed => AcceptMode::Feed,
        }
    }
}

impl Cli {
    /// Layers the flags that were given over options from the config file.
    pub(crate) fn apply_to(&self, options: &mut ParseOptions) {
        if let Some(target) = &self.target {
            options.target = Some(target.clone());
        }
        if let Some(ExpectArg::Feed) = self.expect {
            options.expect = Some(Expect::Feed);
        }
        if let Some(accept) = self.accept {
            options.accept = Some(accept.into());
        }
        if let Some(timeout) = self.timeout {
            options.timeout = timeout;
        }
        if let Some(max_redirects) = self.max_redirects {
            options.max_redirects = max_redirects;
        }
        if let Some(token) = &self.token {
            options.token = Some(token.clone());
        }
        options.include_mf1 &= !self.no_mf1;
        options.ignore_as2 |= self.ignore_as2;
        options.allow_iframe_video |= self.allow_iframe_video;
        options.include_original |= self.include_original;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::parse_from([
            "xray",
            "https://a.example/",
            "--timeout",
            "3",
            "--accept",
            "activitypub",
            "--no-mf1",
        ]);
        let mut options = ParseOptions {
            timeout: 20,
            max_redirects: 2,
            ..ParseOptions::default()
        };
        cli.apply_to(&mut options);

        assert_eq!(options.timeout, 3);
        assert_eq!(options.max_redirects, 2);
        assert_eq!(options.accept, Some(AcceptMode::ActivityPub));
        assert!(!options.include_mf1);
    }
}
