//! Optional RON configuration file for the command-line front end.
//!
//! ```ron
//! (
//!     options: (timeout: 10, include_original: true),
//!     fetch: (max_bytes: Some(1048576)),
//! )
//! ```

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use serde::Deserialize;
use xray_engine::{FetchSettings, ParseOptions};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppConfig {
    pub(crate) options: ParseOptions,
    pub(crate) fetch: FetchConfig,
}

/// Overrides for the HTTP client; unset keys keep the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FetchConfig {
    pub(crate) connect_timeout_secs: Option<u64>,
    pub(crate) max_bytes: Option<u64>,
    pub(crate) user_agent: Option<String>,
}

impl FetchConfig {
    pub(crate) fn settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            max_bytes: self.max_bytes.unwrap_or(defaults.max_bytes),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

pub(crate) fn parse_config(text: &str) -> Result<AppConfig> {
    ron::from_str(text).context("invalid configuration")
}

pub(crate) fn load_config(path: &Path) -> Result<AppConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    let config = parse_config(&text).with_context(|| format!("in {}", path.display()))?;
    engine_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Reads a document body from a file, or from stdin when `path` is `-`.
pub(crate) fn read_body(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("failed to read the document from stdin")?;
        return Ok(body);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xray_engine::Expect;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = parse_config(
            "(options: (timeout: 4, expect: Some(feed)), fetch: (max_bytes: Some(2048)))",
        )
        .unwrap();
        assert_eq!(config.options.timeout, 4);
        assert_eq!(config.options.expect, Some(Expect::Feed));
        assert_eq!(config.options.max_redirects, 5);
        assert!(config.options.include_mf1);

        let settings = config.fetch.settings();
        assert_eq!(settings.max_bytes, 2048);
        assert_eq!(settings.connect_timeout, FetchSettings::default().connect_timeout);
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse_config("()").unwrap(), AppConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("(options: (timout: 4))").is_err());
    }
}
