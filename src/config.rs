//! Proxy configuration
//!
//! Every setting is a command-line flag with an environment fallback.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use url::Url;

use crate::error::ConfigError;
use crate::extractors::LookupFallback;
use crate::fetch::{BROWSER_USER_AGENT, DEFAULT_TIMEOUT_SECS};

/// Currently keyed nodes page.
pub const DEFAULT_KEYED_URL: &str = "https://stats.allstarlink.org/stats/keyed";

/// Node-list search page; takes the term as `?search=`.
pub const DEFAULT_SEARCH_URL: &str = "https://www.allstarlink.org/nodelist/";

pub const DEFAULT_INTERFACE: &str = "web/hypermon.html";

#[derive(Debug, Clone, Args)]
pub struct ProxyConfig {
    /// Address to listen on
    #[arg(long, env = "HYPERMON_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "HYPERMON_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Upstream page listing currently keyed nodes
    #[arg(long, env = "HYPERMON_KEYED_URL", default_value = DEFAULT_KEYED_URL)]
    pub keyed_url: String,

    /// Upstream node-list search page
    #[arg(long, env = "HYPERMON_SEARCH_URL", default_value = DEFAULT_SEARCH_URL)]
    pub search_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "HYPERMON_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// User-Agent sent upstream
    #[arg(long, env = "HYPERMON_USER_AGENT", default_value = BROWSER_USER_AGENT)]
    pub user_agent: String,

    /// HTML file served at / and /index.html
    #[arg(long, env = "HYPERMON_INTERFACE", default_value = DEFAULT_INTERFACE)]
    pub interface: PathBuf,

    /// On node lookup, return the first data row when no row matches the id
    #[arg(long, env = "HYPERMON_SECOND_ROW_FALLBACK")]
    pub second_row_fallback: bool,

    /// Do not add Access-Control-Allow-Origin to responses
    #[arg(long, env = "HYPERMON_NO_CORS")]
    pub no_cors: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            keyed_url: DEFAULT_KEYED_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: BROWSER_USER_AGENT.to_string(),
            interface: PathBuf::from(DEFAULT_INTERFACE),
            second_row_fallback: false,
            no_cors: false,
        }
    }
}

impl ProxyConfig {
    /// Check upstream URLs and timeout before the server starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("keyed", &self.keyed_url)?;
        check_url("search", &self.search_url)?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn lookup_fallback(&self) -> LookupFallback {
        if self.second_row_fallback {
            LookupFallback::SecondRow
        } else {
            LookupFallback::NotFound
        }
    }

    pub fn cors(&self) -> bool {
        !self.no_cors
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ProxyConfig,
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ProxyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
        assert_eq!(config.lookup_fallback(), LookupFallback::NotFound);
        assert!(config.cors());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "hypermon-proxy",
            "--port",
            "8080",
            "--keyed-url",
            "http://127.0.0.1:9000/keyed",
            "--second-row-fallback",
            "--no-cors",
        ])
        .unwrap();

        assert_eq!(cli.config.port, 8080);
        assert_eq!(cli.config.keyed_url, "http://127.0.0.1:9000/keyed");
        assert_eq!(cli.config.lookup_fallback(), LookupFallback::SecondRow);
        assert!(!cli.config.cors());
    }

    #[test]
    fn test_rejects_bad_upstreams() {
        let config = ProxyConfig {
            search_url: "not a url".to_string(),
            ..ProxyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { name: "search", .. })
        ));

        let config = ProxyConfig {
            keyed_url: "ftp://example.com/keyed".to_string(),
            ..ProxyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { name: "keyed", .. })
        ));

        let config = ProxyConfig {
            timeout_secs: 0,
            ..ProxyConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }
}
