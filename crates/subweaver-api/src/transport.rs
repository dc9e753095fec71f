// Shared transport configuration for building reqwest::Client instances.
//
// The template and source clients differ only in user agent and timeout;
// both go through this module instead of duplicating builder logic.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::FetchError;

/// User agent for subscription endpoints. Many providers gate their JSON
/// output on a Clash-compatible agent string.
pub const CLASH_USER_AGENT: &str = "Mozilla/5.0 (Clash)";

/// Default user agent for everything else.
pub const DEFAULT_USER_AGENT: &str = concat!("subweaver/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Unix-millis value for the `t` cache-busting query parameter, so
/// intermediary caches never serve a stale document.
pub(crate) fn cache_buster() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .to_string()
}

impl TransportConfig {
    /// Transport defaults for subscription source fetches.
    pub fn for_sources() -> Self {
        Self {
            user_agent: CLASH_USER_AGENT.to_owned(),
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}
