//! Configuration for the subweaver profile service.
//!
//! TOML file + `SUBWEAVER_` environment variables via figment, plus the
//! `SUBWEAVER_SOURCE_<NAME>` naming convention for discovering subscription
//! sources. Validation happens at load time so the request path never sees a
//! half-usable configuration.

use std::net::SocketAddr;
use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use subweaver_core::{
    FilterConfig, HealthCheck, Pipeline, PolicyTable, RegionTable,
    filter::{DEFAULT_BANNED_KEYWORDS, DEFAULT_HIGH_RATE_PATTERN},
    region::{default_flags, default_keywords},
};

/// Environment prefix for scalar settings (`SUBWEAVER_TOKEN`,
/// `SUBWEAVER_TEMPLATE__URL`, ...).
pub const ENV_PREFIX: &str = "SUBWEAVER_";

/// Environment prefix for source discovery: every `SUBWEAVER_SOURCE_<NAME>`
/// variable contributes one subscription source named `<NAME>`.
pub const SOURCE_ENV_PREFIX: &str = "SUBWEAVER_SOURCE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Bearer credential clients must present as the `token` query
    /// parameter.
    pub token: Option<SecretString>,

    /// Listen address for the HTTP server.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Base template location.
    pub template: TemplateConfig,

    /// Named subscription sources. The `SUBWEAVER_SOURCE_<NAME>` convention
    /// merges into this map; explicit entries win on name collisions.
    #[serde(default)]
    pub sources: IndexMap<String, String>,

    /// Node filter overrides.
    #[serde(default)]
    pub filter: FilterSettings,

    /// Health-check parameters stamped onto synthesized groups.
    #[serde(default)]
    pub health: HealthCheck,

    /// Per-destination composition rules.
    #[serde(default)]
    pub policy: PolicyTable,

    /// Region keyword table overrides.
    #[serde(default)]
    pub regions: RegionSettings,
}

#[derive(Debug, Deserialize)]
pub struct TemplateConfig {
    /// URL of the base template document.
    pub url: String,

    /// Optional token for private template hosting (sent as
    /// `Authorization: token ...`).
    pub token: Option<SecretString>,
}

/// Filter constants, promoted from embedded literals to configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_high_rate_pattern")]
    pub high_rate_pattern: String,

    #[serde(default = "default_banned_keywords")]
    pub banned_keywords: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            high_rate_pattern: default_high_rate_pattern(),
            banned_keywords: default_banned_keywords(),
        }
    }
}

/// Region keyword table, with the built-in five-region default.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionSettings {
    #[serde(default = "default_keywords")]
    pub keywords: IndexMap<String, Vec<String>>,

    #[serde(default = "default_flags")]
    pub flags: IndexMap<String, String>,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            flags: default_flags(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
fn default_high_rate_pattern() -> String {
    DEFAULT_HIGH_RATE_PATTERN.to_owned()
}
fn default_banned_keywords() -> Vec<String> {
    DEFAULT_BANNED_KEYWORDS.iter().map(|s| (*s).to_owned()).collect()
}

// ── Config loading ──────────────────────────────────────────────────

impl Config {
    /// Load from an optional TOML file plus the environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let toml = Toml::file(path.unwrap_or_else(|| Path::new("subweaver.toml")));

        let figment = Figment::new()
            .merge(toml)
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Self = figment.extract()?;

        for (name, url) in discover_sources() {
            config.sources.entry(name).or_insert(url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check everything the request path relies on.
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.token {
            None => return Err(ConfigError::validation("token", "no credential configured")),
            Some(token) if token.expose_secret().is_empty() => {
                return Err(ConfigError::validation("token", "credential is empty"));
            }
            Some(_) => {}
        }

        Url::parse(&self.template.url)
            .map_err(|e| ConfigError::validation("template.url", e.to_string()))?;

        for (name, url) in &self.sources {
            Url::parse(url)
                .map_err(|e| ConfigError::validation(&format!("sources.{name}"), e.to_string()))?;
        }

        // Patterns must compile.
        self.build_filter()?;

        // No orphan region codes: every region a policy rule names must
        // exist in the keyword table.
        for code in self.policy.referenced_regions() {
            if !self.regions.keywords.contains_key(code) {
                return Err(ConfigError::validation(
                    "policy",
                    format!("rule references unknown region '{code}'"),
                ));
            }
        }

        Ok(())
    }

    fn build_filter(&self) -> Result<FilterConfig, ConfigError> {
        let banned: Vec<&str> = self
            .filter
            .banned_keywords
            .iter()
            .map(String::as_str)
            .collect();
        FilterConfig::new(&self.filter.high_rate_pattern, &banned)
            .map_err(|e| ConfigError::validation("filter", e.to_string()))
    }

    /// Assemble the core pipeline from the configured tables.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        Ok(Pipeline {
            filter: self.build_filter()?,
            regions: RegionTable::new(
                self.regions.keywords.clone(),
                self.regions.flags.clone(),
            ),
            health: self.health.clone(),
            policy: self.policy.clone(),
        })
    }

    /// The template URL, already validated.
    pub fn template_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.template.url)
            .map_err(|e| ConfigError::validation("template.url", e.to_string()))
    }

    /// Resolved `(name, url)` pairs for every configured source, in
    /// configuration order.
    pub fn source_urls(&self) -> Result<Vec<(String, Url)>, ConfigError> {
        self.sources
            .iter()
            .map(|(name, url)| {
                Url::parse(url)
                    .map(|u| (name.clone(), u))
                    .map_err(|e| ConfigError::validation(&format!("sources.{name}"), e.to_string()))
            })
            .collect()
    }
}

/// Scan the environment for `SUBWEAVER_SOURCE_<NAME>` variables, sorted by
/// name so the merge order is deterministic.
fn discover_sources() -> Vec<(String, String)> {
    let mut sources: Vec<(String, String)> = std::env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(SOURCE_ENV_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| (name.to_owned(), value))
        })
        .collect();
    sources.sort();
    sources
}
