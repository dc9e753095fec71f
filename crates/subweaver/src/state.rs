// Shared request state: the configured pipeline plus the two fetch clients.

use std::sync::Arc;

use secrecy::SecretString;

use subweaver_api::{SourceClient, SourceEndpoint, TemplateClient, TransportConfig};
use subweaver_config::Config;
use subweaver_core::Pipeline;

use crate::error::ServerError;

/// Everything a request needs, built once at startup. All of it is read-only
/// per invocation, so a plain `Arc` is enough.
pub struct AppState {
    pub token: SecretString,
    pub pipeline: Pipeline,
    pub template: TemplateClient,
    pub sources: SourceClient,
    pub endpoints: Vec<SourceEndpoint>,
}

impl AppState {
    /// Build the state from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Arc<Self>, ServerError> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| subweaver_config::ConfigError::Validation {
                field: "token".to_owned(),
                reason: "no credential configured".to_owned(),
            })?;

        let template = TemplateClient::new(
            config.template_url()?,
            config.template.token.clone(),
            &TransportConfig::default(),
        )?;

        let sources = SourceClient::new(&TransportConfig::for_sources())?;
        let endpoints = config
            .source_urls()?
            .into_iter()
            .map(|(name, url)| SourceEndpoint { name, url })
            .collect();

        Ok(Arc::new(Self {
            token,
            pipeline: config.build_pipeline()?,
            template,
            sources,
            endpoints,
        }))
    }
}
