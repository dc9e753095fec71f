// Template fetcher
//
// Retrieves the base routing template. Failure here is fatal to the whole
// request -- no partial document is ever produced from a missing template.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use subweaver_core::Template;

use crate::error::FetchError;
use crate::transport::{TransportConfig, cache_buster};

/// Client for the base template document.
///
/// When a token is configured the request carries `Authorization: token ...`
/// and asks for the raw media type, which is what a private GitHub raw URL
/// expects.
pub struct TemplateClient {
    http: reqwest::Client,
    url: Url,
    token: Option<SecretString>,
}

impl TemplateClient {
    pub fn new(
        url: Url,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            http: transport.build_client()?,
            url,
            token,
        })
    }

    /// Create a template client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(url: &str, http: reqwest::Client) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            url: Url::parse(url)?,
            token: None,
        })
    }

    /// Fetch and parse the template. Any error is fatal to the caller.
    pub async fn fetch(&self) -> Result<Template, FetchError> {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("t", &cache_buster());

        debug!("GET {}", url);

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github.v3.raw");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token.expose_secret()));
        }

        let resp = request.send().await.map_err(FetchError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = resp.text().await.map_err(FetchError::Transport)?;
        serde_json::from_str(&body).map_err(|e| FetchError::deserialization(&e, &body))
    }
}
