// Subscription source fetcher
//
// Fan-out over every configured source; each fetch is independent and a
// failure (network, status, malformed payload) only costs that source its
// contribution. Feeds come in two shapes: a bare JSON array of nodes, or a
// full sing-box document whose `outbounds` list holds the nodes.

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use subweaver_core::Node;

use crate::error::FetchError;
use crate::transport::{TransportConfig, cache_buster};

/// One configured subscription origin.
#[derive(Debug, Clone)]
pub struct SourceEndpoint {
    /// Name derived from the configuration key; becomes part of the
    /// synthesized group labels.
    pub name: String,
    pub url: Url,
}

/// The two payload shapes subscription providers serve.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubscriptionPayload {
    List(Vec<Node>),
    Document {
        #[serde(default)]
        outbounds: Vec<Node>,
    },
}

impl SubscriptionPayload {
    fn into_nodes(self) -> Vec<Node> {
        match self {
            Self::List(nodes) | Self::Document { outbounds: nodes } => nodes,
        }
    }
}

/// Client for subscription source fetches.
pub struct SourceClient {
    http: reqwest::Client,
}

impl SourceClient {
    pub fn new(transport: &TransportConfig) -> Result<Self, FetchError> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// Create a source client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch every source concurrently and wait for all of them to settle.
    ///
    /// Failed or empty sources are absent from the result; the map preserves
    /// the endpoint order, which fixes the cross-source merge order
    /// downstream.
    pub async fn fetch_all(&self, endpoints: &[SourceEndpoint]) -> IndexMap<String, Vec<Node>> {
        let fetches = endpoints.iter().map(|endpoint| self.fetch_one(endpoint));
        let results = join_all(fetches).await;

        let mut sources = IndexMap::with_capacity(endpoints.len());
        for (endpoint, result) in endpoints.iter().zip(results) {
            match result {
                Ok(nodes) if !nodes.is_empty() => {
                    debug!(source = %endpoint.name, nodes = nodes.len(), "source fetched");
                    sources.insert(endpoint.name.clone(), nodes);
                }
                Ok(_) => {
                    debug!(source = %endpoint.name, "source returned no nodes");
                }
                Err(err) => {
                    warn!(source = %endpoint.name, error = %err, "source fetch failed; skipping");
                }
            }
        }
        sources
    }

    /// Fetch one source's raw node list.
    async fn fetch_one(&self, endpoint: &SourceEndpoint) -> Result<Vec<Node>, FetchError> {
        let mut url = endpoint.url.clone();
        url.query_pairs_mut().append_pair("t", &cache_buster());

        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: endpoint.url.to_string(),
            });
        }

        let body = resp.text().await.map_err(FetchError::Transport)?;
        let payload: SubscriptionPayload =
            serde_json::from_str(&body).map_err(|e| FetchError::deserialization(&e, &body))?;

        Ok(payload.into_nodes())
    }
}
