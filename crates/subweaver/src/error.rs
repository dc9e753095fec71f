use thiserror::Error;

/// Startup errors for the server binary. Request-path errors are mapped to
/// HTTP statuses in the router instead.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] subweaver_config::ConfigError),

    #[error("client construction failed: {0}")]
    Client(#[from] subweaver_api::FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
