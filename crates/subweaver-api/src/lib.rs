// subweaver-api: async fetch layer between remote documents and the core
// pipeline. Template fetch failures are fatal to a request; per-source
// subscription failures are isolated and logged.

pub mod error;
pub mod sources;
pub mod template;
pub mod transport;

pub use error::FetchError;
pub use sources::{SourceClient, SourceEndpoint};
pub use template::TemplateClient;
pub use transport::TransportConfig;
