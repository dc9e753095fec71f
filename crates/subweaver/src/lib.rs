// subweaver: HTTP front end over the aggregation pipeline.

pub mod error;
pub mod router;
pub mod state;

pub use error::ServerError;
pub use state::AppState;
