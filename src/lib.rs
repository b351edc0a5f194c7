pub mod backend;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod metrics;

pub use backend::{Connection, DatabaseBackend};
pub use config::{BackendConfig, FetchConfig};
pub use error::{BackendError, FetchError};
pub use fetcher::{Fetcher, RetrievalHandle};
