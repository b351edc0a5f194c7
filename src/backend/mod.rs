pub mod memory;
pub mod sql;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BackendConfig;
use crate::error::BackendError;

pub use memory::MemoryBackend;
pub use sql::SqlBackend;

/// A database backend capable of opening sessions against a configured host.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    async fn connect(&self, config: &BackendConfig) -> Result<Box<dyn Connection>, BackendError>;
}

/// An open backend session. Owned by exactly one retrieval task: created at
/// task start, used for a single retrieve, dropped when the task finishes.
#[async_trait]
pub trait Connection: Send {
    async fn retrieve_json(
        &mut self,
        path: &str,
        timestamp: i64,
        metadata: &HashMap<String, String>,
    ) -> Result<String, BackendError>;
}

/// Backends available out of the box, keyed by the config `backend` string.
pub(crate) fn builtins() -> HashMap<String, Arc<dyn DatabaseBackend>> {
    let mut backends: HashMap<String, Arc<dyn DatabaseBackend>> = HashMap::new();
    backends.insert("memory".to_string(), Arc::new(MemoryBackend::new()));
    backends.insert("sql".to_string(), Arc::new(SqlBackend));
    backends
}
