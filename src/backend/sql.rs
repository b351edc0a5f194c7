use crate::backend::{Connection, DatabaseBackend};
use crate::config::BackendConfig;
use crate::error::BackendError;

/// Placeholder until a real SQL backend lands. Connecting fails like any
/// other backend failure so callers still get their continuation invoked.
pub struct SqlBackend;

#[async_trait::async_trait]
impl DatabaseBackend for SqlBackend {
    async fn connect(
        &self,
        _config: &BackendConfig,
    ) -> Result<Box<dyn Connection>, BackendError> {
        Err(BackendError::Connect(
            "sql backend not yet implemented".to_string(),
        ))
    }
}
