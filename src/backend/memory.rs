use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::backend::{Connection, DatabaseBackend};
use crate::config::BackendConfig;
use crate::error::BackendError;

/// One object version in a seed file: `object` becomes valid at `valid_from`
/// and stays valid until a later version supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEntry {
    pub path: String,
    pub valid_from: i64,
    pub object: serde_json::Value,
}

/// In-memory backend holding JSON object versions per path. A retrieve at
/// timestamp `t` returns the version with the greatest `valid_from <= t`.
pub struct MemoryBackend {
    objects: Arc<Mutex<HashMap<String, Vec<(i64, String)>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn insert(&self, path: &str, valid_from: i64, json: impl Into<String>) {
        let mut objects = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let versions = objects.entry(path.to_string()).or_default();
        versions.push((valid_from, json.into()));
        versions.sort_by_key(|(from, _)| *from);
    }

    /// Load a JSON array of [`SeedEntry`] values from disk.
    pub fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<SeedEntry> = serde_json::from_str(&content)?;

        let backend = Self::new();
        for entry in &entries {
            backend.insert(&entry.path, entry.valid_from, entry.object.to_string());
        }
        tracing::info!("Seeded memory backend with {} object versions", entries.len());
        Ok(backend)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DatabaseBackend for MemoryBackend {
    async fn connect(
        &self,
        _config: &BackendConfig,
    ) -> Result<Box<dyn Connection>, BackendError> {
        Ok(Box::new(MemoryConnection {
            objects: Arc::clone(&self.objects),
        }))
    }
}

struct MemoryConnection {
    objects: Arc<Mutex<HashMap<String, Vec<(i64, String)>>>>,
}

#[async_trait::async_trait]
impl Connection for MemoryConnection {
    async fn retrieve_json(
        &mut self,
        path: &str,
        timestamp: i64,
        _metadata: &HashMap<String, String>,
    ) -> Result<String, BackendError> {
        let objects = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        objects
            .get(path)
            .and_then(|versions| {
                versions
                    .iter()
                    .rev()
                    .find(|(valid_from, _)| *valid_from <= timestamp)
            })
            .map(|(_, json)| json.clone())
            .ok_or_else(|| BackendError::NotFound {
                path: path.to_string(),
                timestamp,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn retrieve(backend: &MemoryBackend, path: &str, timestamp: i64) -> Result<String, BackendError> {
        let mut conn = backend
            .connect(&BackendConfig::default())
            .await
            .unwrap();
        conn.retrieve_json(path, timestamp, &HashMap::new()).await
    }

    #[tokio::test]
    async fn picks_latest_version_valid_at_timestamp() {
        let backend = MemoryBackend::new();
        backend.insert("qc/TEST/obj1", 100, r#"{"rev":1}"#);
        backend.insert("qc/TEST/obj1", 500, r#"{"rev":2}"#);
        backend.insert("qc/TEST/obj1", 2000, r#"{"rev":3}"#);

        assert_eq!(retrieve(&backend, "qc/TEST/obj1", 1000).await.unwrap(), r#"{"rev":2}"#);
        assert_eq!(retrieve(&backend, "qc/TEST/obj1", 2000).await.unwrap(), r#"{"rev":3}"#);
        assert_eq!(retrieve(&backend, "qc/TEST/obj1", 100).await.unwrap(), r#"{"rev":1}"#);
    }

    #[tokio::test]
    async fn timestamp_before_all_versions_is_not_found() {
        let backend = MemoryBackend::new();
        backend.insert("qc/TEST/obj1", 100, r#"{"rev":1}"#);

        let err = retrieve(&backend, "qc/TEST/obj1", 99).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound { timestamp: 99, .. }));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let backend = MemoryBackend::new();
        let err = retrieve(&backend, "qc/TEST/missing", 1000).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }
}
