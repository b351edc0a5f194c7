use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use anyhow::Result;

/// Upper bound on concurrently executing retrieval tasks.
pub const DEFAULT_MAX_INFLIGHT: usize = 64;

/// Connection parameters for the database backend. Set once via
/// `Fetcher::init` and snapshotted by every task at creation; a later
/// `init` replaces the whole struct (last write wins, no merge).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub backend: String,
    pub host: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

// Scalar fields first so the TOML serializer emits them before the
// [backend] table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub max_inflight: usize,
    /// Optional JSON file preloaded into the memory backend at startup.
    pub seed_file: Option<PathBuf>,
    pub backend: BackendConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_inflight: DEFAULT_MAX_INFLIGHT,
            seed_file: None,
            backend: BackendConfig {
                backend: "memory".to_string(),
                ..BackendConfig::default()
            },
        }
    }
}

impl FetchConfig {
    pub fn load_or_create(config_path: Option<&str>) -> Result<Self> {
        let config_file = config_path.unwrap_or("qcfetch.toml");

        if std::path::Path::new(config_file).exists() {
            let content = std::fs::read_to_string(config_file)?;
            let config: FetchConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(config_file)?;
            tracing::info!("Created default config: {}", config_file);
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_toml() {
        let config = FetchConfig {
            max_inflight: 8,
            seed_file: Some(PathBuf::from("seed.json")),
            backend: BackendConfig {
                backend: "sql".to_string(),
                host: "db.example.org".to_string(),
                database: "qc_production".to_string(),
                username: "qc_reader".to_string(),
                password: "secret".to_string(),
            },
        };

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: FetchConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed.backend, config.backend);
        assert_eq!(parsed.max_inflight, 8);
        assert_eq!(parsed.seed_file, config.seed_file);
    }

    #[test]
    fn default_config_uses_memory_backend() {
        let config = FetchConfig::default();
        assert_eq!(config.backend.backend, "memory");
        assert_eq!(config.max_inflight, DEFAULT_MAX_INFLIGHT);
        assert!(config.seed_file.is_none());
    }
}
