use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{self, DatabaseBackend};
use crate::config::{BackendConfig, FetchConfig};
use crate::error::FetchError;
use crate::metrics::FetchMetrics;

/// Asynchronous object fetcher. Configure it once with [`Fetcher::init`],
/// then issue retrievals with [`Fetcher::get`] or [`Fetcher::fetch`]; each
/// retrieval runs as an independent task with its own backend connection
/// and a configuration snapshot taken at task creation.
pub struct Fetcher {
    config: RwLock<Option<BackendConfig>>,
    backends: RwLock<HashMap<String, Arc<dyn DatabaseBackend>>>,
    pool: Arc<Semaphore>,
    metrics: Arc<FetchMetrics>,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            config: RwLock::new(None),
            backends: RwLock::new(backend::builtins()),
            pool: Arc::new(Semaphore::new(config.max_inflight)),
            metrics: Arc::new(FetchMetrics::new()),
        }
    }

    /// Make a backend implementation available under `name`. Registering an
    /// existing name replaces the previous implementation for tasks created
    /// afterwards.
    pub fn register_backend(&self, name: &str, backend: Arc<dyn DatabaseBackend>) {
        let mut backends = self
            .backends
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        backends.insert(name.to_string(), backend);
        info!("Registered backend '{}'", name);
    }

    pub fn metrics(&self) -> Arc<FetchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Set the backend connection parameters. Overwrites any previous
    /// configuration unconditionally; tasks already in flight keep the
    /// snapshot they were created with. Fails without touching the stored
    /// configuration if the backend type is empty or unregistered.
    pub fn init(&self, config: BackendConfig) -> Result<(), FetchError> {
        if config.backend.is_empty() {
            return Err(FetchError::InvalidArgument(
                "backend type must be a non-empty string",
            ));
        }
        {
            let backends = self
                .backends
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if !backends.contains_key(&config.backend) {
                return Err(FetchError::UnknownBackend(config.backend.clone()));
            }
        }

        info!(
            "Configured '{}' backend: {}/{}",
            config.backend, config.host, config.database
        );
        let mut slot = self
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(config);
        Ok(())
    }

    /// Fetch the JSON serialization of the object at `path` as of
    /// `timestamp`, delivering the outcome to `continuation`.
    ///
    /// Argument and configuration problems fail synchronously, before any
    /// task is spawned. Once a task is spawned the continuation is invoked
    /// exactly once, with `Ok(json)` or the backend error -- unless the
    /// returned handle is aborted first, in which case it is never invoked.
    pub fn get<F>(
        &self,
        path: &str,
        timestamp: i64,
        continuation: F,
    ) -> Result<RetrievalHandle, FetchError>
    where
        F: FnOnce(Result<String, FetchError>) + Send + 'static,
    {
        let (config, backend) = self.snapshot(path)?;
        let path = path.to_string();
        let pool = Arc::clone(&self.pool);
        let metrics = Arc::clone(&self.metrics);

        let inner = tokio::spawn(async move {
            let _permit = match pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // pool closed, nothing to deliver
            };

            metrics.task_started();
            debug!("Retrieval started: {} @ {}", path, timestamp);

            let result = run_task(backend, config, &path, timestamp).await;
            match &result {
                Ok(json) => {
                    metrics.task_completed();
                    debug!("Retrieval completed: {} ({} bytes)", path, json.len());
                }
                Err(e) => {
                    metrics.task_failed();
                    warn!("Retrieval failed: {}: {}", path, e);
                }
            }

            continuation(result);
        });

        Ok(RetrievalHandle {
            inner,
            metrics: Arc::clone(&self.metrics),
        })
    }

    /// Awaitable variant of [`Fetcher::get`] with the same checks and the
    /// same task body.
    pub async fn fetch(&self, path: &str, timestamp: i64) -> Result<String, FetchError> {
        let (tx, rx) = oneshot::channel();
        let _handle = self.get(path, timestamp, move |result| {
            let _ = tx.send(result);
        })?;

        match rx.await {
            Ok(result) => result,
            // The task died without delivering (panicked or was torn down).
            Err(_) => Err(FetchError::TaskFailed(
                "task terminated without delivering a result".to_string(),
            )),
        }
    }

    /// Synchronous preconditions plus the per-task snapshot of configuration
    /// and backend. Everything a task reads is resolved here, at creation.
    fn snapshot(
        &self,
        path: &str,
    ) -> Result<(BackendConfig, Arc<dyn DatabaseBackend>), FetchError> {
        if path.is_empty() {
            return Err(FetchError::InvalidArgument(
                "path must be a non-empty string",
            ));
        }

        let config = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(FetchError::NotConfigured)?;

        let backend = self
            .backends
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&config.backend)
            .cloned()
            .ok_or_else(|| FetchError::UnknownBackend(config.backend.clone()))?;

        Ok((config, backend))
    }
}

/// Task body: one connection, one retrieve, release on drop either way.
async fn run_task(
    backend: Arc<dyn DatabaseBackend>,
    config: BackendConfig,
    path: &str,
    timestamp: i64,
) -> Result<String, FetchError> {
    let mut conn = backend.connect(&config).await?;
    // Auxiliary metadata map, passed through empty.
    let metadata = HashMap::new();
    let json = conn.retrieve_json(path, timestamp, &metadata).await?;
    Ok(json)
}

/// Handle to one in-flight retrieval task.
pub struct RetrievalHandle {
    inner: JoinHandle<()>,
    metrics: Arc<FetchMetrics>,
}

impl RetrievalHandle {
    /// Cancel the task and wait for the cancellation to settle. An aborted
    /// task never invokes its continuation. Counts the abort only if the
    /// task was actually cancelled, not if it had already resolved.
    pub async fn abort(self) {
        self.inner.abort();
        if let Err(e) = self.inner.await {
            if e.is_cancelled() {
                self.metrics.task_aborted();
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait until the task has run to completion (or been aborted).
    pub async fn join(self) {
        let _ = self.inner.await;
    }
}
