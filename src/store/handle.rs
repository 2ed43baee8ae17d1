use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{error, info};

use super::error::{Result, StoreError};
use super::job_store::JobStore;

/// Indirection the Process Supervisor uses to connect the job store in the
/// background without blocking transport startup. Before the connect
/// attempt completes (or if it times out) every operation fails open with
/// [`StoreError::Unavailable`] instead of blocking the caller.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<RwLock<Option<Arc<JobStore>>>>,
}

impl StoreHandle {
    /// Already-open store, for tests and callers that don't need the
    /// background-connect behavior.
    pub fn ready(store: JobStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(store)))),
        }
    }

    /// Spawns the store open on a blocking thread with a connect budget.
    /// Returns immediately; the handle reports `Unavailable` until the
    /// open succeeds, and stays `Unavailable` forever if it times out or
    /// errors (the process keeps running regardless).
    pub fn connecting(path: PathBuf, budget: Duration) -> Self {
        let inner = Arc::new(RwLock::new(None));
        let slot = inner.clone();

        tokio::spawn(async move {
            let attempt = tokio::time::timeout(budget, tokio::task::spawn_blocking(move || JobStore::open(path)));

            match attempt.await {
                Ok(Ok(Ok(store))) => {
                    *slot.write().await = Some(Arc::new(store));
                    info!("job store connected");
                }
                Ok(Ok(Err(err))) => error!(error = %err, "job store failed to open"),
                Ok(Err(join_err)) => error!(error = %join_err, "job store open task panicked"),
                Err(_) => error!("job store connection exceeded its startup budget; operations will fail open as unavailable"),
            }
        });

        Self { inner }
    }

    pub async fn get(&self) -> Result<Arc<JobStore>> {
        self.inner.read().await.clone().ok_or(StoreError::Unavailable)
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
