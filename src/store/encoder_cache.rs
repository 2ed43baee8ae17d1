use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::EncoderDescriptor;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("cluster directory request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Read access to the fleet-wide node directory. Implemented over HTTP in
/// production and with an in-memory fake in tests.
#[async_trait]
pub trait ClusterDirectoryClient: Send + Sync {
    async fn fetch(&self, encoder_id: &str) -> Result<Option<EncoderDescriptor>, DirectoryError>;
}

/// Cluster directory reached over HTTP, one descriptor per request.
pub struct HttpClusterDirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClusterDirectoryClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ClusterDirectoryClient for HttpClusterDirectoryClient {
    async fn fetch(&self, encoder_id: &str) -> Result<Option<EncoderDescriptor>, DirectoryError> {
        let url = format!("{}/encoders/{encoder_id}", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let descriptor = response.error_for_status()?.json().await?;
        Ok(Some(descriptor))
    }
}

/// Display-only read-through cache over the fleet-wide encoder directory.
/// Entries never expire on their own; a miss or a stale
/// read is refreshed on demand via [`EncoderCache::refresh`]. Never
/// consulted for authorization — only [`super::encoder_registry::EncoderRegistry`] is.
pub struct EncoderCache {
    client: Arc<dyn ClusterDirectoryClient>,
    entries: RwLock<HashMap<String, EncoderDescriptor>>,
}

impl EncoderCache {
    pub fn new(client: Arc<dyn ClusterDirectoryClient>) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, encoder_id: &str) -> Option<EncoderDescriptor> {
        self.entries.read().await.get(encoder_id).cloned()
    }

    /// Force a directory lookup and replace the cached entry, if any.
    /// Directory failures are logged and swallowed: a stale or missing
    /// descriptor never blocks dispatch, since this cache is display-only.
    pub async fn refresh(&self, encoder_id: &str) -> Option<EncoderDescriptor> {
        match self.client.fetch(encoder_id).await {
            Ok(Some(descriptor)) => {
                debug!(encoder_id, "cluster directory entry refreshed");
                self.entries
                    .write()
                    .await
                    .insert(encoder_id.to_string(), descriptor.clone());
                Some(descriptor)
            }
            Ok(None) => {
                self.entries.write().await.remove(encoder_id);
                None
            }
            Err(err) => {
                warn!(encoder_id, error = %err, "cluster directory lookup failed");
                self.entries.read().await.get(encoder_id).cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDirectory {
        known: HashMap<String, EncoderDescriptor>,
    }

    #[async_trait]
    impl ClusterDirectoryClient for FakeDirectory {
        async fn fetch(&self, encoder_id: &str) -> Result<Option<EncoderDescriptor>, DirectoryError> {
            Ok(self.known.get(encoder_id).cloned())
        }
    }

    #[tokio::test]
    async fn refresh_populates_cache() {
        let descriptor = EncoderDescriptor {
            encoder_id: "did:example:enc-a".into(),
            display_name: "Encoder A".into(),
            region: Some("us-east".into()),
        };
        let mut known = HashMap::new();
        known.insert(descriptor.encoder_id.clone(), descriptor.clone());

        let cache = EncoderCache::new(Arc::new(FakeDirectory { known }));
        assert!(cache.get(&descriptor.encoder_id).await.is_none());

        let refreshed = cache.refresh(&descriptor.encoder_id).await;
        assert_eq!(refreshed, Some(descriptor.clone()));
        assert_eq!(cache.get(&descriptor.encoder_id).await, Some(descriptor));
    }

    #[tokio::test]
    async fn refresh_removes_entries_directory_no_longer_knows() {
        let cache = EncoderCache::new(Arc::new(FakeDirectory { known: HashMap::new() }));
        let missing = cache.refresh("did:example:ghost").await;
        assert!(missing.is_none());
    }
}
