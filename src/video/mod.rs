//! External video-record collaborator the Healer patches.
//!
//! The Aid core never owns this record; it is read and conditionally
//! patched through [`VideoRecordClient`], a trait-based collaborator with
//! an HTTP-backed implementation and an in-memory one for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::VideoRecord;

#[derive(Debug, Error)]
pub enum VideoClientError {
    #[error("video record request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("video record not found: {owner}/{permlink}")]
    NotFound { owner: String, permlink: String },
}

pub type Result<T> = std::result::Result<T, VideoClientError>;

/// A patch applied to a video record by the Healer.
#[derive(Debug, Clone)]
pub struct VideoRecordPatch {
    pub status: String,
    pub video_v2: String,
}

#[async_trait]
pub trait VideoRecordClient: Send + Sync {
    async fn get(&self, owner: &str, permlink: &str) -> Result<Option<VideoRecord>>;
    async fn patch(&self, owner: &str, permlink: &str, patch: VideoRecordPatch) -> Result<()>;
}

/// Production client over the external video service.
pub struct HttpVideoRecordClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVideoRecordClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl VideoRecordClient for HttpVideoRecordClient {
    async fn get(&self, owner: &str, permlink: &str) -> Result<Option<VideoRecord>> {
        let url = format!("{}/videos/{owner}/{permlink}", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let record = response.error_for_status()?.json().await?;
        Ok(Some(record))
    }

    async fn patch(&self, owner: &str, permlink: &str, patch: VideoRecordPatch) -> Result<()> {
        let url = format!("{}/videos/{owner}/{permlink}", self.base_url);
        self.client
            .patch(&url)
            .json(&serde_json::json!({
                "status": patch.status,
                "video_v2": patch.video_v2,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// In-memory fake for tests, keyed by `owner/permlink`.
#[derive(Default)]
pub struct InMemoryVideoRecordClient {
    records: Mutex<HashMap<String, VideoRecord>>,
}

impl InMemoryVideoRecordClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn key(owner: &str, permlink: &str) -> String {
        format!("{owner}/{permlink}")
    }

    pub async fn seed(&self, record: VideoRecord) {
        let key = Self::key(&record.owner, &record.permlink);
        self.records.lock().await.insert(key, record);
    }
}

#[async_trait]
impl VideoRecordClient for InMemoryVideoRecordClient {
    async fn get(&self, owner: &str, permlink: &str) -> Result<Option<VideoRecord>> {
        Ok(self.records.lock().await.get(&Self::key(owner, permlink)).cloned())
    }

    async fn patch(&self, owner: &str, permlink: &str, patch: VideoRecordPatch) -> Result<()> {
        let key = Self::key(owner, permlink);
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&key)
            .ok_or_else(|| VideoClientError::NotFound {
                owner: owner.to_string(),
                permlink: permlink.to_string(),
            })?;
        record.status = patch.status;
        record.video_v2 = Some(patch.video_v2);
        Ok(())
    }
}
