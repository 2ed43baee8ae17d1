use std::path::Path;

use chrono::{DateTime, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::Encoder;

use super::error::Result;

fn encode_key(encoder_id: &str) -> Vec<u8> {
    format!("encoder:{encoder_id}").into_bytes()
}

/// Local registry of encoders known to this Aid deployment.
/// Distinct from [`super::encoder_cache::EncoderCache`]: this is the
/// authorization source of truth, admin-managed; the cache is a display-only
/// projection of the fleet-wide directory.
pub struct EncoderRegistry {
    keyspace: Keyspace,
    encoders: PartitionHandle,
    write_lock: Mutex<()>,
}

impl EncoderRegistry {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let keyspace = Config::new(path).open()?;
        let encoders = keyspace.open_partition("encoders", PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            encoders,
            write_lock: Mutex::new(()),
        })
    }

    pub async fn get(&self, encoder_id: &str) -> Result<Option<Encoder>> {
        match self.encoders.get(encode_key(encoder_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// True iff the encoder is registered and currently active. The only
    /// predicate the Identity Auth Middleware consults.
    pub async fn is_active(&self, encoder_id: &str) -> Result<bool> {
        Ok(self.get(encoder_id).await?.is_some_and(|e| e.is_active))
    }

    pub async fn upsert(&self, encoder: Encoder) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = encode_key(&encoder.encoder_id);
        let value = serde_json::to_vec(&encoder)?;
        self.encoders.insert(key, value)?;
        info!(encoder_id = %encoder.encoder_id, "encoder upserted");
        Ok(())
    }

    /// Flip `is_active` false without removing the row, preserving history.
    pub async fn deactivate(&self, encoder_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut encoder = match self.get(encoder_id).await? {
            Some(e) => e,
            None => return Ok(false),
        };
        encoder.is_active = false;
        let key = encode_key(encoder_id);
        let value = serde_json::to_vec(&encoder)?;
        self.encoders.insert(key, value)?;
        info!(encoder_id, "encoder deactivated");
        Ok(true)
    }

    pub async fn touch_last_seen(&self, encoder_id: &str, now: DateTime<Utc>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if let Some(mut encoder) = self.get(encoder_id).await? {
            encoder.last_seen = Some(now);
            let key = encode_key(encoder_id);
            let value = serde_json::to_vec(&encoder)?;
            self.encoders.insert(key, value)?;
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Encoder>> {
        let mut out = Vec::new();
        for item in self.encoders.iter() {
            let (_, value) = item?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}
