use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered encoder node, keyed by its decentralized identifier (DID).
///
/// Identity is asserted, not cryptographically verified.
/// Only `is_active` encoders may pass authorization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Encoder {
    pub encoder_id: String,
    pub name: String,
    pub owner: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Encoder {
    pub fn new(encoder_id: impl Into<String>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            encoder_id: encoder_id.into(),
            name: name.into(),
            owner: owner.into(),
            is_active: true,
            created_at: Utc::now(),
            last_seen: None,
        }
    }
}

/// Denormalized projection of a fleet-wide encoder descriptor, as served by
/// the remote cluster node directory. Display-only; never consulted for
/// authorization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderDescriptor {
    pub encoder_id: String,
    pub display_name: String,
    pub region: Option<String>,
}
