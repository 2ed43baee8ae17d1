//! Persistence layer: the Job Store Gateway, the local encoder registry,
//! and the read-through fleet directory cache.

mod encoder_cache;
mod encoder_registry;
mod error;
mod handle;
mod job_store;

pub use encoder_cache::{ClusterDirectoryClient, DirectoryError, EncoderCache, HttpClusterDirectoryClient};
pub use encoder_registry::EncoderRegistry;
pub use error::{Result, StoreError};
pub use handle::StoreHandle;
pub use job_store::JobStore;
