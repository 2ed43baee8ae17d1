use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("job store is not connected")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, StoreError>;
