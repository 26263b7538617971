use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum MasteryError {
    #[error("invalid attempt: {0}")]
    InvalidAttempt(String),

    #[error("invalid record for topic {topic_id}: {reason}")]
    InvalidRecord { topic_id: String, reason: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The new configuration is already active in memory when this is returned.
    #[error("config persistence failed: {0}")]
    ConfigPersist(#[from] StoreError),
}

pub type MasteryResult<T> = Result<T, MasteryError>;
