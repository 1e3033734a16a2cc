use async_trait::async_trait;
use thiserror::Error;

use crate::domain::*;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unknown model: {0}")]
    UnknownModel(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read access to one entity type's revision log.
#[async_trait]
pub trait HistorySource: Send + Sync {
    fn entity_type(&self) -> EntityType;

    /// Revisions attributable to `user_id`, in no particular order.
    /// Unknown users yield an empty list.
    async fn revisions_for_user(&self, user_id: i64) -> SourceResult<Vec<HistoryRecord>>;

    /// Every revision of one entity, whoever caused it.
    async fn revisions_for_entity(&self, entity_id: i64) -> SourceResult<Vec<HistoryRecord>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: i64) -> SourceResult<bool>;
}
