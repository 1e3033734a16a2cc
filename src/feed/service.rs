use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;

use super::{merge, render};
use crate::domain::*;
use crate::kinds::DiffPolicy;
use crate::source::{HistorySource, MemoryHistoryStore, SourceError, UserDirectory};

#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Invalid user_id: {0}")]
    InvalidInput(String),
    #[error("User with id {0} does not exist")]
    UserNotFound(i64),
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type ActivityResult<T> = Result<T, ActivityError>;

/// Outcome of a feed request as printed by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedReport {
    Feed(FeedEnvelope),
    /// The caller asked for something invalid; the body carries the reason.
    Rejected(ErrorBody),
}

impl FeedReport {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Feed(_))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        match self {
            Self::Feed(envelope) => serde_json::to_string_pretty(envelope),
            Self::Rejected(body) => serde_json::to_string_pretty(body),
        }
    }
}

/// Parse a caller-supplied user id. Missing, blank, zero and non-numeric
/// values are all rejected.
pub fn parse_user_id(raw: Option<&str>) -> ActivityResult<i64> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ActivityError::InvalidInput("missing user id".to_string()));
    }
    match raw.parse::<i64>() {
        Ok(0) => Err(ActivityError::InvalidInput("0".to_string())),
        Ok(id) => Ok(id),
        Err(_) => Err(ActivityError::InvalidInput(format!(
            "expected an integer, got '{}'",
            raw
        ))),
    }
}

/// Builds a user's activity feed from every registered revision log.
pub struct ActivityService {
    sources: Vec<Arc<dyn HistorySource>>,
    users: Arc<dyn UserDirectory>,
    policy: DiffPolicy,
}

impl ActivityService {
    pub fn new(sources: Vec<Arc<dyn HistorySource>>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            sources,
            users,
            policy: DiffPolicy::default(),
        }
    }

    pub fn from_store(store: Arc<MemoryHistoryStore>) -> Self {
        Self::new(store.sources(), store)
    }

    pub fn with_policy(mut self, policy: DiffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn get_user_activities(
        &self,
        raw_user_id: Option<&str>,
    ) -> ActivityResult<Vec<ActivityDescription>> {
        let user_id = parse_user_id(raw_user_id).inspect_err(|e| {
            tracing::warn!("rejected activity request: {}", e);
        })?;
        self.activities_for(user_id).await
    }

    /// Like [`get_user_activities`](Self::get_user_activities), but caller
    /// mistakes become a [`FeedReport::Rejected`] instead of an error.
    pub async fn feed_report(&self, raw_user_id: &str) -> ActivityResult<FeedReport> {
        match self.get_user_activities(Some(raw_user_id)).await {
            Ok(activities) => Ok(FeedReport::Feed(FeedEnvelope::new(activities))),
            Err(e @ (ActivityError::InvalidInput(_) | ActivityError::UserNotFound(_))) => {
                Ok(FeedReport::Rejected(ErrorBody::new(e.to_string())))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn activities_for(&self, user_id: i64) -> ActivityResult<Vec<ActivityDescription>> {
        if user_id == 0 {
            return Err(ActivityError::InvalidInput("0".to_string()));
        }
        if !self.users.user_exists(user_id).await? {
            tracing::warn!("activity requested for unknown user {}", user_id);
            return Err(ActivityError::UserNotFound(user_id));
        }

        // Sources are read independently; a feed may mix slightly different
        // moments of each log.
        let streams = try_join_all(
            self.sources
                .iter()
                .map(|source| source.revisions_for_user(user_id)),
        )
        .await?;
        let records = merge(streams);

        let timelines = self.timelines_for_updates(&records).await?;
        let activities: Vec<ActivityDescription> = records
            .iter()
            .map(|record| {
                let timeline = timelines
                    .get(&(record.entity_type, record.entity_id))
                    .map(Vec::as_slice);
                render(record, timeline, &self.policy)
            })
            .collect();

        tracing::debug!(
            "rendered {} activities for user {}",
            activities.len(),
            user_id
        );
        Ok(activities)
    }

    async fn timelines_for_updates(
        &self,
        records: &[HistoryRecord],
    ) -> ActivityResult<HashMap<(EntityType, i64), Vec<HistoryRecord>>> {
        let mut timelines = HashMap::new();
        for record in records {
            if record.revision_type != RevisionType::Updated {
                continue;
            }
            let key = (record.entity_type, record.entity_id);
            if timelines.contains_key(&key) {
                continue;
            }
            let Some(source) = self.source_for(record.entity_type) else {
                continue;
            };
            let timeline = source.revisions_for_entity(record.entity_id).await?;
            timelines.insert(key, timeline);
        }
        Ok(timelines)
    }

    fn source_for(&self, kind: EntityType) -> Option<&Arc<dyn HistorySource>> {
        self.sources.iter().find(|source| source.entity_type() == kind)
    }
}
