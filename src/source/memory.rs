use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{HistorySource, SourceError, SourceResult, UserDirectory};
use crate::domain::*;
use crate::kinds::{kind_spec, KindSpec};

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    users: Vec<i64>,
    #[serde(default)]
    revisions: Vec<serde_json::Value>,
}

/// Revision logs held in memory, grouped by entity type.
///
/// Read-only once built; share it behind an `Arc` and hand out one
/// [`RevisionLogSource`] per entity type via [`MemoryHistoryStore::sources`].
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    users: BTreeSet<i64>,
    logs: HashMap<EntityType, Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.users.insert(user_id);
        self
    }

    pub fn with_record(mut self, record: HistoryRecord) -> Self {
        self.push(record);
        self
    }

    pub fn push(&mut self, record: HistoryRecord) {
        self.logs.entry(record.entity_type).or_default().push(record);
    }

    pub fn from_json(content: &str) -> SourceResult<Self> {
        let fixture: Fixture =
            serde_json::from_str(content).map_err(|e| SourceError::Parse(e.to_string()))?;

        let mut store = Self::new();
        store.users.extend(fixture.users);

        for raw in fixture.revisions {
            let model = raw
                .get("model")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
                .ok_or_else(|| SourceError::Parse("revision without a model".to_string()))?;
            if EntityType::from_model_name(&model).is_none() {
                return Err(SourceError::UnknownModel(model));
            }
            let record: HistoryRecord = serde_json::from_value(raw)
                .map_err(|e| SourceError::Parse(format!("invalid {} revision: {}", model, e)))?;
            store.push(record);
        }

        Ok(store)
    }

    pub async fn load(path: &Path) -> SourceResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json(&content)?;
        tracing::info!(
            "Loaded {} revisions for {} users from {}",
            store.revision_count(),
            store.users.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn revision_count(&self) -> usize {
        self.logs.values().map(Vec::len).sum()
    }

    fn log(&self, kind: EntityType) -> &[HistoryRecord] {
        self.logs.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// One adapter per registered entity type, in registry order.
    pub fn sources(self: &Arc<Self>) -> Vec<Arc<dyn HistorySource>> {
        EntityType::ALL
            .into_iter()
            .map(|kind| {
                Arc::new(RevisionLogSource {
                    spec: kind_spec(kind),
                    store: Arc::clone(self),
                }) as Arc<dyn HistorySource>
            })
            .collect()
    }
}

#[async_trait]
impl UserDirectory for MemoryHistoryStore {
    async fn user_exists(&self, user_id: i64) -> SourceResult<bool> {
        Ok(self.users.contains(&user_id))
    }
}

/// Adapter over one entity type's log inside a [`MemoryHistoryStore`].
pub struct RevisionLogSource {
    spec: &'static KindSpec,
    store: Arc<MemoryHistoryStore>,
}

#[async_trait]
impl HistorySource for RevisionLogSource {
    fn entity_type(&self) -> EntityType {
        self.spec.id
    }

    async fn revisions_for_user(&self, user_id: i64) -> SourceResult<Vec<HistoryRecord>> {
        Ok(self
            .store
            .log(self.spec.id)
            .iter()
            .filter(|record| self.spec.subject_of(record) == Some(user_id))
            .cloned()
            .collect())
    }

    async fn revisions_for_entity(&self, entity_id: i64) -> SourceResult<Vec<HistoryRecord>> {
        Ok(self
            .store
            .log(self.spec.id)
            .iter()
            .filter(|record| record.entity_id == entity_id)
            .cloned()
            .collect())
    }
}
