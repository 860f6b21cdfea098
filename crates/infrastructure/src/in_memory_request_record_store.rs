//! In-memory request record store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use attestra_application::{Clock, RequestRecordStore};
use attestra_core::{ActorId, AppResult};
use attestra_domain::RecordStage;


#[derive(Debug, Clone)]
struct StoredRecord {
    actor: ActorId,
    operation: String,
    stage: RecordStage,
    accepted_at: DateTime<Utc>,
}

/// In-memory implementation of the request record store port.
pub struct InMemoryRequestRecordStore {
    clock: Arc<dyn Clock>,
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryRequestRecordStore {
    /// Creates an empty store stamping records with the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Returns how many records currently sit in the given stage.
    pub async fn count_in_stage(&self, stage: RecordStage) -> usize {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| record.stage == stage)
            .count()
    }

    /// Returns the operations recorded for one actor with their stages.
    pub async fn operations_for(&self, actor: &ActorId) -> Vec<(String, RecordStage)> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| &record.actor == actor)
            .map(|record| (record.operation.clone(), record.stage))
            .collect()
    }
}

#[async_trait]
impl RequestRecordStore for InMemoryRequestRecordStore {
    async fn append(&self, actor: &ActorId, operation: &str) -> AppResult<()> {
        self.records.write().await.push(StoredRecord {
            actor: actor.clone(),
            operation: operation.to_owned(),
            stage: RecordStage::Active,
            accepted_at: self.clock.now(),
        });

        Ok(())
    }

    async fn mark_expired(&self, accepted_before: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let mut moved = 0;
        for record in records.iter_mut() {
            if record.stage == RecordStage::Active && record.accepted_at < accepted_before {
                record.stage = RecordStage::Expired;
                moved += 1;
            }
        }

        Ok(moved)
    }

    async fn mark_archived(&self, accepted_before: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let mut moved = 0;
        for record in records.iter_mut() {
            if record.stage.can_transition_to(RecordStage::Archived)
                && record.accepted_at < accepted_before
            {
                record.stage = RecordStage::Archived;
                moved += 1;
            }
        }

        Ok(moved)
    }

    async fn purge_deleted(&self, accepted_before: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.accepted_at >= accepted_before);

        Ok((before - records.len()) as u64)
    }
}
