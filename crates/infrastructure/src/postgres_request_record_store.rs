//! PostgreSQL-backed request record store using the `request_records`
//! table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attestra_application::RequestRecordStore;
use attestra_core::{ActorId, AppError, AppResult};
use attestra_domain::RecordStage;

/// PostgreSQL implementation of the request record store port.
///
/// Expects a `request_records` table with `id uuid`, `actor_id text`,
/// `operation text`, `stage text` and `accepted_at timestamptz` columns.
/// Stage transitions are plain `UPDATE`s guarded by the current stage, so
/// a record can only ever move forward.
#[derive(Clone)]
pub struct PostgresRequestRecordStore {
    pool: PgPool,
}

impl PostgresRequestRecordStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRecordStore for PostgresRequestRecordStore {
    async fn append(&self, actor: &ActorId, operation: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO request_records (id, actor_id, operation, stage, accepted_at)
            VALUES ($1, $2, $3, $4, now())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.as_str())
        .bind(operation)
        .bind(RecordStage::Active.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append request record: {error}")))?;

        Ok(())
    }

    async fn mark_expired(&self, accepted_before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE request_records
            SET stage = $1
            WHERE stage = $2 AND accepted_at < $3
            "#,
        )
        .bind(RecordStage::Expired.as_str())
        .bind(RecordStage::Active.as_str())
        .bind(accepted_before)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to expire request records: {error}")))?;

        Ok(result.rows_affected())
    }

    async fn mark_archived(&self, accepted_before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE request_records
            SET stage = $1
            WHERE stage <> $1 AND accepted_at < $2
            "#,
        )
        .bind(RecordStage::Archived.as_str())
        .bind(accepted_before)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to archive request records: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    async fn purge_deleted(&self, accepted_before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM request_records
            WHERE accepted_at < $1
            "#,
        )
        .bind(accepted_before)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to purge request records: {error}")))?;

        Ok(result.rows_affected())
    }
}
