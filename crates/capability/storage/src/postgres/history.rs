//! Postgres 状态历史存储实现
//!
//! 追加型表，按 (device_id, timestamp_ms) 建复合索引。

use crate::error::StorageError;
use crate::models::StateHistoryRecord;
use crate::traits::StateHistoryStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgStateHistoryStore {
    pub pool: PgPool,
}

impl PgStateHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<StateHistoryRecord, StorageError> {
    let state_text: String = row.try_get("state")?;
    let details_text: Option<String> = row.try_get("details")?;
    let details = match details_text {
        Some(text) => Some(serde_json::from_str(&text)?),
        None => None,
    };
    Ok(StateHistoryRecord {
        history_id: row.try_get("history_id")?,
        device_id: row.try_get("device_id")?,
        device_type: row.try_get("device_type")?,
        state: serde_json::from_str(&state_text)?,
        reason: row.try_get("reason")?,
        details,
        timestamp_ms: row.try_get("timestamp_ms")?,
    })
}

const HISTORY_COLUMNS: &str =
    "history_id, device_id, device_type, state, reason, details, timestamp_ms";

#[async_trait::async_trait]
impl StateHistoryStore for PgStateHistoryStore {
    async fn append_history(&self, record: StateHistoryRecord) -> Result<(), StorageError> {
        let state_text = serde_json::to_string(&record.state)?;
        let details_text = match &record.details {
            Some(details) => Some(serde_json::to_string(details)?),
            None => None,
        };
        sqlx::query(
            "insert into device_state_history \
             (history_id, device_id, device_type, state, reason, details, timestamp_ms) \
             values ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&record.history_id)
        .bind(&record.device_id)
        .bind(&record.device_type)
        .bind(&state_text)
        .bind(&record.reason)
        .bind(&details_text)
        .bind(record.timestamp_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_history(
        &self,
        device_id: &str,
    ) -> Result<Option<StateHistoryRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {HISTORY_COLUMNS} from device_state_history \
             where device_id = $1 order by timestamp_ms desc limit 1",
        ))
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }

    async fn list_history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<StateHistoryRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {HISTORY_COLUMNS} from device_state_history \
             where device_id = $1 order by timestamp_ms desc limit $2",
        ))
        .bind(device_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(record_from_row(&row)?);
        }
        Ok(items)
    }
}
