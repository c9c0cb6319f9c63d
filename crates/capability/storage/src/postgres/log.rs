//! Postgres 设备日志存储实现

use crate::error::StorageError;
use crate::models::DeviceLogRecord;
use crate::traits::DeviceLogStore;
use domain::{LogLevel, LogType};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgDeviceLogStore {
    pub pool: PgPool,
}

impl PgDeviceLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<DeviceLogRecord, StorageError> {
    let level_text: String = row.try_get("level")?;
    let type_text: String = row.try_get("log_type")?;
    let details_text: Option<String> = row.try_get("details")?;
    let details = match details_text {
        Some(text) => Some(serde_json::from_str(&text)?),
        None => None,
    };
    Ok(DeviceLogRecord {
        log_id: row.try_get("log_id")?,
        device_id: row.try_get("device_id")?,
        device_type: row.try_get("device_type")?,
        level: LogLevel::parse(&level_text)
            .ok_or_else(|| StorageError::new(format!("invalid log level: {level_text}")))?,
        log_type: LogType::parse(&type_text)
            .ok_or_else(|| StorageError::new(format!("invalid log type: {type_text}")))?,
        message: row.try_get("message")?,
        details,
        timestamp_ms: row.try_get("timestamp_ms")?,
    })
}

#[async_trait::async_trait]
impl DeviceLogStore for PgDeviceLogStore {
    async fn append_log(&self, record: DeviceLogRecord) -> Result<(), StorageError> {
        let details_text = match &record.details {
            Some(details) => Some(serde_json::to_string(details)?),
            None => None,
        };
        sqlx::query(
            "insert into device_logs \
             (log_id, device_id, device_type, level, log_type, message, details, timestamp_ms) \
             values ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&record.log_id)
        .bind(&record.device_id)
        .bind(&record.device_type)
        .bind(record.level.as_str())
        .bind(record.log_type.as_str())
        .bind(&record.message)
        .bind(&details_text)
        .bind(record.timestamp_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_logs(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<DeviceLogRecord>, StorageError> {
        let rows = sqlx::query(
            "select log_id, device_id, device_type, level, log_type, message, details, timestamp_ms \
             from device_logs where device_id = $1 order by timestamp_ms desc limit $2",
        )
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
