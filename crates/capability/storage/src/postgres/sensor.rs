//! Postgres 传感器数据存储实现
//!
//! 类型特定字段以稀疏 JSON 文本存储；运行时长与能效单独建列，
//! 支持"最近一条带运行时长的记录"查询。

use crate::error::StorageError;
use crate::models::SensorDataRecord;
use crate::traits::SensorDataStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgSensorDataStore {
    pub pool: PgPool,
}

impl PgSensorDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<SensorDataRecord, StorageError> {
    let fields_text: String = row.try_get("fields")?;
    Ok(SensorDataRecord {
        record_id: row.try_get("record_id")?,
        device_id: row.try_get("device_id")?,
        device_type: row.try_get("device_type")?,
        fields: serde_json::from_str(&fields_text)?,
        power_consumption: row.try_get("power_consumption")?,
        runtime_minutes: row.try_get("runtime_minutes")?,
        energy_efficiency: row.try_get("energy_efficiency")?,
        timestamp_ms: row.try_get("timestamp_ms")?,
    })
}

#[async_trait::async_trait]
impl SensorDataStore for PgSensorDataStore {
    async fn append_reading(&self, record: SensorDataRecord) -> Result<(), StorageError> {
        let fields_text = serde_json::to_string(&record.fields)?;
        sqlx::query(
            "insert into smart_device_sensor_data \
             (record_id, device_id, device_type, fields, power_consumption, \
              runtime_minutes, energy_efficiency, timestamp_ms) \
             values ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&record.record_id)
        .bind(&record.device_id)
        .bind(&record.device_type)
        .bind(&fields_text)
        .bind(record.power_consumption)
        .bind(record.runtime_minutes)
        .bind(record.energy_efficiency)
        .bind(record.timestamp_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_with_runtime(
        &self,
        device_id: &str,
    ) -> Result<Option<SensorDataRecord>, StorageError> {
        let row = sqlx::query(
            "select record_id, device_id, device_type, fields, power_consumption, \
             runtime_minutes, energy_efficiency, timestamp_ms \
             from smart_device_sensor_data \
             where device_id = $1 and runtime_minutes is not null \
             order by timestamp_ms desc limit 1",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }
}
