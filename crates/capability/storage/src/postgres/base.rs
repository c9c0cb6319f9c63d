//! Postgres 基础传感器存储实现

use crate::error::StorageError;
use crate::models::{BaseDeviceRecord, BaseSensorDataRecord};
use crate::traits::{BaseDeviceStore, BaseSensorDataStore};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgBaseDeviceStore {
    pub pool: PgPool,
}

impl PgBaseDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<BaseDeviceRecord, StorageError> {
    let location_text: Option<String> = row.try_get("location")?;
    let location = match location_text {
        Some(text) => Some(serde_json::from_str(&text)?),
        None => None,
    };
    Ok(BaseDeviceRecord {
        device_id: row.try_get("device_id")?,
        sensor_type: row.try_get("sensor_type")?,
        location,
        lower_threshold: row.try_get("lower_threshold")?,
        upper_threshold: row.try_get("upper_threshold")?,
        status: row.try_get("status")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

const BASE_COLUMNS: &str =
    "device_id, sensor_type, location, lower_threshold, upper_threshold, status, updated_at_ms";

#[async_trait::async_trait]
impl BaseDeviceStore for PgBaseDeviceStore {
    async fn find_base_device(
        &self,
        device_id: &str,
    ) -> Result<Option<BaseDeviceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {BASE_COLUMNS} from base_devices where device_id = $1",
        ))
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }

    async fn upsert_base_device(
        &self,
        record: BaseDeviceRecord,
    ) -> Result<BaseDeviceRecord, StorageError> {
        let location_text = match &record.location {
            Some(location) => Some(serde_json::to_string(location)?),
            None => None,
        };
        sqlx::query(
            "insert into base_devices \
             (device_id, sensor_type, location, lower_threshold, upper_threshold, status, updated_at_ms) \
             values ($1, $2, $3, $4, $5, $6, $7) \
             on conflict (device_id) do update set \
             sensor_type = excluded.sensor_type, \
             location = coalesce(excluded.location, base_devices.location), \
             status = excluded.status, \
             updated_at_ms = excluded.updated_at_ms",
        )
        .bind(&record.device_id)
        .bind(&record.sensor_type)
        .bind(&location_text)
        .bind(record.lower_threshold)
        .bind(record.upper_threshold)
        .bind(&record.status)
        .bind(record.updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_base_status(
        &self,
        device_id: &str,
        status: &str,
        updated_at_ms: i64,
    ) -> Result<Option<BaseDeviceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update base_devices set status = $1, updated_at_ms = $2 \
             where device_id = $3 returning {BASE_COLUMNS}",
        ))
        .bind(status)
        .bind(updated_at_ms)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }
}

pub struct PgBaseSensorDataStore {
    pub pool: PgPool,
}

impl PgBaseSensorDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BaseSensorDataStore for PgBaseSensorDataStore {
    async fn append_base_reading(&self, record: BaseSensorDataRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into base_sensor_data (record_id, device_id, value, status, timestamp_ms) \
             values ($1, $2, $3, $4, $5)",
        )
        .bind(&record.record_id)
        .bind(&record.device_id)
        .bind(record.value)
        .bind(&record.status)
        .bind(record.timestamp_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
