//! Postgres 智能设备存储实现
//!
//! 通过 SQL 查询实现设备 CRUD 操作。
//!
//! 设计要点：
//! - 使用参数化 SQL 防止注入
//! - 状态快照以 JSON 文本存储

use crate::error::StorageError;
use crate::models::{DeviceFilter, SmartDeviceRecord, SmartDeviceUpdate};
use crate::traits::SmartDeviceStore;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgSmartDeviceStore {
    pub pool: PgPool,
}

impl PgSmartDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

fn record_from_row(row: &PgRow) -> Result<SmartDeviceRecord, StorageError> {
    let state_text: String = row.try_get("state")?;
    Ok(SmartDeviceRecord {
        device_id: row.try_get("device_id")?,
        device_type: row.try_get("device_type")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        state: serde_json::from_str(&state_text)?,
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

const DEVICE_COLUMNS: &str =
    "device_id, device_type, name, description, location, state, created_at_ms, updated_at_ms";

#[async_trait::async_trait]
impl SmartDeviceStore for PgSmartDeviceStore {
    async fn list_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<SmartDeviceRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {DEVICE_COLUMNS} from smart_devices \
             where ($1::text is null or device_type = $1) \
             and ($2::text is null or location = $2) \
             order by device_id",
        ))
        .bind(&filter.device_type)
        .bind(&filter.location)
        .fetch_all(&self.pool)
        .await?;
        let mut devices = Vec::with_capacity(rows.len());
        for row in rows {
            devices.push(record_from_row(&row)?);
        }
        Ok(devices)
    }

    async fn find_device(
        &self,
        device_id: &str,
    ) -> Result<Option<SmartDeviceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {DEVICE_COLUMNS} from smart_devices where device_id = $1",
        ))
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }

    async fn upsert_device(
        &self,
        record: SmartDeviceRecord,
    ) -> Result<SmartDeviceRecord, StorageError> {
        let state_text = serde_json::to_string(&record.state)?;
        sqlx::query(
            "insert into smart_devices \
             (device_id, device_type, name, description, location, state, created_at_ms, updated_at_ms) \
             values ($1, $2, $3, $4, $5, $6, $7, $8) \
             on conflict (device_id) do update set \
             device_type = excluded.device_type, \
             name = excluded.name, \
             description = excluded.description, \
             location = excluded.location, \
             state = excluded.state, \
             updated_at_ms = excluded.updated_at_ms",
        )
        .bind(&record.device_id)
        .bind(&record.device_type)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.location)
        .bind(&state_text)
        .bind(record.created_at_ms)
        .bind(record.updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_device(
        &self,
        device_id: &str,
        update: SmartDeviceUpdate,
    ) -> Result<Option<SmartDeviceRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update smart_devices set \
             name = coalesce($1, name), \
             description = coalesce($2, description), \
             location = coalesce($3, location) \
             where device_id = $4 \
             returning {DEVICE_COLUMNS}",
        ))
        .bind(update.name)
        .bind(update.description)
        .bind(update.location)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }

    async fn update_state(
        &self,
        device_id: &str,
        state: &Value,
        updated_at_ms: i64,
    ) -> Result<Option<SmartDeviceRecord>, StorageError> {
        let state_text = serde_json::to_string(state)?;
        let row = sqlx::query(&format!(
            "update smart_devices set state = $1, updated_at_ms = $2 \
             where device_id = $3 \
             returning {DEVICE_COLUMNS}",
        ))
        .bind(&state_text)
        .bind(updated_at_ms)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }

    async fn delete_device(&self, device_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from smart_devices where device_id = $1")
            .bind(device_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
