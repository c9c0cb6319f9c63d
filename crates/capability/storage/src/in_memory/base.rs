//! 基础传感器内存存储实现
//!
//! 包含基础传感器设备存储与数据追加存储。

use crate::error::StorageError;
use crate::models::{BaseDeviceRecord, BaseSensorDataRecord};
use crate::traits::{BaseDeviceStore, BaseSensorDataStore};
use std::collections::HashMap;
use std::sync::RwLock;

/// 基础传感器设备内存存储
pub struct InMemoryBaseDeviceStore {
    devices: RwLock<HashMap<String, BaseDeviceRecord>>,
}

impl InMemoryBaseDeviceStore {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBaseDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BaseDeviceStore for InMemoryBaseDeviceStore {
    async fn find_base_device(
        &self,
        device_id: &str,
    ) -> Result<Option<BaseDeviceRecord>, StorageError> {
        let item = self
            .devices
            .read()
            .ok()
            .and_then(|map| map.get(device_id).cloned());
        Ok(item)
    }

    async fn upsert_base_device(
        &self,
        record: BaseDeviceRecord,
    ) -> Result<BaseDeviceRecord, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(record.device_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_base_status(
        &self,
        device_id: &str,
        status: &str,
        updated_at_ms: i64,
    ) -> Result<Option<BaseDeviceRecord>, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let device = match map.get_mut(device_id) {
            Some(device) => device,
            None => return Ok(None),
        };
        device.status = status.to_string();
        device.updated_at_ms = updated_at_ms;
        Ok(Some(device.clone()))
    }
}

/// 基础传感器数据内存存储
pub struct InMemoryBaseSensorDataStore {
    entries: RwLock<Vec<BaseSensorDataRecord>>,
}

impl InMemoryBaseSensorDataStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// 测试辅助：返回指定设备的全部数据副本。
    pub fn all_for_device(&self, device_id: &str) -> Vec<BaseSensorDataRecord> {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|item| item.device_id == device_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for InMemoryBaseSensorDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BaseSensorDataStore for InMemoryBaseSensorDataStore {
    async fn append_base_reading(&self, record: BaseSensorDataRecord) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        entries.push(record);
        Ok(())
    }
}
