//! 传感器数据内存存储实现

use crate::error::StorageError;
use crate::models::SensorDataRecord;
use crate::traits::SensorDataStore;
use std::sync::RwLock;

/// 传感器数据内存存储
pub struct InMemorySensorDataStore {
    entries: RwLock<Vec<SensorDataRecord>>,
}

impl InMemorySensorDataStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemorySensorDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SensorDataStore for InMemorySensorDataStore {
    async fn append_reading(&self, record: SensorDataRecord) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        entries.push(record);
        Ok(())
    }

    async fn latest_with_runtime(
        &self,
        device_id: &str,
    ) -> Result<Option<SensorDataRecord>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let item = entries
            .iter()
            .filter(|item| item.device_id == device_id && item.runtime_minutes.is_some())
            .max_by_key(|item| item.timestamp_ms)
            .cloned();
        Ok(item)
    }
}
