//! 设备日志内存存储实现

use crate::error::StorageError;
use crate::models::DeviceLogRecord;
use crate::traits::DeviceLogStore;
use std::sync::RwLock;

/// 设备日志内存存储
pub struct InMemoryDeviceLogStore {
    entries: RwLock<Vec<DeviceLogRecord>>,
}

impl InMemoryDeviceLogStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// 测试辅助：返回指定设备的全部日志副本。
    pub fn all_for_device(&self, device_id: &str) -> Vec<DeviceLogRecord> {
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

impl Default for InMemoryDeviceLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceLogStore for InMemoryDeviceLogStore {
    async fn append_log(&self, record: DeviceLogRecord) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        entries.push(record);
        Ok(())
    }

    async fn list_logs(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<DeviceLogRecord>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<DeviceLogRecord> = entries
            .iter()
            .filter(|item| item.device_id == device_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }
}
