//! 智能设备内存存储实现
//!
//! 仅用于本地演示和测试。
//!
//! 功能：
//! - 设备 CRUD 操作
//! - 状态快照更新
//! - 类型/位置过滤

use crate::error::StorageError;
use crate::models::{DeviceFilter, SmartDeviceRecord, SmartDeviceUpdate};
use crate::traits::SmartDeviceStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// 智能设备内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
pub struct InMemorySmartDeviceStore {
    devices: RwLock<HashMap<String, SmartDeviceRecord>>,
}

impl InMemorySmartDeviceStore {
    /// 创建新的设备存储
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySmartDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SmartDeviceStore for InMemorySmartDeviceStore {
    /// 按过滤条件列出设备
    async fn list_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<SmartDeviceRecord>, StorageError> {
        let items = self
            .devices
            .read()
            .map(|map| {
                let mut items: Vec<SmartDeviceRecord> = map
                    .values()
                    .filter(|item| {
                        filter
                            .device_type
                            .as_deref()
                            .is_none_or(|device_type| item.device_type == device_type)
                    })
                    .filter(|item| {
                        filter
                            .location
                            .as_deref()
                            .is_none_or(|location| item.location.as_deref() == Some(location))
                    })
                    .cloned()
                    .collect();
                items.sort_by(|a, b| a.device_id.cmp(&b.device_id));
                items
            })
            .unwrap_or_default();
        Ok(items)
    }

    /// 查找指定设备
    async fn find_device(
        &self,
        device_id: &str,
    ) -> Result<Option<SmartDeviceRecord>, StorageError> {
        let item = self
            .devices
            .read()
            .ok()
            .and_then(|map| map.get(device_id).cloned());
        Ok(item)
    }

    /// 创建或覆盖设备记录
    async fn upsert_device(
        &self,
        record: SmartDeviceRecord,
    ) -> Result<SmartDeviceRecord, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(record.device_id.clone(), record.clone());
        Ok(record)
    }

    /// 更新设备元数据
    async fn update_device(
        &self,
        device_id: &str,
        update: SmartDeviceUpdate,
    ) -> Result<Option<SmartDeviceRecord>, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let device = match map.get_mut(device_id) {
            Some(device) => device,
            None => return Ok(None),
        };
        if let Some(name) = update.name {
            device.name = name;
        }
        if let Some(description) = update.description {
            device.description = Some(description);
        }
        if let Some(location) = update.location {
            device.location = Some(location);
        }
        Ok(Some(device.clone()))
    }

    /// 更新设备状态快照
    async fn update_state(
        &self,
        device_id: &str,
        state: &Value,
        updated_at_ms: i64,
    ) -> Result<Option<SmartDeviceRecord>, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let device = match map.get_mut(device_id) {
            Some(device) => device,
            None => return Ok(None),
        };
        device.state = state.clone();
        device.updated_at_ms = updated_at_ms;
        Ok(Some(device.clone()))
    }

    /// 删除设备
    async fn delete_device(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.remove(device_id).is_some())
    }
}
