//! 基础传感器最近值内存缓存实现
//!
//! 不模拟 TTL 过期，仅覆盖写入语义。

use crate::error::StorageError;
use crate::traits::CurrentValueStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 最近值内存缓存
pub struct InMemoryCurrentValueStore {
    values: RwLock<HashMap<String, (f64, String, i64)>>,
}

impl InMemoryCurrentValueStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCurrentValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CurrentValueStore for InMemoryCurrentValueStore {
    async fn set_current_value(
        &self,
        device_id: &str,
        value: f64,
        status: &str,
        ts_ms: i64,
    ) -> Result<(), StorageError> {
        let mut map = self
            .values
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(device_id.to_string(), (value, status.to_string(), ts_ms));
        Ok(())
    }

    async fn get_current_value(
        &self,
        device_id: &str,
    ) -> Result<Option<(f64, String, i64)>, StorageError> {
        let item = self
            .values
            .read()
            .ok()
            .and_then(|map| map.get(device_id).cloned());
        Ok(item)
    }
}
