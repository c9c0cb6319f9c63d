//! 状态历史内存存储实现
//!
//! 追加型存储，按写入顺序保存，查询时按时间倒序返回。

use crate::error::StorageError;
use crate::models::StateHistoryRecord;
use crate::traits::StateHistoryStore;
use std::sync::RwLock;

/// 状态历史内存存储
pub struct InMemoryStateHistoryStore {
    entries: RwLock<Vec<StateHistoryRecord>>,
}

impl InMemoryStateHistoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStateHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StateHistoryStore for InMemoryStateHistoryStore {
    async fn append_history(&self, record: StateHistoryRecord) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        entries.push(record);
        Ok(())
    }

    async fn latest_history(
        &self,
        device_id: &str,
    ) -> Result<Option<StateHistoryRecord>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let item = entries
            .iter()
            .filter(|item| item.device_id == device_id)
            .max_by_key(|item| item.timestamp_ms)
            .cloned();
        Ok(item)
    }

    async fn list_history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<StateHistoryRecord>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<StateHistoryRecord> = entries
            .iter()
            .filter(|item| item.device_id == device_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }
}
