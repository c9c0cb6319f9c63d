//! 存储接口 Trait 定义
//!
//! 定义所有资源存储的异步接口：
//! - SmartDeviceStore：智能设备存储
//! - StateHistoryStore：状态历史存储
//! - DeviceLogStore：设备日志存储
//! - SensorDataStore：传感器数据存储
//! - BaseDeviceStore：基础传感器设备存储
//! - BaseSensorDataStore：基础传感器数据存储
//! - CurrentValueStore：基础传感器最近值缓存
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 历史/日志/传感器写入为追加操作，彼此独立

use crate::error::StorageError;
use crate::models::{
    BaseDeviceRecord, BaseSensorDataRecord, DeviceFilter, DeviceLogRecord, SensorDataRecord,
    SmartDeviceRecord, SmartDeviceUpdate, StateHistoryRecord,
};
use async_trait::async_trait;
use serde_json::Value;

/// 智能设备存储接口
///
/// 提供设备 CRUD 与状态快照更新。
#[async_trait]
pub trait SmartDeviceStore: Send + Sync {
    /// 按过滤条件列出设备
    async fn list_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<SmartDeviceRecord>, StorageError>;

    /// 查找指定设备
    async fn find_device(
        &self,
        device_id: &str,
    ) -> Result<Option<SmartDeviceRecord>, StorageError>;

    /// 创建或覆盖设备记录（自动建档使用 upsert 语义）
    async fn upsert_device(
        &self,
        record: SmartDeviceRecord,
    ) -> Result<SmartDeviceRecord, StorageError>;

    /// 更新设备元数据
    async fn update_device(
        &self,
        device_id: &str,
        update: SmartDeviceUpdate,
    ) -> Result<Option<SmartDeviceRecord>, StorageError>;

    /// 更新设备状态快照
    async fn update_state(
        &self,
        device_id: &str,
        state: &Value,
        updated_at_ms: i64,
    ) -> Result<Option<SmartDeviceRecord>, StorageError>;

    /// 删除设备
    async fn delete_device(&self, device_id: &str) -> Result<bool, StorageError>;
}

/// 状态历史存储接口
#[async_trait]
pub trait StateHistoryStore: Send + Sync {
    /// 追加历史记录
    async fn append_history(&self, record: StateHistoryRecord) -> Result<(), StorageError>;

    /// 查找指定设备最近一条历史记录
    async fn latest_history(
        &self,
        device_id: &str,
    ) -> Result<Option<StateHistoryRecord>, StorageError>;

    /// 按时间倒序列出指定设备的历史记录
    async fn list_history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<StateHistoryRecord>, StorageError>;
}

/// 设备日志存储接口
#[async_trait]
pub trait DeviceLogStore: Send + Sync {
    /// 追加日志记录
    async fn append_log(&self, record: DeviceLogRecord) -> Result<(), StorageError>;

    /// 按时间倒序列出指定设备的日志
    async fn list_logs(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<DeviceLogRecord>, StorageError>;
}

/// 传感器数据存储接口
#[async_trait]
pub trait SensorDataStore: Send + Sync {
    /// 追加传感器数据记录
    async fn append_reading(&self, record: SensorDataRecord) -> Result<(), StorageError>;

    /// 查找指定设备最近一条带运行时长的记录（运行时长/能效派生用）
    async fn latest_with_runtime(
        &self,
        device_id: &str,
    ) -> Result<Option<SensorDataRecord>, StorageError>;
}

/// 基础传感器设备存储接口
#[async_trait]
pub trait BaseDeviceStore: Send + Sync {
    /// 查找基础传感器设备
    async fn find_base_device(
        &self,
        device_id: &str,
    ) -> Result<Option<BaseDeviceRecord>, StorageError>;

    /// 创建或覆盖基础传感器设备
    async fn upsert_base_device(
        &self,
        record: BaseDeviceRecord,
    ) -> Result<BaseDeviceRecord, StorageError>;

    /// 更新基础传感器设备状态
    async fn update_base_status(
        &self,
        device_id: &str,
        status: &str,
        updated_at_ms: i64,
    ) -> Result<Option<BaseDeviceRecord>, StorageError>;
}

/// 基础传感器数据存储接口
#[async_trait]
pub trait BaseSensorDataStore: Send + Sync {
    /// 追加基础传感器数据记录
    async fn append_base_reading(&self, record: BaseSensorDataRecord) -> Result<(), StorageError>;
}

/// 基础传感器最近值缓存接口
#[async_trait]
pub trait CurrentValueStore: Send + Sync {
    /// 写入最近值（带 TTL）
    async fn set_current_value(
        &self,
        device_id: &str,
        value: f64,
        status: &str,
        ts_ms: i64,
    ) -> Result<(), StorageError>;

    /// 读取最近值
    async fn get_current_value(
        &self,
        device_id: &str,
    ) -> Result<Option<(f64, String, i64)>, StorageError>;
}
