//! PostgreSQL 存储实现模块
//!
//! 生产环境使用。
//!
//! 包含以下实现：
//! - SmartDeviceStore: PgSmartDeviceStore
//! - StateHistoryStore: PgStateHistoryStore
//! - DeviceLogStore: PgDeviceLogStore
//! - SensorDataStore: PgSensorDataStore
//! - BaseDeviceStore / BaseSensorDataStore: PgBaseDeviceStore, PgBaseSensorDataStore
//!
//! JSON 快照（设备状态、差异详情、稀疏传感器字段）以 text 列存储，
//! 读写时经 serde_json 序列化。

pub mod base;
pub mod device;
pub mod history;
pub mod log;
pub mod sensor;

pub use base::*;
pub use device::*;
pub use history::*;
pub use log::*;
pub use sensor::*;
