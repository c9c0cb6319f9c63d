//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - SmartDeviceStore: InMemorySmartDeviceStore
//! - StateHistoryStore: InMemoryStateHistoryStore
//! - DeviceLogStore: InMemoryDeviceLogStore
//! - SensorDataStore: InMemorySensorDataStore
//! - BaseDeviceStore: InMemoryBaseDeviceStore
//! - BaseSensorDataStore: InMemoryBaseSensorDataStore
//! - CurrentValueStore: InMemoryCurrentValueStore

pub mod base;
pub mod device;
pub mod history;
pub mod log;
pub mod realtime;
pub mod sensor;

pub use base::*;
pub use device::*;
pub use history::*;
pub use log::*;
pub use realtime::*;
pub use sensor::*;
