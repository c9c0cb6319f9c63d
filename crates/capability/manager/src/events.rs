//! 设备生命周期事件。
//!
//! 通过 `tokio::sync::broadcast` 向任意数量的订阅者扇出，
//! 无订阅者时发送为空操作。

use domain::{DeviceCommand, DeviceState};
use tokio::sync::broadcast;

/// 事件通道容量；慢消费者超出后按 broadcast 语义丢弃最旧事件。
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 设备生命周期事件。
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    DeviceCreated {
        device_id: String,
    },
    DeviceDeleted {
        device_id: String,
    },
    DeviceStateUpdated {
        device_id: String,
        state: DeviceState,
    },
    DeviceCommandSent {
        device_id: String,
        command: DeviceCommand,
    },
}

pub(crate) fn channel() -> broadcast::Sender<DeviceEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
