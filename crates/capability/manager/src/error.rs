//! 编排层错误类型。

use domain::{UnknownDeviceType, ValidationError, join_validation_errors};
use home_control::ControlError;
use home_profiles::ProfileError;
use home_storage::StorageError;

/// 设备编排错误。
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device already exists: {0}")]
    DeviceExists(String),
    #[error(transparent)]
    UnknownDeviceType(#[from] UnknownDeviceType),
    #[error("invalid payload: {0}")]
    Payload(String),
    #[error("invalid device state: {0}")]
    InvalidState(String),
    #[error("invalid command: {}", join_validation_errors(.0))]
    InvalidCommand(Vec<ValidationError>),
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("dispatch error: {0}")]
    Dispatch(#[from] ControlError),
}
