//! 设备类型画像：每类设备一组纯函数（状态转换、状态校验、
//! 命令校验、命令处理），由组合根构建一次 `ProfileRegistry`
//! 后注入编排层，替代模块级静态单例。

mod air_conditioner;
mod blind;
mod coerce;
mod door_lock;
mod fan;
mod light;
mod plug;
mod smoke_detector;
mod thermostat;

pub use coerce::{Coerced, base_from_raw, bool_field, clamp_f64, num_field, str_field, ts_field};

use domain::{BaseDeviceState, DeviceCommand, DeviceState, DeviceType, ValidationError};
use serde_json::Value;
use std::collections::HashMap;

/// 画像层错误。
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("no profile registered for device type: {0}")]
    Unregistered(DeviceType),
    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),
    #[error("invalid command parameter: {0}")]
    InvalidParam(String),
}

/// 单个设备类型的处理画像。
///
/// 四个成员都是纯函数：
/// - `coerce`：原始载荷 -> 结构完整的类型化状态（默认值补齐 + 区间 clamp，
///   永不失败；`last_update` 一律取处理时刻 `now_ms`）
/// - `validate`：类型化状态 -> 字段级错误列表（空表示合法）
/// - `validate_command`：入站命令 -> 字段级错误列表
/// - `process_command`：已校验命令 -> 发布到控制主题的线上载荷
#[derive(Clone, Copy)]
pub struct DeviceProfile {
    pub device_type: DeviceType,
    pub coerce: fn(raw: &Value, now_ms: i64) -> DeviceState,
    pub validate: fn(state: &DeviceState) -> Vec<ValidationError>,
    pub validate_command: fn(command: &DeviceCommand) -> Vec<ValidationError>,
    pub process_command: fn(command: &DeviceCommand, now_ms: i64) -> Result<Value, ProfileError>,
}

/// 画像注册表：设备类型 -> 画像。
///
/// 在组合根通过 [`ProfileRegistry::standard`] 构建一次，随后只读共享。
pub struct ProfileRegistry {
    profiles: HashMap<DeviceType, DeviceProfile>,
}

impl ProfileRegistry {
    /// 注册全部 8 类设备的标准画像。
    pub fn standard() -> Self {
        let mut profiles = HashMap::new();
        for profile in [
            light::profile(),
            thermostat::profile(),
            door_lock::profile(),
            blind::profile(),
            air_conditioner::profile(),
            smoke_detector::profile(),
            fan::profile(),
            plug::profile(),
        ] {
            profiles.insert(profile.device_type, profile);
        }
        Self { profiles }
    }

    /// 查找画像；未注册类型立即失败。
    pub fn get(&self, device_type: DeviceType) -> Result<&DeviceProfile, ProfileError> {
        self.profiles
            .get(&device_type)
            .ok_or(ProfileError::Unregistered(device_type))
    }

    pub fn coerce(
        &self,
        device_type: DeviceType,
        raw: &Value,
        now_ms: i64,
    ) -> Result<DeviceState, ProfileError> {
        Ok((self.get(device_type)?.coerce)(raw, now_ms))
    }

    pub fn validate_state(
        &self,
        device_type: DeviceType,
        state: &DeviceState,
    ) -> Result<Vec<ValidationError>, ProfileError> {
        Ok((self.get(device_type)?.validate)(state))
    }

    pub fn validate_command(
        &self,
        device_type: DeviceType,
        command: &DeviceCommand,
    ) -> Result<Vec<ValidationError>, ProfileError> {
        Ok((self.get(device_type)?.validate_command)(command))
    }

    pub fn process_command(
        &self,
        device_type: DeviceType,
        command: &DeviceCommand,
        now_ms: i64,
    ) -> Result<Value, ProfileError> {
        (self.get(device_type)?.process_command)(command, now_ms)
    }
}

/// 校验基础字段（各类型画像共用）。
fn validate_base(base: &BaseDeviceState) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if base.last_update <= 0 {
        errors.push(ValidationError::new(
            "last_update",
            "last_update must be a valid timestamp",
        ));
    }
    errors
}

/// 变体与设备类型不匹配时的统一错误。
fn variant_mismatch(device_type: DeviceType) -> Vec<ValidationError> {
    vec![ValidationError::new(
        "type",
        format!("state variant does not match device type {}", device_type),
    )]
}

/// 原样回显命令作为线上载荷。
fn echo_command(command: &DeviceCommand) -> Value {
    serde_json::to_value(command).unwrap_or(Value::Null)
}

/// 校验命令名非空且在支持集合内。
fn check_supported_command(
    command: &DeviceCommand,
    supported: &[&str],
) -> Option<ValidationError> {
    if command.command.is_empty() {
        return Some(ValidationError::new(
            "command",
            "command must be a non-empty string",
        ));
    }
    if !supported.contains(&command.command.as_str()) {
        return Some(ValidationError::new(
            "command",
            format!("command must be one of: {}", supported.join(", ")),
        ));
    }
    None
}

/// 读取命令的数值参数（数字或数字字符串）。
fn num_param(command: &DeviceCommand, key: &str) -> Option<f64> {
    match command.param(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 读取命令的字符串参数。
fn str_param<'a>(command: &'a DeviceCommand, key: &str) -> Option<&'a str> {
    command.param(key).and_then(Value::as_str)
}

/// 读取命令的布尔参数（布尔、非零数字或 "true"/"1"/"on"）。
fn bool_param(command: &DeviceCommand, key: &str) -> Option<bool> {
    match command.param(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|value| value != 0.0),
        Value::String(text) => Some(matches!(text.as_str(), "true" | "1" | "on")),
        _ => None,
    }
}

/// 数值参数区间校验，生成与原字段同名的错误。
fn check_num_param_range(
    command: &DeviceCommand,
    key: &str,
    min: f64,
    max: f64,
) -> Option<ValidationError> {
    match num_param(command, key) {
        Some(value) if value >= min && value <= max => None,
        _ => Some(ValidationError::new(
            key,
            format!("{} must be a number between {} and {}", key, min, max),
        )),
    }
}

/// 字符串参数枚举校验。
fn check_str_param_one_of(
    command: &DeviceCommand,
    key: &str,
    allowed: &[&str],
) -> Option<ValidationError> {
    match str_param(command, key) {
        Some(value) if allowed.contains(&value) => None,
        _ => Some(ValidationError::new(
            key,
            format!("{} must be one of: {}", key, allowed.join(", ")),
        )),
    }
}

/// 处理阶段读取数值参数，失败视为非法参数（校验层理应已拦截）。
fn require_num_param(
    command: &DeviceCommand,
    key: &str,
    min: f64,
    max: f64,
) -> Result<f64, ProfileError> {
    match num_param(command, key) {
        Some(value) if value >= min && value <= max => Ok(value),
        _ => Err(ProfileError::InvalidParam(key.to_string())),
    }
}

fn require_str_param<'a>(
    command: &'a DeviceCommand,
    key: &str,
    allowed: &[&str],
) -> Result<&'a str, ProfileError> {
    match str_param(command, key) {
        Some(value) if allowed.contains(&value) => Ok(value),
        _ => Err(ProfileError::InvalidParam(key.to_string())),
    }
}
