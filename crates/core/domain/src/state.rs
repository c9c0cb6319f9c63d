//! 设备状态模型。
//!
//! `DeviceState` 是按设备类型打 tag 的联合体，每个变体都内嵌
//! `BaseDeviceState`。数值域约定见各字段注释；经过类型画像的
//! 转换（clamp + 默认值）后，所有数值字段都应落在声明区间内。

use crate::DeviceType;
use serde::{Deserialize, Serialize};

/// 所有设备状态共有的基础字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseDeviceState {
    pub online: bool,
    /// 最近一次状态处理时间（Unix 毫秒），总是取处理时刻而非线上值。
    pub last_update: i64,
    pub error_state: Option<String>,
}

/// 智能灯状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    /// "on" 或 "off"
    pub state: String,
    /// 亮度 (0-100)
    pub brightness: f64,
    /// 色温 (2700-6500K)
    pub color_temp: f64,
    /// 功率消耗 (W, >= 0)
    pub power_consumption: f64,
}

/// 温控器状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    /// 当前温度 (16-30°C)
    pub current_temp: f64,
    /// 目标温度 (16-30°C)
    pub target_temp: f64,
    /// 湿度 (0-100%)
    pub humidity: f64,
    /// 运行模式 (auto/heat/cool)
    pub mode: String,
    /// 风速 (auto/low/medium/high)
    pub fan_speed: String,
    /// 功率消耗 (W, >= 0)
    pub power_consumption: f64,
}

/// 智能门锁状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorLockState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    pub locked: bool,
    /// 电池电量 (0-100%)
    pub battery_level: f64,
    pub last_lock_time: i64,
    pub last_unlock_time: i64,
}

/// 智能窗帘状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlindState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    /// 位置 (0-100)
    pub position: f64,
    /// 倾斜角度 (0-180°)
    pub tilt: f64,
    pub moving: bool,
    pub last_move_time: i64,
}

/// 空调状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirConditionerState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    pub on: bool,
    /// 设定温度 (16-30°C)
    pub temp: f64,
    /// 运行模式 (cool/heat/dry/fan)
    pub mode: String,
    /// 风速 (auto/low/medium/high)
    pub fan_speed: String,
    pub swing: bool,
    /// 功率消耗 (W, >= 0)
    pub power_consumption: f64,
}

/// 烟雾报警器状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmokeDetectorState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    pub alarm: bool,
    /// 电池电量 (0-100%)
    pub battery_level: f64,
    /// 烟雾浓度 (0-100)
    pub smoke_level: f64,
    pub last_test_time: i64,
}

/// 风扇状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    pub on: bool,
    /// 风速档位 (1-3)
    pub speed: f64,
    pub oscillate: bool,
    /// 定时 (0-120 分钟)
    pub timer: f64,
    /// 功率消耗 (W, >= 0)
    pub power_consumption: f64,
}

/// 智能插座状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlugState {
    #[serde(flatten)]
    pub base: BaseDeviceState,
    pub on: bool,
    /// 功率消耗 (W, >= 0)
    pub power_consumption: f64,
    /// 电压 (100-240V)
    pub voltage: f64,
    /// 电流 (A, >= 0)
    pub current: f64,
    /// 功率因数 (0.8-1)
    pub power_factor: f64,
    /// 定时 (0-120 分钟)
    pub timer: f64,
}

/// 设备状态联合体，tag 为规范设备类型名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceState {
    #[serde(rename = "LIGHT")]
    Light(LightState),
    #[serde(rename = "THERMOSTAT")]
    Thermostat(ThermostatState),
    #[serde(rename = "DOOR_LOCK")]
    DoorLock(DoorLockState),
    #[serde(rename = "BLIND")]
    Blind(BlindState),
    #[serde(rename = "AIR_CONDITIONER")]
    AirConditioner(AirConditionerState),
    #[serde(rename = "SMOKE_DETECTOR")]
    SmokeDetector(SmokeDetectorState),
    #[serde(rename = "FAN")]
    Fan(FanState),
    #[serde(rename = "PLUG")]
    Plug(PlugState),
}

impl DeviceState {
    /// 变体对应的设备类型。
    pub fn device_type(&self) -> DeviceType {
        match self {
            DeviceState::Light(_) => DeviceType::Light,
            DeviceState::Thermostat(_) => DeviceType::Thermostat,
            DeviceState::DoorLock(_) => DeviceType::DoorLock,
            DeviceState::Blind(_) => DeviceType::Blind,
            DeviceState::AirConditioner(_) => DeviceType::AirConditioner,
            DeviceState::SmokeDetector(_) => DeviceType::SmokeDetector,
            DeviceState::Fan(_) => DeviceType::Fan,
            DeviceState::Plug(_) => DeviceType::Plug,
        }
    }

    pub fn base(&self) -> &BaseDeviceState {
        match self {
            DeviceState::Light(state) => &state.base,
            DeviceState::Thermostat(state) => &state.base,
            DeviceState::DoorLock(state) => &state.base,
            DeviceState::Blind(state) => &state.base,
            DeviceState::AirConditioner(state) => &state.base,
            DeviceState::SmokeDetector(state) => &state.base,
            DeviceState::Fan(state) => &state.base,
            DeviceState::Plug(state) => &state.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseDeviceState {
        match self {
            DeviceState::Light(state) => &mut state.base,
            DeviceState::Thermostat(state) => &mut state.base,
            DeviceState::DoorLock(state) => &mut state.base,
            DeviceState::Blind(state) => &mut state.base,
            DeviceState::AirConditioner(state) => &mut state.base,
            DeviceState::SmokeDetector(state) => &mut state.base,
            DeviceState::Fan(state) => &mut state.base,
            DeviceState::Plug(state) => &mut state.base,
        }
    }

    /// 携带功率语义的变体返回功率消耗。
    pub fn power_consumption(&self) -> Option<f64> {
        match self {
            DeviceState::Light(state) => Some(state.power_consumption),
            DeviceState::Thermostat(state) => Some(state.power_consumption),
            DeviceState::AirConditioner(state) => Some(state.power_consumption),
            DeviceState::Fan(state) => Some(state.power_consumption),
            DeviceState::Plug(state) => Some(state.power_consumption),
            DeviceState::DoorLock(_) | DeviceState::Blind(_) | DeviceState::SmokeDetector(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_base() -> BaseDeviceState {
        BaseDeviceState {
            online: true,
            last_update: 1_700_000_000_000,
            error_state: None,
        }
    }

    #[test]
    fn state_serializes_with_type_tag_and_flat_base() {
        let state = DeviceState::Light(LightState {
            base: sample_base(),
            state: "on".to_string(),
            brightness: 80.0,
            color_temp: 4000.0,
            power_consumption: 9.5,
        });
        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["type"], "LIGHT");
        assert_eq!(json["online"], true);
        assert_eq!(json["brightness"], 80.0);

        let parsed: DeviceState = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.device_type(), DeviceType::Light);
        assert_eq!(parsed, state);
    }

    #[test]
    fn power_consumption_only_for_powered_types() {
        let lock = DeviceState::DoorLock(DoorLockState {
            base: sample_base(),
            locked: true,
            battery_level: 90.0,
            last_lock_time: 0,
            last_unlock_time: 0,
        });
        assert!(lock.power_consumption().is_none());

        let plug = DeviceState::Plug(PlugState {
            base: sample_base(),
            on: true,
            power_consumption: 1500.0,
            voltage: 220.0,
            current: 6.8,
            power_factor: 0.95,
            timer: 0.0,
        });
        assert_eq!(plug.power_consumption(), Some(1500.0));
    }
}
