//! 设备编排能力。
//!
//! `DeviceManager` 是入站消息与设备操作的编排中心：
//! - 状态主题消息：建档（必要时）→ 状态转换 → 校验 → 快照更新
//!   → 审计（历史/传感器数据/日志）→ 异常检测 → 事件广播
//! - 其他主题消息：按基础传感器载荷处理（阈值联动 + 最近值缓存）
//! - 命令：校验 → 处理 → 发布到控制主题（fire-and-forget）
//! - 设备 CRUD 与错误状态管理
//!
//! 审计与异常写入为 best-effort：任一失败只计数并告警，
//! 不回滚已更新的状态快照。

pub mod anomaly;
pub mod audit;
pub mod error;
pub mod events;

pub use anomaly::{Anomaly, detect_anomalies};
pub use error::ManagerError;
pub use events::{DeviceEvent, EVENT_CHANNEL_CAPACITY};

use async_trait::async_trait;
use domain::{DeviceCommand, DeviceState, DeviceType, join_validation_errors, now_epoch_ms};
use home_control::{CommandDispatch, CommandDispatcher, mqtt_id};
use home_ingest::{IngestError, RawMessage, RawMessageHandler, TopicRoute, route_topic};
use home_profiles::ProfileRegistry;
use home_storage::{
    BaseDeviceRecord, BaseDeviceStore, BaseSensorDataRecord, BaseSensorDataStore,
    CurrentValueStore, DeviceFilter, DeviceLogRecord, DeviceLogStore, SensorDataRecord,
    SensorDataStore, SmartDeviceRecord, SmartDeviceStore, StateHistoryRecord, StateHistoryStore,
};
use home_telemetry::{
    record_anomaly_detected, record_audit_write_failure, record_base_sensor_message,
    record_command_dispatch_failure, record_command_dispatch_success, record_command_issued,
    record_device_autocreated, record_message_received, record_state_rejected,
    record_state_updated,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 基础传感器默认阈值下限。
const BASE_SENSOR_LOWER_THRESHOLD: f64 = 0.0;
/// 基础传感器默认阈值上限。
const BASE_SENSOR_UPPER_THRESHOLD: f64 = 100.0;

/// 编排层依赖的全部存储。
#[derive(Clone)]
pub struct ManagerStores {
    pub devices: Arc<dyn SmartDeviceStore>,
    pub history: Arc<dyn StateHistoryStore>,
    pub logs: Arc<dyn DeviceLogStore>,
    pub sensor_data: Arc<dyn SensorDataStore>,
    pub base_devices: Arc<dyn BaseDeviceStore>,
    pub base_sensor_data: Arc<dyn BaseSensorDataStore>,
    pub current_values: Arc<dyn CurrentValueStore>,
}

/// 手工建档输入。
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub device_id: String,
    pub device_type: DeviceType,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// 带已知设备 id 的拒绝：用于把错误写回设备错误状态。
struct Rejected {
    device_id: Option<String>,
    error: ManagerError,
}

impl Rejected {
    fn bare(error: ManagerError) -> Self {
        Self {
            device_id: None,
            error,
        }
    }

    fn for_device(device_id: &str, error: ManagerError) -> Self {
        Self {
            device_id: Some(device_id.to_string()),
            error,
        }
    }
}

/// 设备编排器。
pub struct DeviceManager {
    profiles: Arc<ProfileRegistry>,
    stores: ManagerStores,
    dispatcher: Arc<dyn CommandDispatcher>,
    device_prefix: String,
    events: broadcast::Sender<DeviceEvent>,
}

impl DeviceManager {
    pub fn new(
        profiles: Arc<ProfileRegistry>,
        stores: ManagerStores,
        dispatcher: Arc<dyn CommandDispatcher>,
        device_prefix: impl Into<String>,
    ) -> Self {
        Self {
            profiles,
            stores,
            dispatcher,
            device_prefix: device_prefix.into(),
            events: events::channel(),
        }
    }

    /// 订阅设备生命周期事件。
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// 处理一条入站 MQTT 消息。
    ///
    /// 状态主题消息被拒绝时写回设备错误状态（设备 id 已知的前提下），
    /// 其余主题按基础传感器载荷处理；本方法自身从不失败。
    pub async fn handle_inbound_message(&self, topic: &str, payload: &[u8]) {
        record_message_received();
        match route_topic(&self.device_prefix, topic) {
            TopicRoute::Status { device_id: topic_id } => {
                if let Err(rejected) = self.process_status_message(&topic_id, payload).await {
                    record_state_rejected();
                    warn!(
                        target: "home.manager",
                        topic,
                        "status message rejected: {}",
                        rejected.error
                    );
                    if let Some(device_id) = rejected.device_id {
                        self.mark_error(&device_id, &rejected.error.to_string()).await;
                    }
                }
            }
            TopicRoute::Other => self.process_base_sensor_message(payload).await,
        }
    }

    async fn process_status_message(&self, topic_id: &str, payload: &[u8]) -> Result<(), Rejected> {
        let raw: Value = serde_json::from_slice(payload)
            .map_err(|err| Rejected::bare(ManagerError::Payload(err.to_string())))?;
        let wire_type = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Rejected::bare(ManagerError::Payload("missing type field".to_string()))
            })?
            .to_string();
        let device_type = DeviceType::resolve(&wire_type)
            .map_err(|err| Rejected::bare(ManagerError::UnknownDeviceType(err)))?;

        // 设备 id 固定为 {线上类型}-{主题 id 段}。
        let device_id = format!("{wire_type}-{topic_id}");
        let now = now_epoch_ms();

        let existing = self
            .stores
            .devices
            .find_device(&device_id)
            .await
            .map_err(|err| Rejected::for_device(&device_id, err.into()))?;
        if existing.is_none() {
            self.auto_provision(&device_id, device_type, &wire_type, now)
                .await
                .map_err(|err| Rejected::for_device(&device_id, err))?;
        }

        let state = self
            .profiles
            .coerce(device_type, &raw, now)
            .map_err(|err| Rejected::for_device(&device_id, err.into()))?;
        let errors = self
            .profiles
            .validate_state(device_type, &state)
            .map_err(|err| Rejected::for_device(&device_id, err.into()))?;
        if !errors.is_empty() {
            return Err(Rejected::for_device(
                &device_id,
                ManagerError::InvalidState(join_validation_errors(&errors)),
            ));
        }

        let state_json = serde_json::to_value(&state)
            .map_err(|err| Rejected::for_device(&device_id, ManagerError::Payload(err.to_string())))?;
        self.stores
            .devices
            .update_state(&device_id, &state_json, now)
            .await
            .map_err(|err| Rejected::for_device(&device_id, err.into()))?;
        record_state_updated();
        debug!(target: "home.manager", device_id = %device_id, "device state updated");

        self.audit_state(&device_id, device_type, &state, &state_json, &raw, now)
            .await;
        self.check_anomalies(&device_id, device_type, &state, now).await;

        let _ = self.events.send(DeviceEvent::DeviceStateUpdated {
            device_id,
            state,
        });
        Ok(())
    }

    /// 首次收到未知设备的状态消息时自动建档。
    async fn auto_provision(
        &self,
        device_id: &str,
        device_type: DeviceType,
        wire_type: &str,
        now_ms: i64,
    ) -> Result<(), ManagerError> {
        let mut state = self
            .profiles
            .coerce(device_type, &json!({}), now_ms)?;
        state.base_mut().online = true;
        let state_json =
            serde_json::to_value(&state).map_err(|err| ManagerError::Payload(err.to_string()))?;

        let record = SmartDeviceRecord {
            device_id: device_id.to_string(),
            device_type: device_type.as_str().to_string(),
            name: device_id.to_string(),
            description: Some(format!("Auto-created {wire_type} device")),
            location: None,
            state: state_json,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        };
        self.stores.devices.upsert_device(record).await?;
        record_device_autocreated();
        info!(target: "home.manager", device_id = %device_id, "device auto-created");
        let _ = self.events.send(DeviceEvent::DeviceCreated {
            device_id: device_id.to_string(),
        });
        Ok(())
    }

    /// 审计写入：状态历史、传感器数据与温控器详情日志。
    async fn audit_state(
        &self,
        device_id: &str,
        device_type: DeviceType,
        state: &DeviceState,
        state_json: &Value,
        raw: &Value,
        now_ms: i64,
    ) {
        let prev = match self.stores.history.latest_history(device_id).await {
            Ok(prev) => prev,
            Err(err) => {
                warn!(target: "home.manager", device_id = %device_id, "latest history lookup failed: {}", err);
                None
            }
        };
        let (reason, details) =
            audit::history_reason_and_details(prev.as_ref().map(|record| &record.state), state_json);
        let history = StateHistoryRecord {
            history_id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            device_type: device_type.as_str().to_string(),
            state: state_json.clone(),
            reason: Some(reason),
            details,
            timestamp_ms: now_ms,
        };
        if let Err(err) = self.stores.history.append_history(history).await {
            record_audit_write_failure();
            warn!(target: "home.manager", device_id = %device_id, "history append failed: {}", err);
        }

        let mut fields = audit::sensor_fields(device_type, raw);
        let mut runtime = None;
        let mut efficiency = None;
        if let DeviceState::Thermostat(thermostat) = state {
            let prev_reading = match self.stores.sensor_data.latest_with_runtime(device_id).await {
                Ok(prev_reading) => prev_reading,
                Err(err) => {
                    warn!(target: "home.manager", device_id = %device_id, "runtime lookup failed: {}", err);
                    None
                }
            };
            let minutes = audit::runtime_minutes(prev_reading.as_ref(), now_ms);
            let ratio = audit::energy_efficiency(thermostat);
            runtime = Some(minutes);
            efficiency = Some(ratio);
            let power = thermostat.power_consumption;
            fields.insert(
                "heating_power".to_string(),
                json!(if thermostat.mode == "heat" { power } else { 0.0 }),
            );
            fields.insert(
                "cooling_power".to_string(),
                json!(if thermostat.mode == "cool" { power } else { 0.0 }),
            );
        }
        let reading = SensorDataRecord {
            record_id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            device_type: device_type.as_str().to_string(),
            fields: Value::Object(fields),
            power_consumption: state.power_consumption(),
            runtime_minutes: runtime,
            energy_efficiency: efficiency,
            timestamp_ms: now_ms,
        };
        if let Err(err) = self.stores.sensor_data.append_reading(reading).await {
            record_audit_write_failure();
            warn!(target: "home.manager", device_id = %device_id, "sensor data append failed: {}", err);
        }

        if let DeviceState::Thermostat(thermostat) = state {
            let log = DeviceLogRecord {
                log_id: Uuid::new_v4().to_string(),
                device_id: device_id.to_string(),
                device_type: device_type.as_str().to_string(),
                level: domain::LogLevel::Info,
                log_type: domain::LogType::SensorData,
                message: format!(
                    "thermostat update: temp={}°C, humidity={}%",
                    thermostat.current_temp, thermostat.humidity
                ),
                details: Some(json!({
                    "temperature": thermostat.current_temp,
                    "humidity": thermostat.humidity,
                    "target_temp": thermostat.target_temp,
                    "mode": thermostat.mode,
                    "fan_speed": thermostat.fan_speed,
                    "power": thermostat.power_consumption,
                    "runtime": runtime,
                    "efficiency": efficiency,
                })),
                timestamp_ms: now_ms,
            };
            if let Err(err) = self.stores.logs.append_log(log).await {
                record_audit_write_failure();
                warn!(target: "home.manager", device_id = %device_id, "sensor data log failed: {}", err);
            }
        }
    }

    /// 异常检测：命中时写 WARNING 级 STATE_CHANGE 日志。
    async fn check_anomalies(
        &self,
        device_id: &str,
        device_type: DeviceType,
        state: &DeviceState,
        now_ms: i64,
    ) {
        for anomaly in detect_anomalies(state) {
            record_anomaly_detected();
            warn!(target: "home.manager", device_id = %device_id, "{}", anomaly.message);
            let log = DeviceLogRecord {
                log_id: Uuid::new_v4().to_string(),
                device_id: device_id.to_string(),
                device_type: device_type.as_str().to_string(),
                level: domain::LogLevel::Warning,
                log_type: domain::LogType::StateChange,
                message: anomaly.message,
                details: Some(anomaly.details),
                timestamp_ms: now_ms,
            };
            if let Err(err) = self.stores.logs.append_log(log).await {
                record_audit_write_failure();
                warn!(target: "home.manager", device_id = %device_id, "anomaly log failed: {}", err);
            }
        }
    }

    /// 基础传感器消息：建档（必要时）、阈值联动、最近值缓存与数据落库。
    ///
    /// 载荷形状 `{type, id, value, location?}`；不完整的载荷静默丢弃。
    async fn process_base_sensor_message(&self, payload: &[u8]) {
        record_base_sensor_message();
        let Ok(raw) = serde_json::from_slice::<Value>(payload) else {
            debug!(target: "home.manager", "discarding malformed base sensor payload");
            return;
        };
        let Some(sensor_type) = raw.get("type").and_then(Value::as_str) else {
            return;
        };
        let raw_id = match raw.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return,
        };
        // 基础传感器设备 id 固定为 {类型}-{载荷 id}，避免不同类型的同号传感器互相覆盖。
        let device_id = format!("{sensor_type}-{raw_id}");
        let Some(value) = raw.get("value").and_then(Value::as_f64) else {
            return;
        };
        let now = now_epoch_ms();

        let device = match self.stores.base_devices.find_base_device(&device_id).await {
            Ok(device) => device,
            Err(err) => {
                warn!(target: "home.manager", device_id = %device_id, "base device lookup failed: {}", err);
                return;
            }
        };
        let device = match device {
            Some(device) => device,
            None => {
                let record = BaseDeviceRecord {
                    device_id: device_id.clone(),
                    sensor_type: sensor_type.to_string(),
                    location: raw.get("location").cloned(),
                    lower_threshold: BASE_SENSOR_LOWER_THRESHOLD,
                    upper_threshold: BASE_SENSOR_UPPER_THRESHOLD,
                    status: "off".to_string(),
                    updated_at_ms: now,
                };
                match self.stores.base_devices.upsert_base_device(record).await {
                    Ok(record) => {
                        info!(target: "home.manager", device_id = %device_id, "base device auto-created");
                        record
                    }
                    Err(err) => {
                        warn!(target: "home.manager", device_id = %device_id, "base device create failed: {}", err);
                        return;
                    }
                }
            }
        };

        // 阈值联动：低于下限开启，高于上限关闭，区间内维持原状。
        let next_status = if value <= device.lower_threshold {
            Some("on")
        } else if value >= device.upper_threshold {
            Some("off")
        } else {
            None
        };
        let status = match next_status {
            Some(status) if status != device.status => {
                if let Err(err) = self
                    .stores
                    .base_devices
                    .update_base_status(&device_id, status, now)
                    .await
                {
                    warn!(target: "home.manager", device_id = %device_id, "base status update failed: {}", err);
                }
                status.to_string()
            }
            Some(status) => status.to_string(),
            None => device.status,
        };

        if let Err(err) = self
            .stores
            .current_values
            .set_current_value(&device_id, value, &status, now)
            .await
        {
            warn!(target: "home.manager", device_id = %device_id, "current value cache failed: {}", err);
        }

        let record = BaseSensorDataRecord {
            record_id: Uuid::new_v4().to_string(),
            device_id: device_id.clone(),
            value,
            status,
            timestamp_ms: now,
        };
        if let Err(err) = self.stores.base_sensor_data.append_base_reading(record).await {
            warn!(target: "home.manager", device_id = %device_id, "base sensor data append failed: {}", err);
        }
    }

    /// 校验并下发设备命令，返回发布到控制主题的线上载荷。
    ///
    /// 校验失败不发布；发布为 fire-and-forget，不修改设备状态快照。
    pub async fn send_command(
        &self,
        device_id: &str,
        command: DeviceCommand,
    ) -> Result<Value, ManagerError> {
        record_command_issued();
        let record = self
            .stores
            .devices
            .find_device(device_id)
            .await?
            .ok_or_else(|| ManagerError::DeviceNotFound(device_id.to_string()))?;
        let device_type = DeviceType::resolve(&record.device_type)?;

        let errors = self.profiles.validate_command(device_type, &command)?;
        if !errors.is_empty() {
            return Err(ManagerError::InvalidCommand(errors));
        }

        let now = now_epoch_ms();
        let payload = self.profiles.process_command(device_type, &command, now)?;
        let dispatch = CommandDispatch {
            device_id: device_id.to_string(),
            mqtt_id: mqtt_id(device_id).to_string(),
            payload: payload.clone(),
        };
        match self.dispatcher.dispatch(&dispatch).await {
            Ok(()) => record_command_dispatch_success(),
            Err(err) => {
                record_command_dispatch_failure();
                return Err(err.into());
            }
        }

        let log = DeviceLogRecord {
            log_id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            device_type: device_type.as_str().to_string(),
            level: domain::LogLevel::Info,
            log_type: domain::LogType::Command,
            message: format!("command sent: {}", command.command),
            details: serde_json::to_value(&command).ok(),
            timestamp_ms: now,
        };
        if let Err(err) = self.stores.logs.append_log(log).await {
            record_audit_write_failure();
            warn!(target: "home.manager", device_id = %device_id, "command log failed: {}", err);
        }

        let _ = self.events.send(DeviceEvent::DeviceCommandSent {
            device_id: device_id.to_string(),
            command,
        });
        Ok(payload)
    }

    /// 手工建档：以类型默认状态创建设备。
    pub async fn create_device(&self, input: NewDevice) -> Result<SmartDeviceRecord, ManagerError> {
        // 未注册类型立即失败。
        self.profiles.get(input.device_type)?;
        if self.stores.devices.find_device(&input.device_id).await?.is_some() {
            return Err(ManagerError::DeviceExists(input.device_id));
        }

        let now = now_epoch_ms();
        let mut state = self.profiles.coerce(input.device_type, &json!({}), now)?;
        state.base_mut().online = true;
        let state_json =
            serde_json::to_value(&state).map_err(|err| ManagerError::Payload(err.to_string()))?;

        let record = SmartDeviceRecord {
            device_id: input.device_id.clone(),
            device_type: input.device_type.as_str().to_string(),
            name: input.name,
            description: input.description,
            location: input.location,
            state: state_json,
            created_at_ms: now,
            updated_at_ms: now,
        };
        let record = self.stores.devices.upsert_device(record).await?;
        info!(target: "home.manager", device_id = %record.device_id, "device created");
        let _ = self.events.send(DeviceEvent::DeviceCreated {
            device_id: record.device_id.clone(),
        });
        Ok(record)
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<(), ManagerError> {
        let deleted = self.stores.devices.delete_device(device_id).await?;
        if !deleted {
            return Err(ManagerError::DeviceNotFound(device_id.to_string()));
        }
        info!(target: "home.manager", device_id = %device_id, "device deleted");
        let _ = self.events.send(DeviceEvent::DeviceDeleted {
            device_id: device_id.to_string(),
        });
        Ok(())
    }

    pub async fn get_device(&self, device_id: &str) -> Result<SmartDeviceRecord, ManagerError> {
        self.stores
            .devices
            .find_device(device_id)
            .await?
            .ok_or_else(|| ManagerError::DeviceNotFound(device_id.to_string()))
    }

    pub async fn list_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<SmartDeviceRecord>, ManagerError> {
        Ok(self.stores.devices.list_devices(filter).await?)
    }

    pub async fn list_history(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<StateHistoryRecord>, ManagerError> {
        Ok(self.stores.history.list_history(device_id, limit).await?)
    }

    pub async fn list_logs(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<DeviceLogRecord>, ManagerError> {
        Ok(self.stores.logs.list_logs(device_id, limit).await?)
    }

    /// 将设备置入错误状态：离线、记录错误信息并追加 ERROR 日志。
    ///
    /// 自身的失败只告警，不向上传播。
    pub async fn mark_error(&self, device_id: &str, message: &str) {
        let record = match self.stores.devices.find_device(device_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(target: "home.manager", device_id = %device_id, "cannot mark error on unknown device");
                return;
            }
            Err(err) => {
                warn!(target: "home.manager", device_id = %device_id, "error state lookup failed: {}", err);
                return;
            }
        };
        let mut state: DeviceState = match serde_json::from_value(record.state.clone()) {
            Ok(state) => state,
            Err(err) => {
                warn!(target: "home.manager", device_id = %device_id, "stored state undecodable: {}", err);
                return;
            }
        };

        let now = now_epoch_ms();
        {
            let base = state.base_mut();
            base.online = false;
            base.error_state = Some(message.to_string());
            base.last_update = now;
        }
        let state_json = match serde_json::to_value(&state) {
            Ok(state_json) => state_json,
            Err(err) => {
                warn!(target: "home.manager", device_id = %device_id, "error state encode failed: {}", err);
                return;
            }
        };
        if let Err(err) = self
            .stores
            .devices
            .update_state(device_id, &state_json, now)
            .await
        {
            warn!(target: "home.manager", device_id = %device_id, "error state update failed: {}", err);
            return;
        }

        let log = DeviceLogRecord {
            log_id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            device_type: record.device_type,
            level: domain::LogLevel::Error,
            log_type: domain::LogType::Error,
            message: message.to_string(),
            details: None,
            timestamp_ms: now,
        };
        if let Err(err) = self.stores.logs.append_log(log).await {
            record_audit_write_failure();
            warn!(target: "home.manager", device_id = %device_id, "error log failed: {}", err);
        }

        let _ = self.events.send(DeviceEvent::DeviceStateUpdated {
            device_id: device_id.to_string(),
            state,
        });
    }
}

#[async_trait]
impl RawMessageHandler for DeviceManager {
    async fn handle(&self, message: RawMessage) -> Result<(), IngestError> {
        self.handle_inbound_message(&message.topic, &message.payload)
            .await;
        Ok(())
    }
}
