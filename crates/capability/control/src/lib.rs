//! 命令下发链路
//!
//! 将已处理的命令负载发布到设备控制主题 `{prefix}/control/{mqtt_id}`。
//! 发布为 fire-and-forget：不等待设备确认，命令是否生效
//! 只能通过后续状态消息间接确认。

use async_trait::async_trait;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::time::Duration;
use tracing::{info, warn};

/// 控制链路错误。
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("dispatch error: {0}")]
    Dispatch(String),
    #[error("payload error: {0}")]
    Payload(String),
}

/// 命令下发数据。
#[derive(Debug, Clone)]
pub struct CommandDispatch {
    pub device_id: String,
    pub mqtt_id: String,
    pub payload: serde_json::Value,
}

/// 命令下发器抽象。
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, command: &CommandDispatch) -> Result<(), ControlError>;
}

/// 空下发器（用于占位与测试）。
#[derive(Debug, Default)]
pub struct NoopDispatcher;

#[async_trait]
impl CommandDispatcher for NoopDispatcher {
    async fn dispatch(&self, _command: &CommandDispatch) -> Result<(), ControlError> {
        Ok(())
    }
}

/// 设备 id 中 MQTT 段的提取。
///
/// 设备 id 形如 `{wireType}-{id}`，控制主题使用第一个 `-` 之后的部分；
/// 不含 `-` 时原样返回。
pub fn mqtt_id(device_id: &str) -> &str {
    match device_id.split_once('-') {
        Some((_, id)) if !id.is_empty() => id,
        _ => device_id,
    }
}

/// MQTT Dispatcher 配置。
#[derive(Debug, Clone)]
pub struct MqttDispatcherConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_prefix: String,
    pub qos: u8,
}

/// MQTT Dispatcher 实现（发布命令）。
#[derive(Clone)]
pub struct MqttDispatcher {
    client: AsyncClient,
    device_prefix: String,
    qos: QoS,
}

impl MqttDispatcher {
    pub fn connect(
        config: MqttDispatcherConfig,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), ControlError> {
        let client_id = format!("home-control-dispatch-{}", uuid::Uuid::new_v4());
        let mut options = MqttOptions::new(client_id, config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (config.username, config.password) {
            options.set_credentials(username, password);
        }
        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let handle = tokio::spawn(async move {
            loop {
                if let Err(err) = eventloop.poll().await {
                    warn!(target: "home.control", "mqtt dispatch eventloop error: {}", err);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        });
        Ok((
            Self {
                client,
                device_prefix: config.device_prefix,
                qos: qos_from_u8(config.qos),
            },
            handle,
        ))
    }

    fn topic_for(&self, mqtt_id: &str) -> String {
        format!("{}/control/{}", self.device_prefix.trim_end_matches('/'), mqtt_id)
    }
}

#[async_trait]
impl CommandDispatcher for MqttDispatcher {
    async fn dispatch(&self, command: &CommandDispatch) -> Result<(), ControlError> {
        let topic = self.topic_for(&command.mqtt_id);
        let payload = serde_json::to_vec(&command.payload)
            .map_err(|err| ControlError::Payload(err.to_string()))?;
        info!(
            target: "home.control",
            device_id = %command.device_id,
            topic = %topic,
            payload_size = payload.len(),
            "command_dispatch_publish"
        );
        self.client
            .publish(topic, self.qos, false, payload)
            .await
            .map_err(|err| ControlError::Dispatch(err.to_string()))?;
        Ok(())
    }
}

fn qos_from_u8(value: u8) -> QoS {
    match value {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mqtt_id_takes_segment_after_first_dash() {
        assert_eq!(mqtt_id("light-1"), "1");
        assert_eq!(mqtt_id("door_lock-entrance-2"), "entrance-2");
        assert_eq!(mqtt_id("nodash"), "nodash");
        assert_eq!(mqtt_id("trailing-"), "trailing-");
    }

    #[test]
    fn qos_mapping_defaults_to_at_least_once() {
        assert_eq!(qos_from_u8(0), QoS::AtMostOnce);
        assert_eq!(qos_from_u8(1), QoS::AtLeastOnce);
        assert_eq!(qos_from_u8(2), QoS::ExactlyOnce);
        assert_eq!(qos_from_u8(9), QoS::AtLeastOnce);
    }
}
