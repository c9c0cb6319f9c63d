//! MQTT 采集源
//!
//! 负责订阅管理与主题分类：
//! - `{prefix}/status/{id}`：智能设备状态消息
//! - 其他已订阅主题：基础传感器消息（负载形状由上层判断）
//!
//! 订阅/退订维护一个本地"已订阅"集合，重复调用幂等，
//! 可从任意任务并发调用。

use async_trait::async_trait;
use domain::now_epoch_ms;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// 入站原始消息。
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at_ms: i64,
}

/// 入站消息处理器。
#[async_trait]
pub trait RawMessageHandler: Send + Sync {
    async fn handle(&self, message: RawMessage) -> Result<(), IngestError>;
}

/// 采集源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn RawMessageHandler>) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(&self, _handler: Arc<dyn RawMessageHandler>) -> Result<(), IngestError> {
        Ok(())
    }
}

/// 主题分类结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicRoute {
    /// 智能设备状态消息，携带主题中的设备 id 段。
    Status { device_id: String },
    /// 其他主题（按基础传感器消息处理）。
    Other,
}

/// 对入站主题做纯函数分类。
///
/// `{prefix}/status/{id}` 且 id 为单个非空段时判定为状态消息，
/// 其余一律归入 Other。
pub fn route_topic(prefix: &str, topic: &str) -> TopicRoute {
    let prefix = prefix.trim_matches('/');
    let topic = topic.trim_matches('/');
    let rest = if prefix.is_empty() {
        topic
    } else {
        match topic.strip_prefix(prefix) {
            Some(rest) => rest.trim_start_matches('/'),
            None => return TopicRoute::Other,
        }
    };
    let Some(device_id) = rest.strip_prefix("status/") else {
        return TopicRoute::Other;
    };
    if device_id.is_empty() || device_id.contains('/') {
        return TopicRoute::Other;
    }
    TopicRoute::Status {
        device_id: device_id.to_string(),
    }
}

/// MQTT 采集源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_prefix: String,
}

/// MQTT 采集源。
///
/// 连接参数来自 [`MqttSourceConfig`]；`run` 只能调用一次，
/// 订阅/退订可在 `run` 之外的任意任务调用。
pub struct MqttSource {
    config: MqttSourceConfig,
    client: rumqttc::AsyncClient,
    eventloop: tokio::sync::Mutex<Option<rumqttc::EventLoop>>,
    subscribed: Mutex<HashSet<String>>,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        let client_id = format!("home-ingest-{}", now_epoch_ms());
        let mut options = rumqttc::MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (config.username.as_ref(), config.password.as_ref())
        {
            options.set_credentials(username, password);
        }
        let (client, eventloop) = rumqttc::AsyncClient::new(options, 10);
        Self {
            config,
            client,
            eventloop: tokio::sync::Mutex::new(Some(eventloop)),
            subscribed: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }

    /// 订阅主题（幂等）。
    pub async fn subscribe_topic(&self, topic: &str) -> Result<(), IngestError> {
        {
            let subscribed = self
                .subscribed
                .lock()
                .map_err(|_| IngestError::Source("subscription set poisoned".to_string()))?;
            if subscribed.contains(topic) {
                return Ok(());
            }
        }
        self.client
            .subscribe(topic, rumqttc::QoS::AtMostOnce)
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;
        let mut subscribed = self
            .subscribed
            .lock()
            .map_err(|_| IngestError::Source("subscription set poisoned".to_string()))?;
        subscribed.insert(topic.to_string());
        info!(target: "home.ingest", topic, "subscribed");
        Ok(())
    }

    /// 退订主题（幂等；未订阅时为空操作）。
    pub async fn unsubscribe_topic(&self, topic: &str) -> Result<(), IngestError> {
        {
            let mut subscribed = self
                .subscribed
                .lock()
                .map_err(|_| IngestError::Source("subscription set poisoned".to_string()))?;
            if !subscribed.remove(topic) {
                return Ok(());
            }
        }
        self.client
            .unsubscribe(topic)
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;
        info!(target: "home.ingest", topic, "unsubscribed");
        Ok(())
    }
}

#[async_trait]
impl Source for MqttSource {
    async fn run(&self, handler: Arc<dyn RawMessageHandler>) -> Result<(), IngestError> {
        let mut eventloop = self
            .eventloop
            .lock()
            .await
            .take()
            .ok_or_else(|| IngestError::Source("source already running".to_string()))?;

        let status_topic = format!(
            "{}/status/#",
            self.config.device_prefix.trim_end_matches('/')
        );
        self.subscribe_topic(&status_topic).await?;

        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish))) => {
                    let message = RawMessage {
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                        received_at_ms: now_epoch_ms(),
                    };
                    if let Err(err) = handler.handle(message).await {
                        warn!(target: "home.ingest", topic = %publish.topic, "message handler failed: {}", err);
                    }
                }
                Ok(_) => {}
                Err(err) => return Err(IngestError::Source(err.to_string())),
            }
        }
    }
}
