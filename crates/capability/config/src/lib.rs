//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub redis_url: String,
    pub redis_current_value_ttl_seconds: u64,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_device_prefix: String,
    pub mqtt_command_qos: u8,
    pub ingest_enabled: bool,
    pub control_enabled: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("HOME_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("HOME_DATABASE_URL".to_string()))?;
        let http_addr =
            env::var("HOME_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let redis_url = env::var("HOME_REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let redis_current_value_ttl_seconds =
            read_u64_with_default("HOME_REDIS_CURRENT_VALUE_TTL_SECONDS", 3600)?;
        let mqtt_host = env::var("HOME_MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let mqtt_port = read_u16_with_default("HOME_MQTT_PORT", 1883)?;
        let mqtt_username = read_optional("HOME_MQTT_USERNAME");
        let mqtt_password = read_optional("HOME_MQTT_PASSWORD");
        let mqtt_device_prefix =
            env::var("HOME_MQTT_DEVICE_PREFIX").unwrap_or_else(|_| "home/devices".to_string());
        let mqtt_command_qos = read_u8_with_default("HOME_MQTT_COMMAND_QOS", 1)?;
        let ingest_enabled = read_bool_with_default("HOME_INGEST", true);
        let control_enabled = read_bool_with_default("HOME_CONTROL", true);

        Ok(Self {
            http_addr,
            database_url,
            redis_url,
            redis_current_value_ttl_seconds,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_device_prefix,
            mqtt_command_qos,
            ingest_enabled,
            control_enabled,
        })
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
