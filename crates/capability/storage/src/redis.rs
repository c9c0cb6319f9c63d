//! Redis 基础传感器最近值缓存实现
//!
//! 键格式：`device:{id}:current_value`，默认 TTL 3600 秒。

use crate::error::StorageError;
use crate::traits::CurrentValueStore;
use redis::AsyncCommands;

/// 最近值缓存默认过期时间（秒）。
pub const DEFAULT_CURRENT_VALUE_TTL_SECONDS: u64 = 3600;

#[derive(serde::Serialize, serde::Deserialize)]
struct CurrentValuePayload {
    value: f64,
    status: String,
    ts_ms: i64,
}

fn current_value_key(device_id: &str) -> String {
    format!("device:{device_id}:current_value")
}

/// Redis 最近值缓存
pub struct RedisCurrentValueStore {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisCurrentValueStore {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            ttl_seconds: DEFAULT_CURRENT_VALUE_TTL_SECONDS,
        }
    }

    pub fn new_with_ttl(client: redis::Client, ttl_seconds: u64) -> Self {
        Self {
            client,
            ttl_seconds: ttl_seconds.max(1),
        }
    }

    pub fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let client =
            redis::Client::open(redis_url).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Self::new(client))
    }

    pub fn connect_with_ttl(redis_url: &str, ttl_seconds: u64) -> Result<Self, StorageError> {
        let client =
            redis::Client::open(redis_url).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Self::new_with_ttl(client, ttl_seconds))
    }
}

#[async_trait::async_trait]
impl CurrentValueStore for RedisCurrentValueStore {
    async fn set_current_value(
        &self,
        device_id: &str,
        value: f64,
        status: &str,
        ts_ms: i64,
    ) -> Result<(), StorageError> {
        let mut connection = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        let payload = CurrentValuePayload {
            value,
            status: status.to_string(),
            ts_ms,
        };
        let data =
            serde_json::to_string(&payload).map_err(|err| StorageError::new(err.to_string()))?;
        connection
            .set_ex::<_, _, ()>(current_value_key(device_id), data, self.ttl_seconds)
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        Ok(())
    }

    async fn get_current_value(
        &self,
        device_id: &str,
    ) -> Result<Option<(f64, String, i64)>, StorageError> {
        let mut connection = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        let data: Option<String> = connection
            .get(current_value_key(device_id))
            .await
            .map_err(|err| StorageError::new(err.to_string()))?;
        let Some(data) = data else {
            return Ok(None);
        };
        let payload: CurrentValuePayload =
            serde_json::from_str(&data).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Some((payload.value, payload.status, payload.ts_ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_value_key_format() {
        assert_eq!(
            current_value_key("temperature-12"),
            "device:temperature-12:current_value"
        );
    }
}
