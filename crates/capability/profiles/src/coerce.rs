//! 原始载荷字段读取与区间 clamp。
//!
//! 转换从不拒绝：读不到或读出非法值时落到文档化默认值，数值越界
//! 时 clamp 进声明区间。`Coerced` 显式携带 clamp 标记，让该行为
//! 可被测试观察，而不是悄悄发生。

use domain::BaseDeviceState;
use serde_json::Value;

/// clamp 结果：值 + 是否发生过 clamp。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced {
    pub value: f64,
    pub clamped: bool,
}

/// 将数值 clamp 进闭区间 [min, max]。
pub fn clamp_f64(value: f64, min: f64, max: f64) -> Coerced {
    if value < min {
        Coerced {
            value: min,
            clamped: true,
        }
    } else if value > max {
        Coerced {
            value: max,
            clamped: true,
        }
    } else {
        Coerced {
            value,
            clamped: false,
        }
    }
}

/// 读取数值字段：数字、数字字符串或布尔（1/0），缺失或不可转换时取默认值。
pub fn num_field(raw: &Value, key: &str, default: f64) -> f64 {
    match raw.get(key) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(default),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(default),
        Some(Value::Bool(flag)) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        _ => default,
    }
}

/// 读取布尔字段：布尔、非零数字或 "true"/"1"/"on"，缺失时取默认值。
pub fn bool_field(raw: &Value, key: &str, default: bool) -> bool {
    match raw.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map(|value| value != 0.0).unwrap_or(default),
        Some(Value::String(text)) => matches!(text.as_str(), "true" | "1" | "on"),
        _ => default,
    }
}

/// 读取字符串字段：非空字符串原样保留（非法值留给校验层报告），缺失时取默认值。
pub fn str_field(raw: &Value, key: &str, default: &str) -> String {
    match raw.get(key) {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        _ => default.to_string(),
    }
}

/// 读取时间戳字段（Unix 毫秒），缺失或不可解析时取 `now_ms`。
pub fn ts_field(raw: &Value, key: &str, now_ms: i64) -> i64 {
    match raw.get(key) {
        Some(Value::Number(number)) => number.as_i64().unwrap_or(now_ms),
        Some(Value::String(text)) => text.trim().parse::<i64>().unwrap_or(now_ms),
        _ => now_ms,
    }
}

/// 从原始载荷提取基础字段；`last_update` 一律取处理时刻。
///
/// 线上载荷对基础字段存在两种命名（snake/camel），两者都接受。
pub fn base_from_raw(raw: &Value, now_ms: i64) -> BaseDeviceState {
    let error_state = raw
        .get("error_state")
        .or_else(|| raw.get("errorState"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    BaseDeviceState {
        online: bool_field(raw, "online", false),
        last_update: now_ms,
        error_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_marks_out_of_range_values() {
        assert_eq!(
            clamp_f64(150.0, 0.0, 100.0),
            Coerced {
                value: 100.0,
                clamped: true
            }
        );
        assert_eq!(
            clamp_f64(-5.0, 0.0, 100.0),
            Coerced {
                value: 0.0,
                clamped: true
            }
        );
        assert_eq!(
            clamp_f64(42.0, 0.0, 100.0),
            Coerced {
                value: 42.0,
                clamped: false
            }
        );
    }

    #[test]
    fn num_field_converts_strings_and_defaults() {
        let raw = json!({ "a": 5, "b": "7.5", "c": true, "d": [1] });
        assert_eq!(num_field(&raw, "a", 0.0), 5.0);
        assert_eq!(num_field(&raw, "b", 0.0), 7.5);
        assert_eq!(num_field(&raw, "c", 0.0), 1.0);
        assert_eq!(num_field(&raw, "d", 3.0), 3.0);
        assert_eq!(num_field(&raw, "missing", 9.0), 9.0);
    }

    #[test]
    fn bool_field_accepts_common_truthy_forms() {
        let raw = json!({ "a": true, "b": 1, "c": "on", "d": "off", "e": 0 });
        assert!(bool_field(&raw, "a", false));
        assert!(bool_field(&raw, "b", false));
        assert!(bool_field(&raw, "c", false));
        assert!(!bool_field(&raw, "d", true));
        assert!(!bool_field(&raw, "e", true));
        assert!(bool_field(&raw, "missing", true));
    }

    #[test]
    fn str_field_keeps_unknown_values_for_validation() {
        let raw = json!({ "mode": "turbo", "empty": "" });
        assert_eq!(str_field(&raw, "mode", "auto"), "turbo");
        assert_eq!(str_field(&raw, "empty", "auto"), "auto");
        assert_eq!(str_field(&raw, "missing", "auto"), "auto");
    }

    #[test]
    fn ts_field_falls_back_to_now() {
        let raw = json!({ "at": 1_700_000_000_000_i64, "bad": "later" });
        assert_eq!(ts_field(&raw, "at", 1), 1_700_000_000_000);
        assert_eq!(ts_field(&raw, "bad", 1), 1);
        assert_eq!(ts_field(&raw, "missing", 1), 1);
    }
}
