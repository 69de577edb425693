use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==================== Wire Payloads ====================

/// 入站消息载荷 - 传感器侧 JSON 线格式的两种形状
///
/// - 观测值: `{"n": "temp", "v": 26.7, "on": 1700000000000}` (`on` 可选)
/// - 组件注册: `{"n": "temp-sensor", "t": true}`
///
/// `untagged` 解析顺序: 先尝试观测值 (需要 `v`)，再尝试注册 (需要 `t`)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundPayload {
    /// 传感器观测值
    Reading {
        /// 指标名称
        n: String,
        /// 观测值 (数值、字符串或结构化数据)
        v: serde_json::Value,
        /// 观测时间戳 (毫秒)，缺失时由规范化补齐
        #[serde(skip_serializing_if = "Option::is_none", default)]
        on: Option<i64>,
    },
    /// 组件注册
    Registration {
        /// 组件名称
        n: String,
        /// 是否属于领域目录
        t: bool,
    },
}

impl InboundPayload {
    /// 构造一条注册载荷
    pub fn registration(name: impl Into<String>, cataloged: bool) -> Self {
        Self::Registration {
            n: name.into(),
            t: cataloged,
        }
    }

    /// 构造一条观测载荷
    pub fn reading(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::Reading {
            n: name.into(),
            v: value,
            on: None,
        }
    }

    /// 从原始字节解码 (监听器收包路径)
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
        serde_json::from_slice(bytes).map_err(PayloadError::Decode)
    }

    /// 载荷携带的名称字段
    pub fn name(&self) -> &str {
        match self {
            Self::Reading { n, .. } => n,
            Self::Registration { n, .. } => n,
        }
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Registration { .. })
    }
}

/// 载荷解码错误
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("not a recognized message shape: {0}")]
    Decode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reading() {
        let p = InboundPayload::from_slice(br#"{"n":"temp","v":26.7}"#).unwrap();
        match p {
            InboundPayload::Reading { n, v, on } => {
                assert_eq!(n, "temp");
                assert_eq!(v, serde_json::json!(26.7));
                assert!(on.is_none());
            }
            _ => panic!("expected reading"),
        }
    }

    #[test]
    fn test_parse_reading_with_timestamp() {
        let p = InboundPayload::from_slice(br#"{"n":"temp","v":1,"on":1700000000000}"#).unwrap();
        match p {
            InboundPayload::Reading { on, .. } => assert_eq!(on, Some(1700000000000)),
            _ => panic!("expected reading"),
        }
    }

    #[test]
    fn test_parse_registration() {
        // {n, t} 缺少 v，不会被误判为观测值
        let p = InboundPayload::from_slice(br#"{"n":"temp-sensor","t":true}"#).unwrap();
        assert!(p.is_registration());
        assert_eq!(p.name(), "temp-sensor");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(InboundPayload::from_slice(b"not json").is_err());
        assert!(InboundPayload::from_slice(br#"{"x":1}"#).is_err());
        assert!(InboundPayload::from_slice(br#"{"n":"temp"}"#).is_err());
        assert!(InboundPayload::from_slice(br#"[1,2,3]"#).is_err());
    }

    #[test]
    fn test_reading_serializes_without_null_timestamp() {
        let p = InboundPayload::reading("temp", serde_json::json!(5));
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("on"));
    }
}
