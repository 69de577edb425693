//! 规范消息模型
//!
//! 所有传输层 (UDP/TCP) 解码进来的原始流量都归一化为同一种消息
//! 形状，再经由唯一的消息处理器转发到云端。
//!
//! ```text
//! UDP datagram ──┐
//!                ├──▶ InboundMessage ──▶ 校验 ──▶ CanonicalMessage ──▶ Cloud
//! TCP stream  ───┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use uuid::Uuid;

pub mod payload;
pub use payload::*;

use crate::util::now_millis;

/// 消息来源的传输类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Udp,
    Tcp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => write!(f, "udp"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// 消息来源 (传输类型 + 对端地址)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSource {
    pub transport: TransportKind,
    /// 对端地址 (UDP 为发送方地址，TCP 为连接对端)
    pub addr: Option<SocketAddr>,
}

impl MessageSource {
    pub fn udp(addr: SocketAddr) -> Self {
        Self {
            transport: TransportKind::Udp,
            addr: Some(addr),
        }
    }

    pub fn tcp(addr: SocketAddr) -> Self {
        Self {
            transport: TransportKind::Tcp,
            addr: Some(addr),
        }
    }

    /// 本地管理流程 (批处理注册) 的来源，无网络地址
    pub fn local() -> Self {
        Self {
            transport: TransportKind::Tcp,
            addr: None,
        }
    }
}

/// 监听器解码后、尚未通过校验的入站消息
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub payload: InboundPayload,
    pub source: MessageSource,
}

impl InboundMessage {
    pub fn new(payload: InboundPayload, source: MessageSource) -> Self {
        Self { payload, source }
    }
}

/// 规范消息 - 校验通过后构造，恰好被消费一次
///
/// 不变量: `name` 非空 (由构造前的 schema 校验保证)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMessage {
    /// 消息追踪 ID
    pub message_id: Uuid,
    /// 组件/指标名称
    pub name: String,
    pub payload: InboundPayload,
    pub source: MessageSource,
}

impl CanonicalMessage {
    /// 从已校验的入站消息构造
    ///
    /// 观测值缺失 `on` 时间戳时以当前时间补齐。
    pub fn from_inbound(inbound: InboundMessage) -> Self {
        let InboundMessage {
            mut payload,
            source,
        } = inbound;

        if let InboundPayload::Reading { on, .. } = &mut payload
            && on.is_none()
        {
            *on = Some(now_millis());
        }

        Self {
            message_id: Uuid::new_v4(),
            name: payload.name().to_string(),
            payload,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_from_reading_stamps_timestamp() {
        let inbound = InboundMessage::new(
            InboundPayload::from_slice(br#"{"n":"temp","v":26.7}"#).unwrap(),
            MessageSource::udp("127.0.0.1:9999".parse().unwrap()),
        );

        let msg = CanonicalMessage::from_inbound(inbound);
        assert_eq!(msg.name, "temp");
        assert!(!msg.message_id.is_nil());
        match msg.payload {
            InboundPayload::Reading { on, .. } => assert!(on.is_some()),
            _ => panic!("expected reading payload"),
        }
    }

    #[test]
    fn test_canonical_keeps_explicit_timestamp() {
        let inbound = InboundMessage::new(
            InboundPayload::from_slice(br#"{"n":"temp","v":1,"on":1234567}"#).unwrap(),
            MessageSource::tcp("127.0.0.1:9999".parse().unwrap()),
        );

        let msg = CanonicalMessage::from_inbound(inbound);
        match msg.payload {
            InboundPayload::Reading { on, .. } => assert_eq!(on, Some(1234567)),
            _ => panic!("expected reading payload"),
        }
    }

    #[test]
    fn test_canonical_from_registration() {
        // 注册消息没有时间戳语义
        let inbound = InboundMessage::new(
            InboundPayload::from_slice(br#"{"n":"temp-sensor","t":true}"#).unwrap(),
            MessageSource::local(),
        );

        let msg = CanonicalMessage::from_inbound(inbound);
        assert_eq!(msg.name, "temp-sensor");
        assert!(msg.source.addr.is_none());
    }

    #[test]
    fn test_canonical_message_serializes() {
        let inbound = InboundMessage::new(
            InboundPayload::from_slice(br#"{"n":"hum","v":55}"#).unwrap(),
            MessageSource::udp("10.0.0.2:41234".parse().unwrap()),
        );
        let msg = CanonicalMessage::from_inbound(inbound);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["name"], "hum");
        assert_eq!(json["source"]["transport"], "udp");
    }
}
