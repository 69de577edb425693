//! 激活相关类型
//!
//! 云端激活握手的请求/响应结构与结果类型。
//!
//! 使用者:
//! - barnacle-agent: 激活管理器与云代理
//! - 测试桩: 模拟云端返回的状态码

use serde::{Deserialize, Serialize};
use std::fmt;

/// 设备身份标识
///
/// 安装后稳定不变的不透明字符串，进程生命周期内只读共享。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// 从已解析的字符串创建
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 激活结果
///
/// 云端以整数状态码应答: `0` 表示成功，其余为失败码。
/// 每次进程启动重新推导，从不持久化。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStatus {
    /// 激活成功 (状态码 0)
    Success,
    /// 激活失败，携带云端状态码
    Failure(i32),
}

impl ActivationStatus {
    /// 从云端整数状态码转换
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            Self::Success
        } else {
            Self::Failure(code)
        }
    }

    /// 对应的整数状态码
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// 激活请求 (agent -> cloud)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateRequest {
    /// 设备身份标识
    pub device_id: String,
    /// agent 版本 (诊断用)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
}

/// 激活响应 (cloud -> agent)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateResponse {
    /// 状态码 (0 成功)
    pub status: i32,
    /// 错误信息 (失败时，调试用)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}
