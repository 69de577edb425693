//! 云代理 - 云端能力的本地接口
//!
//! 云端在本核心眼里只是一个不透明能力:
//! `activate` / `send` / `fetch_commands`。线协议与鉴权细节
//! 都留在 [`HttpCloudProxy`] 实现内部，接口之上的组件
//! (激活管理器、消息处理器、指令轮询) 只依赖 trait。

mod http;
mod worker;

pub use http::HttpCloudProxy;
pub use worker::CommandWorker;

use async_trait::async_trait;

use crate::utils::AppError;
use shared::activation::{ActivationStatus, DeviceIdentity};
use shared::control::ControlCommand;
use shared::message::CanonicalMessage;

/// 云代理特征
///
/// 所有云端交互必须经过此接口，测试以内存桩替换。
#[async_trait]
pub trait CloudProxy: Send + Sync + std::fmt::Debug {
    /// 向云端激活设备身份，返回整数状态码包装 (`0` = 成功)
    async fn activate(&self, identity: &DeviceIdentity) -> Result<ActivationStatus, AppError>;

    /// 转发一条规范消息
    async fn send(&self, message: &CanonicalMessage) -> Result<(), AppError>;

    /// 拉取云端待下发的控制指令
    async fn fetch_commands(&self) -> Result<Vec<ControlCommand>, AppError>;
}
