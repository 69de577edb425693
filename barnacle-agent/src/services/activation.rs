use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cloud::CloudProxy;
use crate::services::identity::IdentityResolver;
use crate::utils::AppError;
use shared::activation::{ActivationStatus, DeviceIdentity};

/// 激活状态机
///
/// ```text
/// Idle → ResolvingIdentity → Activating → Activated
///                                      └→ Failed(code)
/// ```
///
/// `Failed` 对本次运行是终态: 进程以该状态码退出，重启策略
/// 交给外部监督进程，本核心不做任何重试。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    /// 初始态
    Idle,
    /// 正在解析设备身份
    ResolvingIdentity,
    /// 正在与云端握手
    Activating,
    /// 激活成功，监听器可以启动
    Activated,
    /// 云端返回非零状态码 (终态)
    Failed(i32),
}

/// 激活成功后发放给依赖组件的上下文
///
/// 设备身份与云代理句柄创建一次后只读共享，
/// 是消息处理器、注册器、监听器启动的前置条件。
#[derive(Debug, Clone)]
pub struct ActivatedContext {
    pub identity: DeviceIdentity,
    pub cloud: Arc<dyn CloudProxy>,
}

/// 激活管理器 - 编排身份解析与云端激活
///
/// # 激活流程
///
/// ```text
/// 1. 进程启动 (或注册命令) 触发 activate()
/// 2. 解析设备身份 (失败 = 致命，退出码 1)
/// 3. CloudProxy::activate(identity)
///    - 状态码 0: 进入 Activated，发放 ActivatedContext
///    - 非零: 进入 Failed(code)，进程以该码退出
/// ```
#[derive(Debug)]
pub struct ActivationManager {
    resolver: IdentityResolver,
    cloud: Arc<dyn CloudProxy>,
    /// 当前状态 (供查询/测试观察)
    state: RwLock<ActivationState>,
}

impl ActivationManager {
    pub fn new(resolver: IdentityResolver, cloud: Arc<dyn CloudProxy>) -> Self {
        Self {
            resolver,
            cloud,
            state: RwLock::new(ActivationState::Idle),
        }
    }

    /// 当前状态机状态
    pub async fn state(&self) -> ActivationState {
        *self.state.read().await
    }

    async fn transition(&self, next: ActivationState) {
        let mut state = self.state.write().await;
        tracing::debug!(from = ?*state, to = ?next, "Activation state transition");
        *state = next;
    }

    /// 执行激活，成功时发放 [`ActivatedContext`]
    ///
    /// # 错误
    ///
    /// - 身份解析失败: [`AppError::Identity`] (退出码 1)
    /// - 云端拒绝: [`AppError::ActivationFailed`] (退出码 = 云端状态码)
    pub async fn activate(&self) -> Result<ActivatedContext, AppError> {
        self.transition(ActivationState::ResolvingIdentity).await;

        let identity = self.resolver.resolve().await.map_err(|e| {
            tracing::error!("Device identity resolution failed: {e}");
            e
        })?;
        tracing::info!("Device identity resolved: {}", identity);

        self.transition(ActivationState::Activating).await;

        match self.cloud.activate(&identity).await? {
            ActivationStatus::Success => {
                self.transition(ActivationState::Activated).await;
                tracing::info!("✅ Device activated against cloud");
                Ok(ActivatedContext {
                    identity,
                    cloud: self.cloud.clone(),
                })
            }
            ActivationStatus::Failure(code) => {
                self.transition(ActivationState::Failed(code)).await;
                tracing::error!("❌ Error in activation... err # : {code}");
                Err(AppError::ActivationFailed(code))
            }
        }
    }
}
