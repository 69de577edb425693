//! 控制通道 - 云端指令下行
//!
//! 绑定到已在监听的 UDP 监听器上，把云端推送的控制/执行指令
//! 作为 UDP 数据报回推给指令携带的目标地址。复用监听器的
//! 套接字，而不是另开第二个。
//!
//! 只有默认连接器在控制能力白名单内 (`mqtt` / `rest+ws`) 时才会
//! 绑定本通道；其余连接器下控制指令不受支持，这是有意的
//! 功能闸门而非缺陷 (由 [`Connector::is_control_capable`] 判定)。
//!
//! [`Connector::is_control_capable`]: crate::core::Connector::is_control_capable

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::listeners::{UdpListener, UdpSender};
use crate::utils::AppError;
use shared::control::ControlCommand;

/// 控制通道
#[derive(Debug, Clone)]
pub struct ControlChannel {
    udp: UdpSender,
}

impl ControlChannel {
    /// 绑定到一个已在监听的 UDP 监听器
    pub fn bind(listener: &UdpListener) -> Self {
        tracing::info!("Control channel bound to UDP listener");
        Self {
            udp: listener.sender(),
        }
    }

    /// 把一条指令回推给它标记的目标地址
    pub async fn relay(&self, command: &ControlCommand) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(&command.payload)
            .map_err(|e| AppError::internal(format!("Cannot serialize command payload: {e}")))?;
        self.udp.send_to(&bytes, command.target).await?;

        tracing::debug!(target = %command.target, "Control command relayed");
        Ok(())
    }

    /// 指令转发循环
    ///
    /// 单条指令的转发失败记录后继续，不影响后续指令。
    pub async fn run(self, mut rx: mpsc::Receiver<ControlCommand>, shutdown: CancellationToken) {
        tracing::info!("Control channel started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Control channel shutting down");
                    break;
                }

                command = rx.recv() => {
                    match command {
                        Some(command) => {
                            if let Err(e) = self.relay(&command).await {
                                tracing::warn!(target = %command.target, "Control relay failed: {e}");
                            }
                        }
                        None => {
                            tracing::info!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Control channel stopped");
    }
}
