//! UDP 监听器
//!
//! 每个数据报都是一个独立的工作单元: 解码 -> 入队。
//! 跨数据报不提供任何顺序保证。
//!
//! 套接字以 `Arc` 共享: [`UdpSender`] 让控制通道复用同一个
//! 套接字把指令回推给本地端点，而不是另开一个。

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::utils::AppError;
use shared::message::{InboundMessage, InboundPayload, MessageSource};

/// 单个数据报的最大字节数
const MAX_DATAGRAM_BYTES: usize = 4096;

/// UDP 监听器
#[derive(Debug)]
pub struct UdpListener {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
}

impl UdpListener {
    /// 绑定到指定端口
    ///
    /// # 错误
    ///
    /// 绑定失败 (端口占用、权限不足) 对整个 agent 是致命的。
    pub async fn bind(port: u16) -> Result<Self, AppError> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .await
            .map_err(|e| AppError::Bind {
                transport: "udp",
                port,
                source: e,
            })?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| AppError::internal(format!("UDP local_addr failed: {e}")))?;

        tracing::info!("UDP listener bound on {local_addr}");
        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
        })
    }

    /// 实际绑定的地址 (测试用端口 0 时从这里取真实端口)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 获取共享的发送句柄 (控制通道绑定用)
    pub fn sender(&self) -> UdpSender {
        UdpSender {
            socket: self.socket.clone(),
        }
    }

    /// 收包循环
    ///
    /// 解码失败的数据报记录后丢弃，循环继续服务后续数据报。
    pub async fn run(self, tx: mpsc::Sender<InboundMessage>, shutdown: CancellationToken) {
        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("UDP listener shutting down");
                    break;
                }

                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, addr)) => {
                            let payload = match InboundPayload::from_slice(&buf[..len]) {
                                Ok(p) => p,
                                Err(e) => {
                                    tracing::warn!(%addr, "Dropping malformed datagram: {e}");
                                    continue;
                                }
                            };

                            let inbound = InboundMessage::new(payload, MessageSource::udp(addr));
                            if tx.send(inbound).await.is_err() {
                                tracing::info!("Handler channel closed, UDP listener stopping");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!("UDP receive error: {e}");
                        }
                    }
                }
            }
        }
    }
}

/// 共享套接字的发送句柄
#[derive(Debug, Clone)]
pub struct UdpSender {
    socket: Arc<UdpSocket>,
}

impl UdpSender {
    /// 向指定地址发送一个数据报
    pub async fn send_to(&self, bytes: &[u8], target: SocketAddr) -> Result<(), AppError> {
        self.socket
            .send_to(bytes, target)
            .await
            .map_err(|e| AppError::internal(format!("UDP send to {target} failed: {e}")))?;
        Ok(())
    }
}
