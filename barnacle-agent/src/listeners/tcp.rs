//! TCP 监听器
//!
//! 负责处理 TCP 客户端连接，包括：
//! - 监听连接
//! - 按行 (newline-delimited JSON) 解码消息
//! - 按接收顺序入队到消息处理器通道
//!
//! 同一连接内的消息保持流序: 每个连接一个顺序读取任务，
//! `tx.send().await` 逐条排队。跨连接、跨传输不保证顺序。

use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::utils::AppError;
use shared::message::{InboundMessage, InboundPayload, MessageSource};

/// TCP 监听器
#[derive(Debug)]
pub struct TcpListener {
    listener: tokio::net::TcpListener,
    local_addr: SocketAddr,
}

impl TcpListener {
    /// 绑定到指定端口
    ///
    /// # 错误
    ///
    /// 绑定失败对整个 agent 是致命的。
    pub async fn bind(port: u16) -> Result<Self, AppError> {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| AppError::Bind {
                transport: "tcp",
                port,
                source: e,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AppError::internal(format!("TCP local_addr failed: {e}")))?;

        tracing::info!("TCP listener bound on {local_addr}");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// 实际绑定的地址
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Main accept loop
    pub async fn run(self, tx: mpsc::Sender<InboundMessage>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("TCP listener shutting down");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::debug!("Client connected: {addr}");
                            let tx = tx.clone();
                            let shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, addr, tx, shutdown).await {
                                    tracing::debug!("Client {addr} handler finished: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {e}");
                        }
                    }
                }
            }
        }
    }
}

/// Handle a single client connection
///
/// 顺序读取保证同一连接内消息按接收顺序入队。
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    tx: mpsc::Sender<InboundMessage>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let mut lines = BufReader::new(stream).lines();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                break;
            }

            read_result = lines.next_line() => {
                match read_result {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }

                        let payload = match InboundPayload::from_slice(trimmed.as_bytes()) {
                            Ok(p) => p,
                            Err(e) => {
                                tracing::warn!(%addr, "Dropping malformed line: {e}");
                                continue;
                            }
                        };

                        let inbound = InboundMessage::new(payload, MessageSource::tcp(addr));
                        if tx.send(inbound).await.is_err() {
                            return Err(AppError::internal("Handler channel closed"));
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("Client {addr} disconnected");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!("Client {addr} read error: {e}");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
