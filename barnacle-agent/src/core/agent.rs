//! Agent Runtime
//!
//! 常驻服务与一次性批处理两个入口，共享同一套
//! 激活管理器与消息处理器。

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cloud::{CloudProxy, CommandWorker, HttpCloudProxy};
use crate::control::ControlChannel;
use crate::core::Config;
use crate::listeners::{TcpListener, UdpListener};
use crate::message::MessageHandler;
use crate::services::{ActivatedContext, ActivationManager, ComponentRegistrar, IdentityResolver};
use crate::utils::AppResult;

/// 控制指令通道容量
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Agent 运行时
pub struct Agent {
    config: Config,
}

impl Agent {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 激活闸门: 身份解析 + 云端激活
    ///
    /// 服务模式与批处理模式都从这里开始；失败即本次运行终止。
    async fn activate(&self) -> AppResult<ActivatedContext> {
        self.config.ensure_data_dir()?;

        let cloud: Arc<dyn CloudProxy> = Arc::new(HttpCloudProxy::new(&self.config)?);
        let manager = ActivationManager::new(IdentityResolver::new(&self.config), cloud);
        manager.activate().await
    }

    /// 常驻服务入口
    ///
    /// 1. 激活 (阻塞闸门，失败即退出)
    /// 2. 绑定 UDP/TCP 监听器 (绑定失败致命，无降级模式)
    /// 3. 启动唯一的消息处理器与两个监听循环
    /// 4. 连接器在白名单内时绑定控制通道
    /// 5. 等待 ctrl-c，取消关闭令牌优雅退出
    pub async fn run_service(&self) -> AppResult<()> {
        // 1. Activation gate
        let ctx = self.activate().await?;

        // 2. Bind listeners before anything starts consuming
        let udp = UdpListener::bind(self.config.udp_port).await?;
        let tcp = TcpListener::bind(self.config.tcp_port).await?;

        let shutdown = CancellationToken::new();

        // 3. Single message handler, one channel, both listeners feed it
        let (tx, rx) = MessageHandler::channel();
        let handler = Arc::new(MessageHandler::new(ctx.cloud.clone()));
        tokio::spawn(handler.run(rx, shutdown.clone()));

        // 4. Control channel (before the UDP listener loop takes ownership)
        if self.config.default_connector.is_control_capable() {
            let control = ControlChannel::bind(&udp);
            let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
            let worker = CommandWorker::new(ctx.cloud.clone(), cmd_tx, shutdown.clone());
            tokio::spawn(worker.run());
            tokio::spawn(control.run(cmd_rx, shutdown.clone()));
        } else {
            tracing::info!(
                connector = %self.config.default_connector,
                "Control channel disabled: connector not control-capable"
            );
        }

        tracing::info!("Starting listeners...");
        tokio::spawn(udp.run(tx.clone(), shutdown.clone()));
        tokio::spawn(tcp.run(tx, shutdown.clone()));

        self.print_activated_banner(&ctx);

        // 5. Graceful shutdown
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
        shutdown.cancel();

        Ok(())
    }

    /// 批处理入口: 注册组件后退出
    ///
    /// 复用同一个激活闸门与消息处理器；激活失败时调用方以
    /// 云端状态码退出，投递失败以退出码 1 退出。
    pub async fn run_register(&self, name: &str, cataloged: bool) -> AppResult<()> {
        let ctx = self.activate().await?;

        let handler = MessageHandler::new(ctx.cloud.clone());
        let registrar = ComponentRegistrar::new(&self.config);
        let record = registrar.register(&handler, name, cataloged).await?;

        tracing::info!(
            "Components registered: {} (cataloged: {})",
            record.name,
            record.cataloged
        );
        Ok(())
    }

    /// 批处理入口: 清空本地组件目录 (从不触碰云端)
    pub fn run_reset(&self) -> AppResult<()> {
        self.config.ensure_data_dir()?;
        ComponentRegistrar::new(&self.config).reset()
    }

    /// 批处理入口: 打印本地组件目录
    pub fn run_catalog(&self) -> AppResult<()> {
        let records = ComponentRegistrar::new(&self.config).load()?;
        if records.is_empty() {
            println!("(no components registered)");
            return Ok(());
        }
        for record in records {
            println!(
                "{}  cataloged={}",
                record.name, record.cataloged
            );
        }
        Ok(())
    }

    /// 打印激活后的横幅内容 (日志)
    fn print_activated_banner(&self, ctx: &ActivatedContext) {
        tracing::info!(
            "╔══════════════════════════════════════════════════════════════════════╗"
        );
        tracing::info!(
            "║                     BARNACLE AGENT - ACTIVATED                       ║"
        );
        tracing::info!(
            "╚══════════════════════════════════════════════════════════════════════╝"
        );
        tracing::info!("  Device ID    : {}", ctx.identity);
        tracing::info!("  Cloud        : {}", self.config.cloud_url);
        tracing::info!("  UDP Listener : 0.0.0.0:{}", self.config.udp_port);
        tracing::info!("  TCP Listener : 0.0.0.0:{}", self.config.tcp_port);
        tracing::info!("  Connector    : {}", self.config.default_connector);
        tracing::info!(
            "════════════════════════════════════════════════════════════════════════"
        );
    }
}
