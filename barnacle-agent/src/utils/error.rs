//! 统一错误处理
//!
//! 提供应用级错误类型 [`AppError`] 与进程退出码映射。
//!
//! # 退出码规范
//!
//! | 退出码 | 条件 |
//! |--------|------|
//! | 0 | 成功 |
//! | 云端状态码 | 激活被云端拒绝 (透传整数码) |
//! | 1 | 其他不可恢复的启动错误 (配置、身份、端口绑定) |
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::validation("n must not be empty"))
//!
//! // 映射为退出码
//! std::process::exit(err.exit_code());
//! ```

/// 应用错误枚举
///
/// # 错误分类
///
/// | 分类 | 说明 |
/// |------|------|
/// | 致命错误 | 激活失败、身份解析失败、端口绑定失败、配置错误 |
/// | 可恢复错误 | 入站消息校验失败、稳态云端发送失败 |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 致命错误 ==========
    #[error("Activation rejected by cloud (status {0})")]
    /// 云端拒绝激活，携带状态码
    ActivationFailed(i32),

    #[error("Device identity error: {0}")]
    /// 设备身份解析失败
    Identity(String),

    #[error("Configuration error: {0}")]
    /// 配置加载/解析失败
    Config(String),

    #[error("Failed to bind {transport} listener on port {port}: {source}")]
    /// 监听器端口绑定失败 (无降级模式)
    Bind {
        transport: &'static str,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    // ========== 可恢复错误 ==========
    #[error("Validation failed: {0}")]
    /// 入站消息校验失败
    Validation(String),

    #[error("Cloud request failed: {0}")]
    /// 云端请求失败
    Cloud(String),

    // ========== 系统错误 ==========
    #[error("Invalid request: {0}")]
    /// 无效请求
    Invalid(String),

    #[error("Internal error: {0}")]
    /// 内部错误
    Internal(String),
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn cloud(msg: impl Into<String>) -> Self {
        Self::Cloud(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 映射为进程退出码
    ///
    /// 激活失败透传云端状态码，其余一律 1，
    /// 供外部监督进程决定是否重启。
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ActivationFailed(code) => *code,
            _ => 1,
        }
    }
}

/// 应用 Result 类型别名
pub type AppResult<T> = std::result::Result<T, AppError>;
