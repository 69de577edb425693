use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::utils::AppError;

/// 代理配置 - IoT 网关节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATA_DIR | /var/lib/barnacle | 数据目录 (设备身份、组件目录) |
/// | UDP_PORT | 41234 | UDP 监听端口 |
/// | TCP_PORT | 7070 | TCP 监听端口 |
/// | CLOUD_URL | http://localhost:3001 | 云端 API 地址 |
/// | DEFAULT_CONNECTOR | rest+ws | 默认连接器 (mqtt / rest+ws / rest) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录，缺省仅输出到终端 |
///
/// 用户配置文件 (`-C <path>`, TOML) 的同名字段优先于环境变量。
///
/// # 示例
///
/// ```ignore
/// DATA_DIR=/data/barnacle UDP_PORT=41250 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 数据目录，存储设备身份与组件目录文件
    pub data_dir: String,
    /// UDP 监听端口
    pub udp_port: u16,
    /// TCP 监听端口
    pub tcp_port: u16,
    /// 云端 API 地址 (用于激活与消息转发)
    pub cloud_url: String,
    /// 默认连接器，决定控制通道是否绑定
    pub default_connector: Connector,
    /// 日志级别
    pub log_level: Option<String>,
    /// 日志文件目录
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/var/lib/barnacle".into()),
            udp_port: std::env::var("UDP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(41234),
            tcp_port: std::env::var("TCP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7070),
            cloud_url: std::env::var("CLOUD_URL")
                .unwrap_or_else(|_| "http://localhost:3001".into()),
            default_connector: std::env::var("DEFAULT_CONNECTOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Connector::RestWs),
            log_level: std::env::var("LOG_LEVEL").ok(),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// 加载配置: 环境变量 + 可选的用户配置文件覆盖
    ///
    /// 配置文件路径不存在视为不可恢复的启动错误 (退出码 1)。
    pub fn load(user_config: Option<&Path>) -> Result<Self, AppError> {
        let mut config = Self::from_env();

        if let Some(path) = user_config {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                AppError::config(format!("cannot read user config {}: {e}", path.display()))
            })?;
            let overlay = ConfigFile::from_toml_str(&raw)?;
            config.apply(overlay);
            tracing::info!("User config loaded from {}", path.display());
        }

        Ok(config)
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(data_dir: impl Into<String>, udp_port: u16, tcp_port: u16) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.udp_port = udp_port;
        config.tcp_port = tcp_port;
        config
    }

    fn apply(&mut self, overlay: ConfigFile) {
        if let Some(v) = overlay.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = overlay.udp_port {
            self.udp_port = v;
        }
        if let Some(v) = overlay.tcp_port {
            self.tcp_port = v;
        }
        if let Some(v) = overlay.cloud_url {
            self.cloud_url = v;
        }
        if let Some(v) = overlay.default_connector {
            self.default_connector = v;
        }
        if let Some(v) = overlay.log_level {
            self.log_level = Some(v);
        }
        if let Some(v) = overlay.log_dir {
            self.log_dir = Some(v);
        }
    }

    /// 组件目录文件路径
    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("components.json")
    }

    /// 设备身份缓存文件路径
    pub fn identity_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("device-id")
    }

    /// 确保数据目录存在
    pub fn ensure_data_dir(&self) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            AppError::config(format!("cannot create data dir {}: {e}", self.data_dir))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 用户配置文件 (TOML) 的可选字段
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub data_dir: Option<String>,
    pub udp_port: Option<u16>,
    pub tcp_port: Option<u16>,
    pub cloud_url: Option<String>,
    pub default_connector: Option<Connector>,
    pub log_level: Option<String>,
    pub log_dir: Option<String>,
}

impl ConfigFile {
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| AppError::config(format!("invalid user config: {e}")))
    }
}

/// 默认连接器 - 云端指令下行的投递方式
///
/// 控制通道只在具备指令能力的连接器下绑定 (`mqtt` / `rest+ws`)；
/// 纯 `rest` 连接器不支持控制指令，这是有意的功能闸门。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Connector {
    #[serde(rename = "mqtt")]
    Mqtt,
    #[serde(rename = "rest+ws")]
    RestWs,
    #[serde(rename = "rest")]
    Rest,
}

impl Connector {
    /// 是否在控制能力白名单内
    pub fn is_control_capable(&self) -> bool {
        matches!(self, Self::Mqtt | Self::RestWs)
    }
}

impl FromStr for Connector {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mqtt" => Ok(Self::Mqtt),
            "rest+ws" => Ok(Self::RestWs),
            "rest" => Ok(Self::Rest),
            other => Err(AppError::config(format!("unknown connector: {other}"))),
        }
    }
}

impl std::fmt::Display for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mqtt => write!(f, "mqtt"),
            Self::RestWs => write!(f, "rest+ws"),
            Self::Rest => write!(f, "rest"),
        }
    }
}
