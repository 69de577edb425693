//! 传输监听器 - UDP/TCP 入口
//!
//! 两个常驻监听器把异构来源的原始流量解码成同一种入站消息，
//! 送进唯一的消息处理器通道:
//!
//! ```text
//!     ┌──────────────┐
//!     │ UdpListener  │──┐
//!     └──────────────┘  │   mpsc (单消费者)
//!                       ├──────────────────▶ MessageHandler
//!     ┌──────────────┐  │
//!     │ TcpListener  │──┘
//!     └──────────────┘
//! ```
//!
//! 启动顺序: 激活成功之前不得启动任何监听循环。
//! 端口绑定失败对整个 agent 是致命的，没有单传输降级模式。

pub mod tcp;
pub mod udp;

pub use tcp::TcpListener;
pub use udp::{UdpListener, UdpSender};
