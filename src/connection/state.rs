//! 连接状态定义
//! Connection state definitions

use serde::Serialize;
use std::fmt;

/// The lifecycle state of a connection.
///
/// `Idle → Connecting → {Connected, Failed}`, `Connected → Closed`.
/// `Failed` and `Closed` are terminal.
///
/// 连接的生命周期状态。`Failed` 与 `Closed` 为终止状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionState {
    /// Created, connect not yet issued.
    /// 已创建，尚未发起连接。
    Idle,
    /// The connect attempt is in flight.
    /// 连接尝试进行中。
    Connecting,
    /// The transport reported success.
    /// 传输报告连接成功。
    Connected,
    /// The transport reported failure.
    /// 传输报告连接失败。
    Failed,
    /// Removed explicitly or disconnected by the remote side.
    /// 被显式移除或被远端断开。
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "Idle",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Failed => "Failed",
            ConnectionState::Closed => "Closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Failed | ConnectionState::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
