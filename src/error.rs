//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use crate::{connection::ConnectionId, endpoint::Endpoint};
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the connection manager.
/// 连接管理器的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// The requested host/port pair was rejected before any connection was created.
    /// 请求的主机/端口在创建任何连接之前就被拒绝。
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        endpoint: Endpoint,
        reason: String,
    },

    /// The underlying transport could not establish the connection.
    /// The connection has already been evicted from the registry.
    ///
    /// 底层传输无法建立连接。该连接已经从注册表中被驱逐。
    #[error("connection failed: {0}")]
    ConnectFailed(#[source] TransportError),

    /// The connection is no longer present in the registry.
    /// 该连接已不在注册表中。
    #[error("connection {0} not found")]
    NotFound(ConnectionId),

    /// The configured maximum number of live connections has been reached.
    /// 已达到配置的最大活跃连接数。
    #[error("registry is full ({limit} connections)")]
    RegistryFull { limit: usize },

    /// No endpoint has ever been persisted.
    /// 从未持久化过任何端点。
    #[error("no previous endpoint recorded")]
    NoLastEndpoint,

    /// An underlying I/O error occurred while accessing the endpoint store.
    /// 访问端点存储时发生了底层I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The endpoint store contained data that could not be (de)serialized.
    /// 端点存储中的数据无法被（反）序列化。
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The cause of a failed connect attempt, as reported by a transport.
/// 传输层报告的连接失败原因。
#[derive(Debug, Error)]
pub enum TransportError {
    /// An I/O error occurred while connecting.
    /// 连接期间发生I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connect attempt did not complete within the configured timeout.
    /// 连接尝试未在配置的超时时间内完成。
    #[error("connect timed out after {0:?}")]
    TimedOut(Duration),

    /// The connection was removed from the registry while it was still connecting.
    /// 连接在建立过程中被从注册表中移除。
    #[error("connection was removed before it was established")]
    Cancelled,

    /// The remote side refused the connection.
    /// 远端拒绝了连接。
    #[error("rejected by server: {0}")]
    Rejected(String),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
