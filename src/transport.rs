//! Transport abstraction for individual connections.
//!
//! The registry never speaks a wire protocol itself. It asks a [`Connector`]
//! to build one [`Transport`] per connection and only drives its
//! connect/disconnect lifecycle.
//!
//! 单个连接的传输抽象。注册表本身不实现任何线路协议，
//! 它请求 [`Connector`] 为每个连接构建一个 [`Transport`]，并只驱动其连接/断开生命周期。

pub mod tcp;

use crate::{
    config::ConnectionConfig,
    connection::ConnectionId,
    endpoint::Endpoint,
    error::TransportError,
};
use async_trait::async_trait;

pub use tcp::{TcpConnector, TcpTransport};

/// The link underneath one connection.
///
/// 单个连接底层的链路。
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establishes the link. An `Err` means no usable connection exists.
    /// 建立链路。返回 `Err` 表示没有可用的连接。
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tears the link down. Called at most once, and only after a successful `connect`.
    /// 断开链路。最多调用一次，且仅在 `connect` 成功之后调用。
    async fn disconnect(&self);
}

/// Builds a transport for each new connection.
///
/// 为每个新连接构建传输。
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// Creates an idle transport bound to `endpoint`. Must not perform I/O.
    /// 创建绑定到 `endpoint` 的空闲传输。不得执行I/O。
    fn build(
        &self,
        id: ConnectionId,
        endpoint: &Endpoint,
        config: &ConnectionConfig,
    ) -> Self::Transport;
}
