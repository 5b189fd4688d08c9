//! A plain TCP transport.
//!
//! Establishes the stream only; message framing is left to whoever takes
//! the stream afterwards. The application name and `secure` flag of
//! `ConnectionConfig` are carried for that party; no TLS is negotiated here.
//!
//! 纯TCP传输。只负责建立流，消息分帧由之后取走流的一方处理。
//! `ConnectionConfig` 的应用名称和 `secure` 标志会传递给该方，此处不协商TLS。

use super::{Connector, Transport};
use crate::{
    config::ConnectionConfig,
    connection::ConnectionId,
    endpoint::Endpoint,
    error::TransportError,
};
use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, net::TcpStream, sync::Mutex};
use tracing::{debug, trace};

/// Builds [`TcpTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Transport = TcpTransport;

    fn build(
        &self,
        id: ConnectionId,
        endpoint: &Endpoint,
        config: &ConnectionConfig,
    ) -> TcpTransport {
        TcpTransport {
            id,
            endpoint: endpoint.clone(),
            application_name: config.application_name.clone(),
            secure: config.secure,
            nodelay: config.nodelay,
            stream: Mutex::new(None),
        }
    }
}

/// A TCP stream to one endpoint.
#[derive(Debug)]
pub struct TcpTransport {
    id: ConnectionId,
    endpoint: Endpoint,
    application_name: String,
    secure: bool,
    nodelay: bool,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpTransport {
    /// The application name to announce once the stream is framed.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Whether a secure channel was requested for this connection.
    /// 是否为该连接请求了安全通道。
    pub fn secure_requested(&self) -> bool {
        self.secure
    }

    /// Takes the established stream, leaving the transport without one.
    ///
    /// 取走已建立的流，传输中将不再持有该流。
    pub async fn take_stream(&self) -> Option<TcpStream> {
        self.stream.lock().await.take()
    }

    pub async fn is_open(&self) -> bool {
        self.stream.lock().await.is_some()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        trace!(
            id = %self.id,
            endpoint = %self.endpoint,
            application = %self.application_name,
            secure = self.secure,
            "Opening TCP stream"
        );
        let stream = TcpStream::connect((self.endpoint.host.as_str(), self.endpoint.port)).await?;
        stream.set_nodelay(self.nodelay)?;
        debug!(id = %self.id, peer = ?stream.peer_addr().ok(), "TCP stream established");
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(mut stream) = self.stream.lock().await.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(id = %self.id, error = %e, "TCP shutdown failed");
            }
        }
    }
}
