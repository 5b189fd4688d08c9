//! 会话选择器 - 决定哪个连接是"当前"连接
//! Session selector - decides which connection is the active one
//!
//! This is the policy UI code applies over the registry: connect and make the
//! new connection current, switch between live connections without tearing
//! any down, and log out by removing the current connection.
//!
//! 这是UI层在注册表之上应用的策略：连接并将新连接设为当前连接，
//! 在活跃连接之间切换而不断开任何连接，以及通过移除当前连接来登出。

use crate::{
    endpoint::Endpoint,
    error::{Error, Result},
    registry::{ConnectionRegistry, Handle},
    transport::Connector,
};
use std::sync::Arc;
use tracing::{debug, info};

/// The active-connection policy over a shared registry.
pub struct Session<C: Connector> {
    registry: Arc<ConnectionRegistry<C>>,
}

impl<C: Connector> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<C: Connector> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<C: Connector> Session<C> {
    pub fn new(registry: Arc<ConnectionRegistry<C>>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry<C>> {
        &self.registry
    }

    /// Connects to `host:port` and makes the new connection current.
    ///
    /// The previously current connection stays live. On failure the current
    /// selection is left as it was.
    ///
    /// 连接到 `host:port` 并将新连接设为当前连接。之前的当前连接保持存活。
    pub async fn connect(&self, host: impl Into<String>, port: u16) -> Result<Handle<C>> {
        let handle = self.registry.add_connection(host, port).await?;
        // A concurrent removal may already have taken it; the selection then stays as is.
        if self.registry.set_current_connection(Some(&handle)) {
            info!(id = %handle.id(), endpoint = %handle.endpoint(), "Session switched to new connection");
        }
        Ok(handle)
    }

    /// Like [`connect`](Self::connect), taking raw host and port text.
    /// 与 [`connect`](Self::connect) 相同，但接受原始的主机和端口文本。
    pub async fn connect_input(&self, host: &str, port: &str) -> Result<Handle<C>> {
        let Endpoint { host, port } = Endpoint::from_input(host, port)?;
        self.connect(host, port).await
    }

    /// Connects to the last endpoint that was connected successfully.
    /// 连接到最近一次成功连接的端点。
    pub async fn reconnect_last(&self) -> Result<Handle<C>> {
        let Endpoint { host, port } = self
            .registry
            .last_known_endpoint()
            .ok_or(Error::NoLastEndpoint)?;
        debug!(%host, port, "Reconnecting to last known endpoint");
        self.connect(host, port).await
    }

    /// Makes an existing live connection current. Nothing is torn down.
    ///
    /// A stale or foreign handle yields `NotFound` and leaves the current
    /// selection untouched.
    ///
    /// 将一个已存在的活跃连接设为当前连接，不会断开任何连接。
    pub fn switch_to(&self, handle: &Handle<C>) -> Result<()> {
        if self.registry.set_current_connection(Some(handle)) {
            Ok(())
        } else {
            Err(Error::NotFound(handle.id()))
        }
    }

    /// Removes the current connection. Returns the handle that was removed, if any.
    ///
    /// 移除当前连接，返回被移除的句柄（如果有）。
    pub async fn logout(&self) -> Option<Handle<C>> {
        let current = self.registry.current_connection()?;
        self.registry.remove_connection(&current).await;
        info!(id = %current.id(), endpoint = %current.endpoint(), "Logged out");
        Some(current)
    }

    pub fn current(&self) -> Option<Handle<C>> {
        self.registry.current_connection()
    }

    /// `host:port` of the current connection, used as the chat title.
    /// 当前连接的 `host:port`，用作聊天标题。
    pub fn current_title(&self) -> Option<String> {
        self.current().map(|handle| handle.endpoint().to_string())
    }
}
