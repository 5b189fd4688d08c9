//! 定义了单个用户连接。
//! Defines a single user connection.

mod handle;
pub mod lifecycle;
mod state;

pub use handle::ConnectionHandle;
pub use state::ConnectionState;

use crate::endpoint::Endpoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::{sync::watch, time::Instant};

/// A process-unique connection identifier.
///
/// Identifiers are handed out in increasing order starting from `0` and are
/// never reused, even after the connection they named has been removed.
///
/// 进程内唯一的连接标识符。标识符从 `0` 开始递增分配，
/// 即使对应的连接已被移除也永不复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One logical link to a chat server.
///
/// The registry owns every `Connection` while it is live; callers reach it
/// through a non-owning [`ConnectionHandle`].
///
/// 到聊天服务器的一条逻辑链路。连接存活期间由注册表独占拥有；
/// 调用方通过非拥有的 [`ConnectionHandle`] 访问它。
pub struct Connection<T> {
    id: ConnectionId,
    endpoint: Endpoint,
    created_at: Instant,
    transport: T,
    state: watch::Sender<ConnectionState>,
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl<T> Connection<T> {
    pub(crate) fn new(id: ConnectionId, endpoint: Endpoint, transport: T) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            id,
            endpoint,
            created_at: Instant::now(),
            transport,
            state,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// The transport this connection was built with.
    /// 此连接所使用的传输。
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribes to state changes of this connection.
    /// 订阅此连接的状态变化。
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Resolves once the connection has reached a terminal state.
    /// 当连接进入终止状态时完成。
    pub async fn wait_closed(&self) {
        let mut rx = self.state.subscribe();
        loop {
            if rx.borrow_and_update().is_terminal() {
                return;
            }
            // The sender lives as long as `self`, so this only fails on teardown.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub(crate) fn state_cell(&self) -> &watch::Sender<ConnectionState> {
        &self.state
    }
}
