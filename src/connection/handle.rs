//! Non-owning references to registry connections.
//! 指向注册表连接的非拥有引用。

use super::{Connection, ConnectionId, ConnectionState};
use crate::{
    endpoint::Endpoint,
    error::{Error, Result},
};
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// A non-owning reference to a connection held by a registry.
///
/// Handles never keep a connection alive. Two handles are equal only when
/// they refer to the same connection object, so a handle from another
/// registry never matches even if the identifiers coincide.
///
/// 指向注册表中连接的非拥有引用。句柄不会延长连接的生命周期。
/// 只有引用同一个连接对象的两个句柄才相等，
/// 因此即使标识符相同，来自其他注册表的句柄也不会匹配。
pub struct ConnectionHandle<T> {
    id: ConnectionId,
    endpoint: Endpoint,
    inner: Weak<Connection<T>>,
}

impl<T> ConnectionHandle<T> {
    pub(crate) fn new(connection: &Arc<Connection<T>>) -> Self {
        Self {
            id: connection.id(),
            endpoint: connection.endpoint().clone(),
            inner: Arc::downgrade(connection),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the connection if it is still alive.
    /// 如果连接仍然存活则返回它。
    pub fn upgrade(&self) -> Option<Arc<Connection<T>>> {
        self.inner.upgrade()
    }

    /// Like [`upgrade`](Self::upgrade), but reports a dropped connection as `NotFound`.
    pub fn connection(&self) -> Result<Arc<Connection<T>>> {
        self.upgrade().ok_or(Error::NotFound(self.id))
    }

    /// The connection's state, or `Closed` once it has been dropped.
    /// 连接的状态；连接被释放后为 `Closed`。
    pub fn state(&self) -> ConnectionState {
        self.upgrade()
            .map_or(ConnectionState::Closed, |connection| connection.state())
    }

    pub(crate) fn refers_to(&self, connection: &Arc<Connection<T>>) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(connection))
    }
}

impl<T> Clone for ConnectionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            endpoint: self.endpoint.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for ConnectionHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for ConnectionHandle<T> {}

impl<T> fmt::Debug for ConnectionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
