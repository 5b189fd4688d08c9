//! 用户连接注册表 - 管理所有活跃连接及当前连接
//! User connection registry - owns every live connection and the current selection
//!
//! The registry is the single authority over which connections exist. It
//! allocates identifiers, drives each connection's connect attempt, evicts
//! connections whose attempt fails, and keeps a non-owning "current" pointer
//! that resolves to nothing once its target is removed.
//!
//! 注册表是连接是否存在的唯一权威。它分配标识符、驱动每个连接的连接尝试、
//! 驱逐连接失败的连接，并维护一个非拥有的"当前连接"指针，
//! 其目标被移除后该指针即解析为空。

mod builder;

pub use builder::RegistryBuilder;

use crate::{
    config::Config,
    connection::{
        Connection, ConnectionHandle, ConnectionId, ConnectionState,
        lifecycle::{LifecycleEvent, StateTransitionExecutor, StateValidator},
    },
    endpoint::{Endpoint, EndpointValidator},
    error::{Error, Result, TransportError},
    store::EndpointStore,
    transport::{Connector, Transport},
};
use dashmap::DashMap;
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Handle type produced by a registry over connector `C`.
pub type Handle<C> = ConnectionHandle<<C as Connector>::Transport>;

type Entry<C> = Arc<Connection<<C as Connector>::Transport>>;

/// The process-wide set of user connections.
///
/// Construct one at startup with [`ConnectionRegistry::builder`] and pass it
/// to whoever needs it.
///
/// 进程范围的用户连接集合。
pub struct ConnectionRegistry<C: Connector> {
    connector: C,
    config: Config,
    connections: DashMap<ConnectionId, Entry<C>>,
    /// 下一个标识符；分配与插入在同一把锁下完成
    /// Next identifier; allocation and insertion happen under this lock
    next_id: Mutex<u64>,
    current: watch::Sender<Option<ConnectionId>>,
    store: Arc<dyn EndpointStore>,
    validator: Box<dyn EndpointValidator>,
    executor: StateTransitionExecutor,
}

impl<C: Connector> fmt::Debug for ConnectionRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("current", &*self.current.borrow())
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish()
    }
}

impl<C: Connector> ConnectionRegistry<C> {
    pub fn builder(connector: C) -> RegistryBuilder<C> {
        RegistryBuilder::new(connector)
    }

    /// A registry with default configuration and an in-memory endpoint store.
    pub fn new(connector: C) -> Self {
        Self::builder(connector).build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Establishes a new connection to `host:port`.
    ///
    /// The connection is inserted in `Idle` state and becomes visible before the
    /// connect attempt resolves. On success the endpoint is persisted as the
    /// last-known endpoint and a handle is returned. On failure the connection
    /// is evicted and `ConnectFailed` is returned.
    ///
    /// Dropping the returned future while the attempt is pending evicts the
    /// connection as well.
    ///
    /// 建立到 `host:port` 的新连接。连接以 `Idle` 状态插入，
    /// 在连接尝试完成之前即可见。成功时持久化该端点并返回句柄；
    /// 失败时驱逐该连接并返回 `ConnectFailed`。
    pub async fn add_connection(&self, host: impl Into<String>, port: u16) -> Result<Handle<C>> {
        let endpoint = Endpoint::new(host, port);
        self.validator.validate(&endpoint)?;

        let connection = self.insert(endpoint)?;
        let mut guard = PendingGuard {
            registry: self,
            connection: &connection,
            armed: true,
        };
        let outcome = self.run_connect(&connection).await;
        guard.armed = false;

        let cause = match outcome {
            Ok(()) => {
                if self.executor.execute_transition_from(
                    &connection,
                    ConnectionState::Connecting,
                    ConnectionState::Connected,
                ) {
                    info!(id = %connection.id(), endpoint = %connection.endpoint(), "Connection established");
                    self.persist(connection.endpoint()).await;
                    return Ok(ConnectionHandle::new(&connection));
                }
                // Removed between the transport resolving and now.
                connection.transport().disconnect().await;
                TransportError::Cancelled
            }
            Err(cause) => cause,
        };

        self.evict(&connection);
        warn!(
            id = %connection.id(),
            endpoint = %connection.endpoint(),
            error = %cause,
            "Connection failed, evicted"
        );
        Err(Error::ConnectFailed(cause))
    }

    /// Removes a connection. Absent or stale handles are ignored.
    ///
    /// If the connection was current, the current selection reads `None`
    /// afterwards. A connected transport is disconnected; a pending connect
    /// attempt is cancelled.
    ///
    /// 移除连接。不存在或过期的句柄会被忽略。
    pub async fn remove_connection(&self, handle: &Handle<C>) {
        let Some((_, connection)) = self
            .connections
            .remove_if(&handle.id(), |_, entry| handle.refers_to(entry))
        else {
            debug!(id = %handle.id(), "Connection not present, nothing to remove");
            return;
        };

        let previous = self.close(&connection);
        self.executor
            .trigger_event(LifecycleEvent::ConnectionRemoved { id: connection.id() });
        info!(id = %connection.id(), endpoint = %connection.endpoint(), "Connection removed");

        if previous.is_some_and(StateValidator::needs_disconnect) {
            connection.transport().disconnect().await;
        }
    }

    /// Handles a disconnect reported from outside the registry, e.g. the
    /// server dropping the link. The connection is closed and removed without
    /// calling back into its transport.
    ///
    /// Returns `false` if no such connection is present.
    ///
    /// 处理来自注册表外部的断开通知（例如服务器断开链路）。
    /// 连接被关闭并移除，不会回调其传输。
    pub fn handle_disconnect(&self, id: ConnectionId) -> bool {
        let Some((_, connection)) = self.connections.remove(&id) else {
            debug!(id = %id, "Disconnect for unknown connection ignored");
            return false;
        };

        self.close(&connection);
        self.executor
            .trigger_event(LifecycleEvent::ConnectionRemoved { id });
        info!(id = %id, endpoint = %connection.endpoint(), "Connection closed by remote");
        true
    }

    /// Removes every connection.
    /// 移除所有连接。
    pub async fn close_all(&self) {
        for handle in self.connections() {
            self.remove_connection(&handle).await;
        }
    }

    /// The current connection, or `None` if it was cleared, never set, or removed.
    /// 当前连接；若已清除、从未设置或已被移除则为 `None`。
    pub fn current_connection(&self) -> Option<Handle<C>> {
        let id = (*self.current.borrow())?;
        self.get(id)
    }

    /// Selects the current connection.
    ///
    /// `None` always clears the selection. A handle that is not a member of
    /// this registry leaves the selection unchanged. Returns whether the
    /// request was applied.
    ///
    /// 选择当前连接。`None` 总是清除选择；不属于本注册表的句柄不会改变当前选择。
    pub fn set_current_connection(&self, handle: Option<&Handle<C>>) -> bool {
        let Some(handle) = handle else {
            if self.current.send_if_modified(|current| current.take().is_some()) {
                debug!("Current connection cleared");
                self.executor
                    .trigger_event(LifecycleEvent::CurrentChanged { id: None });
            }
            return true;
        };

        // Hold the entry so a concurrent removal cannot interleave with the update.
        let Some(entry) = self.connections.get(&handle.id()) else {
            debug!(id = %handle.id(), "Ignoring stale handle for current connection");
            return false;
        };
        if !handle.refers_to(entry.value()) || !StateValidator::is_selectable(entry.state()) {
            debug!(id = %handle.id(), "Ignoring foreign handle for current connection");
            return false;
        }

        let id = handle.id();
        let changed = self.current.send_if_modified(|current| {
            if *current == Some(id) {
                return false;
            }
            *current = Some(id);
            true
        });
        drop(entry);

        if changed {
            debug!(id = %id, "Current connection selected");
            self.executor
                .trigger_event(LifecycleEvent::CurrentChanged { id: Some(id) });
        }
        true
    }

    /// Watches the identifier of the current connection.
    /// 监听当前连接的标识符。
    pub fn subscribe_current(&self) -> watch::Receiver<Option<ConnectionId>> {
        self.current.subscribe()
    }

    /// The endpoint of the most recent successful connection, if any was ever recorded.
    ///
    /// A store that cannot be read is reported as `None`.
    ///
    /// 最近一次成功连接的端点。无法读取存储时视为 `None`。
    pub fn last_known_endpoint(&self) -> Option<Endpoint> {
        match self.store.load(&self.config.persistence.key) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!(error = %e, "Failed to read last known endpoint");
                None
            }
        }
    }

    pub fn get(&self, id: ConnectionId) -> Option<Handle<C>> {
        self.connections
            .get(&id)
            .map(|entry| ConnectionHandle::new(entry.value()))
    }

    /// Every live connection, in creation order.
    /// 按创建顺序返回所有活跃连接。
    pub fn connections(&self) -> Vec<Handle<C>> {
        let mut handles: Vec<_> = self
            .connections
            .iter()
            .map(|entry| ConnectionHandle::new(entry.value()))
            .collect();
        handles.sort_by_key(|handle| handle.id());
        handles
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// 原子地分配标识符并插入新连接
    /// Atomically allocate an identifier and insert a new connection
    fn insert(&self, endpoint: Endpoint) -> Result<Entry<C>> {
        let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);

        let limit = self.config.registry.max_connections;
        if limit > 0 && self.connections.len() >= limit {
            warn!(limit, %endpoint, "Registry full, connection refused");
            return Err(Error::RegistryFull { limit });
        }

        let id = ConnectionId(*next_id);
        *next_id += 1;

        let transport = self
            .connector
            .build(id, &endpoint, &self.config.connection);
        let connection = Arc::new(Connection::new(id, endpoint, transport));
        self.connections.insert(id, connection.clone());
        drop(next_id);

        debug!(id = %id, endpoint = %connection.endpoint(), "Connection registered");
        self.executor.trigger_event(LifecycleEvent::ConnectionAdded {
            id,
            endpoint: connection.endpoint().clone(),
        });
        Ok(connection)
    }

    async fn run_connect(
        &self,
        connection: &Connection<C::Transport>,
    ) -> std::result::Result<(), TransportError> {
        if !self.executor.execute_transition_from(
            connection,
            ConnectionState::Idle,
            ConnectionState::Connecting,
        ) {
            return Err(TransportError::Cancelled);
        }

        let attempt = async {
            match self.config.registry.connect_timeout {
                Some(limit) => tokio::time::timeout(limit, connection.transport().connect())
                    .await
                    .unwrap_or(Err(TransportError::TimedOut(limit))),
                None => connection.transport().connect().await,
            }
        };

        // The attempt is polled first so a connect that completes together with a
        // removal still reaches the disconnect in `add_connection`.
        tokio::select! {
            biased;
            result = attempt => result,
            _ = connection.wait_closed() => Err(TransportError::Cancelled),
        }
    }

    /// 驱逐连接失败的连接
    /// Evict a connection whose connect attempt did not succeed
    fn evict(&self, connection: &Entry<C>) {
        self.executor.execute_transition_from(
            connection,
            ConnectionState::Connecting,
            ConnectionState::Failed,
        );
        let removed = self
            .connections
            .remove_if(&connection.id(), |_, entry| Arc::ptr_eq(entry, connection))
            .is_some();
        self.clear_current_if(connection.id());
        if removed {
            self.executor
                .trigger_event(LifecycleEvent::ConnectionEvicted { id: connection.id() });
        }
    }

    /// Closes an already unlinked connection and returns its previous state.
    fn close(&self, connection: &Entry<C>) -> Option<ConnectionState> {
        let previous = self
            .executor
            .execute_transition(connection, ConnectionState::Closed);
        self.clear_current_if(connection.id());
        previous
    }

    fn clear_current_if(&self, id: ConnectionId) {
        let cleared = self.current.send_if_modified(|current| {
            if *current == Some(id) {
                *current = None;
                return true;
            }
            false
        });
        if cleared {
            debug!(id = %id, "Current connection went away");
            self.executor
                .trigger_event(LifecycleEvent::CurrentChanged { id: None });
        }
    }

    /// Stores are synchronous and may touch the disk, so the write runs on the
    /// blocking pool.
    async fn persist(&self, endpoint: &Endpoint) {
        let store = self.store.clone();
        let key = self.config.persistence.key.clone();
        let record = endpoint.clone();
        match tokio::task::spawn_blocking(move || store.save(&key, &record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%endpoint, error = %e, "Failed to persist last known endpoint"),
            Err(e) => warn!(%endpoint, error = %e, "Endpoint persistence task failed"),
        }
    }
}

/// Evicts a connection whose `add_connection` future was dropped mid-attempt.
struct PendingGuard<'a, C: Connector> {
    registry: &'a ConnectionRegistry<C>,
    connection: &'a Entry<C>,
    armed: bool,
}

impl<C: Connector> Drop for PendingGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!(id = %self.connection.id(), "Connect attempt abandoned");
        self.registry.executor.execute_transition_from(
            self.connection,
            ConnectionState::Connecting,
            ConnectionState::Closed,
        );
        self.registry.evict(self.connection);
    }
}

#[cfg(test)]
mod tests;
