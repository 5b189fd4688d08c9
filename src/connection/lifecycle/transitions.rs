//! 连接状态转换逻辑模块
//! Connection State Transition Logic Module
//!
//! 该模块负责执行经过验证的状态转换，并把生命周期事件分发给监听器。
//!
//! This module executes validated state transitions and dispatches lifecycle
//! events to listeners.

use super::validation::StateValidator;
use crate::{
    connection::{Connection, ConnectionId, ConnectionState},
    endpoint::Endpoint,
};
use tracing::{trace, warn};

/// 生命周期事件类型
/// Lifecycle event types
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// 连接已加入注册表
    /// Connection inserted into the registry
    ConnectionAdded { id: ConnectionId, endpoint: Endpoint },
    /// 状态转换事件
    /// State transition event
    StateTransition {
        id: ConnectionId,
        from: ConnectionState,
        to: ConnectionState,
    },
    /// 连接失败后被驱逐
    /// Connection evicted after a failed connect
    ConnectionEvicted { id: ConnectionId },
    /// 连接被移除（显式移除或外部断开）
    /// Connection removed (explicitly or by an external disconnect)
    ConnectionRemoved { id: ConnectionId },
    /// 当前连接发生变化
    /// Current connection changed
    CurrentChanged { id: Option<ConnectionId> },
}

/// 事件监听器类型定义
/// Event listener type definition
pub type EventListener = Box<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// 状态转换执行器，负责执行状态转换和相关的事件处理
/// State transition executor responsible for executing state transitions and related event handling
#[derive(Default)]
pub struct StateTransitionExecutor {
    event_listeners: Vec<EventListener>,
}

impl std::fmt::Debug for StateTransitionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTransitionExecutor")
            .field("event_listeners_count", &self.event_listeners.len())
            .finish()
    }
}

impl StateTransitionExecutor {
    pub fn new(event_listeners: Vec<EventListener>) -> Self {
        Self { event_listeners }
    }

    /// 执行状态转换
    /// Execute state transition
    ///
    /// Returns the previous state if the state changed. Same-state and illegal
    /// transitions leave the connection untouched and return `None`.
    pub fn execute_transition<T>(
        &self,
        connection: &Connection<T>,
        new_state: ConnectionState,
    ) -> Option<ConnectionState> {
        self.apply(connection, None, new_state)
    }

    /// 仅当连接仍处于 `expected` 状态时执行转换
    /// Execute the transition only if the connection is still in `expected`
    ///
    /// A connection that has already moved on is not an error here, so nothing
    /// is logged when the guard does not hold.
    pub fn execute_transition_from<T>(
        &self,
        connection: &Connection<T>,
        expected: ConnectionState,
        new_state: ConnectionState,
    ) -> bool {
        self.apply(connection, Some(expected), new_state).is_some()
    }

    fn apply<T>(
        &self,
        connection: &Connection<T>,
        expected: Option<ConnectionState>,
        new_state: ConnectionState,
    ) -> Option<ConnectionState> {
        let mut from = None;
        connection.state_cell().send_if_modified(|current| {
            if *current == new_state || expected.is_some_and(|expected| expected != *current) {
                return false;
            }
            if !StateValidator::is_valid_transition(*current, new_state) {
                warn!(
                    id = %connection.id(),
                    current_state = %current,
                    attempted_state = %new_state,
                    "Invalid state transition attempted"
                );
                return false;
            }
            from = Some(*current);
            *current = new_state;
            true
        });

        let from = from?;
        trace!(
            id = %connection.id(),
            from = %from,
            to = %new_state,
            "State transition executed"
        );
        self.trigger_event(LifecycleEvent::StateTransition {
            id: connection.id(),
            from,
            to: new_state,
        });
        Some(from)
    }

    /// 触发生命周期事件
    /// Trigger lifecycle event
    pub fn trigger_event(&self, event: LifecycleEvent) {
        for listener in &self.event_listeners {
            listener(&event);
        }
    }
}
