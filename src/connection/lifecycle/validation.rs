//! 连接状态验证逻辑模块
//! Connection State Validation Logic Module

use crate::connection::ConnectionState;

/// 状态验证器，负责所有状态相关的验证和检查逻辑
/// State validator responsible for all state-related validation and check logic
pub struct StateValidator;

impl StateValidator {
    /// 验证状态转换是否合法
    /// Validate if state transition is legal
    pub fn is_valid_transition(current_state: ConnectionState, new_state: ConnectionState) -> bool {
        use ConnectionState::*;

        match (current_state, new_state) {
            (Idle, Connecting) => true,
            // 在发起连接前被移除
            // Removed before the connect was issued
            (Idle, Closed) => true,

            (Connecting, Connected) => true,
            (Connecting, Failed) => true,
            // 连接过程中被移除
            // Removed while the connect was in flight
            (Connecting, Closed) => true,

            (Connected, Closed) => true,

            // 其他转换都是无效的，包括离开终止状态
            // All other transitions are invalid, including leaving a terminal state
            _ => false,
        }
    }

    /// 检查连接是否可以被设为当前连接
    /// Check if the connection may be selected as current
    pub fn is_selectable(state: ConnectionState) -> bool {
        !state.is_terminal()
    }

    /// 检查移除时是否需要断开传输
    /// Check if the transport must be disconnected on removal
    pub fn needs_disconnect(state: ConnectionState) -> bool {
        matches!(state, ConnectionState::Connected)
    }
}
