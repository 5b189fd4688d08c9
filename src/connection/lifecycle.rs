//! 连接生命周期管理模块
//! Connection Lifecycle Management Module
//!
//! 该模块负责连接状态的验证与转换，并将生命周期事件分发给已注册的监听器。
//!
//! This module validates and applies connection state transitions and
//! dispatches lifecycle events to registered listeners.

mod transitions;
mod validation;

pub use transitions::{EventListener, LifecycleEvent, StateTransitionExecutor};
pub use validation::StateValidator;
