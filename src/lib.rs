#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The user connection manager of the chat client.
//! 聊天客户端的用户连接管理器。
//!
//! A [`ConnectionRegistry`] owns every live connection to a chat server,
//! tracks which one is current, and remembers the last endpoint that was
//! connected successfully. A [`Session`] applies the active-connection policy
//! on top of it.

pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod session;
pub mod store;
pub mod transport;

mod testing;

pub use config::Config;
pub use connection::{ConnectionHandle, ConnectionId, ConnectionState};
pub use endpoint::Endpoint;
pub use error::{Error, Result, TransportError};
pub use registry::ConnectionRegistry;
pub use session::Session;
