//! Host/port pairs that connections are bound to, and their validation.
//! 连接所绑定的主机/端口对及其验证。

mod validator;

pub use validator::{DefaultValidator, EndpointValidator};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chat server address.
///
/// Serialized as `{"host": ..., "port": ...}`, which is also the shape of the
/// persisted last-known-endpoint record.
///
/// 聊天服务器地址。序列化为 `{"host": ..., "port": ...}`，
/// 这也是持久化的最近端点记录的格式。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Builds an endpoint from raw form input.
    ///
    /// Both fields are trimmed; an empty host or an empty/non-numeric port is
    /// rejected with `InvalidEndpoint`.
    ///
    /// 从原始表单输入构建端点。两个字段都会去除首尾空白；
    /// 空主机或空/非数字端口会以 `InvalidEndpoint` 拒绝。
    pub fn from_input(host: &str, port: &str) -> Result<Self> {
        let host = host.trim();
        let port_text = port.trim();

        let invalid = |reason: &str| Error::InvalidEndpoint {
            endpoint: Endpoint::new(host, 0),
            reason: reason.to_string(),
        };

        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        if port_text.is_empty() {
            return Err(invalid("port is empty"));
        }
        let port = port_text
            .parse::<u16>()
            .map_err(|e| invalid(&format!("port `{port_text}` is not valid: {e}")))?;

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
