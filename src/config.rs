//! 定义了连接管理器的可配置参数。
//! Defines configurable parameters for the connection manager.

use std::time::Duration;

/// The storage key under which the last successful endpoint is persisted.
/// 最近一次成功连接的端点所使用的存储键。
pub const DEFAULT_LAST_ENDPOINT_KEY: &str = "lastUserConnection";

/// The application name announced to servers by default.
/// 默认向服务器声明的应用名称。
pub const DEFAULT_APPLICATION_NAME: &str = "MetaCom";

/// A structure containing all configurable parameters for the connection manager.
///
/// 包含连接管理器所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Registry-wide behaviour.
    /// 注册表范围的行为。
    pub registry: RegistryConfig,

    /// Parameters handed to the connector for every new connection.
    /// 每个新连接都会传递给连接器的参数。
    pub connection: ConnectionConfig,

    /// Host/port validation rules used by the default validator.
    /// 默认验证器使用的主机/端口验证规则。
    pub validation: ValidationConfig,

    /// Last-known-endpoint persistence.
    /// 最近端点的持久化参数。
    pub persistence: PersistenceConfig,
}

/// Registry-wide behaviour.
///
/// 注册表范围的行为。
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// The maximum time a connect attempt may stay in `Connecting`.
    /// `None` waits for the transport to resolve on its own.
    ///
    /// 连接尝试在 `Connecting` 状态下可停留的最长时间。
    /// `None` 表示等待传输自行完成。
    pub connect_timeout: Option<Duration>,
    /// The maximum number of live connections. `0` means unlimited.
    /// 最大活跃连接数。`0` 表示不限制。
    pub max_connections: usize,
}

/// Per-connection parameters.
///
/// 每个连接的参数。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Whether the transport should use a secure channel. Passed to the
    /// connector; the bundled TCP transport only records it.
    /// 传输是否应使用安全通道。
    pub secure: bool,
    /// The application name announced to the server.
    /// 向服务器声明的应用名称。
    pub application_name: String,
    /// Disable Nagle's algorithm on stream transports.
    /// 在流式传输上禁用Nagle算法。
    pub nodelay: bool,
}

/// Host/port validation rules.
///
/// 主机/端口验证规则。
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// The lowest accepted port.
    pub min_port: u16,
    /// The highest accepted port.
    pub max_port: u16,
    /// The longest accepted host name, in bytes.
    pub max_host_len: usize,
}

/// Last-known-endpoint persistence.
///
/// 最近端点的持久化参数。
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// The fixed key the endpoint record is stored under.
    /// 端点记录所使用的固定键。
    pub key: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            max_connections: 0,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            secure: true,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            nodelay: true,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_port: 1,
            max_port: u16::MAX,
            max_host_len: 253, // DNS name limit
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_LAST_ENDPOINT_KEY.to_string(),
        }
    }
}
