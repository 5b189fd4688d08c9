//! 端点验证逻辑模块
//! Endpoint validation logic

use super::Endpoint;
use crate::{
    config::ValidationConfig,
    error::{Error, Result},
};

/// Decides whether a host/port pair may be connected to.
///
/// The registry runs the validator before allocating an identifier, so a
/// rejected endpoint never touches registry state.
///
/// 判断主机/端口对是否可以连接。注册表在分配标识符之前运行验证器，
/// 因此被拒绝的端点永远不会影响注册表状态。
pub trait EndpointValidator: Send + Sync + 'static {
    fn validate(&self, endpoint: &Endpoint) -> Result<()>;
}

/// The validator used when none is supplied, driven by `ValidationConfig`.
/// 未提供验证器时使用的默认验证器，由 `ValidationConfig` 驱动。
#[derive(Debug, Clone, Default)]
pub struct DefaultValidator {
    config: ValidationConfig,
}

impl DefaultValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }
}

impl EndpointValidator for DefaultValidator {
    fn validate(&self, endpoint: &Endpoint) -> Result<()> {
        let reject = |reason: String| {
            Err(Error::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason,
            })
        };

        let host = endpoint.host.as_str();
        if host.is_empty() {
            return reject("host is empty".to_string());
        }
        if host.len() > self.config.max_host_len {
            return reject(format!(
                "host is longer than {} bytes",
                self.config.max_host_len
            ));
        }
        if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return reject("host contains whitespace or control characters".to_string());
        }
        if endpoint.port < self.config.min_port || endpoint.port > self.config.max_port {
            return reject(format!(
                "port must be within {}..={}",
                self.config.min_port, self.config.max_port
            ));
        }

        Ok(())
    }
}
