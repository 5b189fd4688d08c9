//! tests/common/harness.rs
use async_trait::async_trait;
use metacom_session::{
    config::ConnectionConfig,
    connection::ConnectionId,
    endpoint::Endpoint,
    error::TransportError,
    transport::{Connector, Transport},
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, Once},
};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "metacom_session=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A connector whose transports resolve immediately: hosts registered with
/// `fail_host` are rejected, every other host connects.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    failing_hosts: Arc<Mutex<HashSet<String>>>,
    disconnects: Arc<Mutex<Vec<ConnectionId>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    pub fn fail_host(&self, host: &str) {
        self.failing_hosts.lock().unwrap().insert(host.to_string());
    }

    pub fn disconnects(&self) -> Vec<ConnectionId> {
        self.disconnects.lock().unwrap().clone()
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn build(&self, id: ConnectionId, endpoint: &Endpoint, _config: &ConnectionConfig) -> ScriptedTransport {
        ScriptedTransport {
            id,
            fail: self.failing_hosts.lock().unwrap().contains(&endpoint.host),
            disconnects: self.disconnects.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ScriptedTransport {
    id: ConnectionId,
    fail: bool,
    disconnects: Arc<Mutex<Vec<ConnectionId>>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        tokio::task::yield_now().await;
        if self.fail {
            return Err(TransportError::Rejected("simulated transport error".to_string()));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnects.lock().unwrap().push(self.id);
    }
}
