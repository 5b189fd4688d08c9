//! 测试辅助工具模块
//! Test utilities module

#![cfg(test)]

use crate::{
    config::ConnectionConfig,
    connection::ConnectionId,
    endpoint::Endpoint,
    error::TransportError,
    transport::{Connector, Transport},
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use tokio::sync::oneshot;

/// How a mock transport resolves its connect attempt.
#[derive(Debug, Default)]
struct Script {
    /// Hosts that fail immediately.
    failing_hosts: HashSet<String>,
    /// When set, every connect waits for `MockConnector::release`.
    gated: bool,
    /// Pending gated attempts by connection id.
    pending: HashMap<ConnectionId, oneshot::Sender<Result<(), TransportError>>>,
    /// Connection ids whose transport was disconnected, in call order.
    disconnected: Vec<ConnectionId>,
    /// Every connection id a transport was built for.
    built: Vec<ConnectionId>,
}

/// A connector whose transports succeed, fail, or wait as scripted.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    script: Arc<Mutex<Script>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every connect waits until released by the test.
    pub fn gated() -> Self {
        let connector = Self::default();
        connector.script.lock().unwrap().gated = true;
        connector
    }

    pub fn fail_host(&self, host: &str) {
        self.script.lock().unwrap().failing_hosts.insert(host.to_string());
    }

    pub fn is_pending(&self, id: ConnectionId) -> bool {
        self.script.lock().unwrap().pending.contains_key(&id)
    }

    /// Yields until the transport for `id` is waiting on its gate.
    pub async fn wait_pending(&self, id: ConnectionId) {
        for _ in 0..1000 {
            if self.is_pending(id) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("connection {id} never started connecting");
    }

    /// Resolves a gated connect attempt.
    pub fn release(&self, id: ConnectionId, outcome: Result<(), TransportError>) {
        let sender = self
            .script
            .lock()
            .unwrap()
            .pending
            .remove(&id)
            .unwrap_or_else(|| panic!("connection {id} is not pending"));
        let _ = sender.send(outcome);
    }

    pub fn disconnected(&self) -> Vec<ConnectionId> {
        self.script.lock().unwrap().disconnected.clone()
    }

    pub fn built(&self) -> Vec<ConnectionId> {
        self.script.lock().unwrap().built.clone()
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn build(&self, id: ConnectionId, endpoint: &Endpoint, _config: &ConnectionConfig) -> MockTransport {
        self.script.lock().unwrap().built.push(id);
        MockTransport {
            id,
            endpoint: endpoint.clone(),
            script: self.script.clone(),
        }
    }
}

#[derive(Debug)]
pub struct MockTransport {
    id: ConnectionId,
    endpoint: Endpoint,
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let gate = {
            let mut script = self.script.lock().unwrap();
            if script.failing_hosts.contains(&self.endpoint.host) {
                return Err(TransportError::Rejected(format!(
                    "{} refused the connection",
                    self.endpoint
                )));
            }
            if !script.gated {
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            script.pending.insert(self.id, tx);
            rx
        };
        gate.await.unwrap_or(Err(TransportError::Cancelled))
    }

    async fn disconnect(&self) {
        self.script.lock().unwrap().disconnected.push(self.id);
    }
}
