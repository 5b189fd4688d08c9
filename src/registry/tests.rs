//! Unit tests for the connection registry.
//! 连接注册表的单元测试。

use super::*;
use crate::{
    config::{Config, RegistryConfig},
    endpoint::Endpoint,
    store::MemoryStore,
    testing::MockConnector,
};
use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

fn registry(connector: &MockConnector) -> Arc<ConnectionRegistry<MockConnector>> {
    Arc::new(ConnectionRegistry::new(connector.clone()))
}

/// An endpoint store whose writes always fail.
struct BrokenStore;

impl EndpointStore for BrokenStore {
    fn load(&self, _key: &str) -> Result<Option<Endpoint>> {
        Err(Error::Io(std::io::Error::other("disk unplugged")))
    }

    fn save(&self, _key: &str, _endpoint: &Endpoint) -> Result<()> {
        Err(Error::Io(std::io::Error::other("disk unplugged")))
    }
}

#[tokio::test]
async fn test_first_connection_gets_id_zero_and_is_persisted() {
    let connector = MockConnector::new();
    let registry = registry(&connector);

    let handle = registry.add_connection("a.com", 3000).await.unwrap();

    assert_eq!(handle.id(), ConnectionId(0));
    assert_eq!(handle.state(), ConnectionState::Connected);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.last_known_endpoint(), Some(Endpoint::new("a.com", 3000)));
}

#[tokio::test]
async fn test_ids_increase_and_connections_coexist() {
    let connector = MockConnector::new();
    let registry = registry(&connector);

    let a = registry.add_connection("a.com", 3000).await.unwrap();
    let b = registry.add_connection("b.com", 4000).await.unwrap();
    let c = registry.add_connection("c.com", 5000).await.unwrap();

    assert_eq!([a.id(), b.id(), c.id()], [ConnectionId(0), ConnectionId(1), ConnectionId(2)]);
    assert_eq!(registry.connections(), vec![a, b, c]);
    assert_eq!(registry.last_known_endpoint(), Some(Endpoint::new("c.com", 5000)));
}

#[tokio::test]
async fn test_failed_connection_is_evicted() {
    let connector = MockConnector::new();
    connector.fail_host("x.com");
    let registry = registry(&connector);
    registry.add_connection("a.com", 3000).await.unwrap();

    let result = registry.add_connection("x.com", 1).await;

    assert!(matches!(
        result,
        Err(Error::ConnectFailed(TransportError::Rejected(_)))
    ));
    assert_eq!(registry.len(), 1);
    assert!(registry.get(ConnectionId(1)).is_none());
    assert_eq!(registry.last_known_endpoint(), Some(Endpoint::new("a.com", 3000)));
}

#[tokio::test]
async fn test_ids_are_never_reused() {
    let connector = MockConnector::new();
    connector.fail_host("x.com");
    let registry = registry(&connector);

    let a = registry.add_connection("a.com", 3000).await.unwrap();
    assert!(registry.add_connection("x.com", 1).await.is_err());
    let b = registry.add_connection("b.com", 4000).await.unwrap();
    registry.remove_connection(&b).await;
    let c = registry.add_connection("c.com", 5000).await.unwrap();

    assert_eq!(a.id(), ConnectionId(0));
    assert_eq!(b.id(), ConnectionId(2));
    assert_eq!(c.id(), ConnectionId(3));
    assert_eq!(connector.built(), vec![ConnectionId(0), ConnectionId(1), ConnectionId(2), ConnectionId(3)]);
}

#[tokio::test]
async fn test_invalid_endpoint_touches_nothing() {
    let connector = MockConnector::new();
    let registry = registry(&connector);

    assert!(matches!(
        registry.add_connection("", 3000).await,
        Err(Error::InvalidEndpoint { .. })
    ));
    assert!(matches!(
        registry.add_connection("a.com", 0).await,
        Err(Error::InvalidEndpoint { .. })
    ));
    assert!(registry.is_empty());
    assert!(connector.built().is_empty());

    let handle = registry.add_connection("a.com", 3000).await.unwrap();
    assert_eq!(handle.id(), ConnectionId(0));
}

#[tokio::test]
async fn test_pending_connection_is_visible_before_resolution() {
    let connector = MockConnector::gated();
    let registry = registry(&connector);

    let task = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.add_connection("a.com", 3000).await })
    };
    connector.wait_pending(ConnectionId(0)).await;

    let pending = registry.get(ConnectionId(0)).unwrap();
    assert_eq!(pending.state(), ConnectionState::Connecting);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.last_known_endpoint(), None);

    connector.release(ConnectionId(0), Ok(()));
    let handle = task.await.unwrap().unwrap();

    assert_eq!(handle, pending);
    assert_eq!(pending.state(), ConnectionState::Connected);
    assert_eq!(registry.last_known_endpoint(), Some(Endpoint::new("a.com", 3000)));
}

#[tokio::test]
async fn test_removing_pending_connection_cancels_attempt() {
    let connector = MockConnector::gated();
    let registry = registry(&connector);

    let task = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.add_connection("a.com", 3000).await })
    };
    connector.wait_pending(ConnectionId(0)).await;

    let pending = registry.get(ConnectionId(0)).unwrap();
    registry.remove_connection(&pending).await;

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(Error::ConnectFailed(TransportError::Cancelled))
    ));
    assert!(registry.is_empty());
    assert!(connector.disconnected().is_empty());
    assert_eq!(registry.last_known_endpoint(), None);
}

#[tokio::test]
async fn test_connect_completing_with_removal_is_disconnected() {
    let connector = MockConnector::gated();
    let registry = registry(&connector);

    let task = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.add_connection("a.com", 3000).await })
    };
    connector.wait_pending(ConnectionId(0)).await;

    // Both the transport result and the removal are ready before the attempt is polled again.
    connector.release(ConnectionId(0), Ok(()));
    let pending = registry.get(ConnectionId(0)).unwrap();
    registry.remove_connection(&pending).await;

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(Error::ConnectFailed(TransportError::Cancelled))
    ));
    assert!(registry.is_empty());
    assert_eq!(connector.disconnected(), vec![ConnectionId(0)]);
    assert_eq!(registry.last_known_endpoint(), None);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_attempt_is_evicted() {
    let connector = MockConnector::gated();
    let registry = registry(&connector);

    let attempt = tokio::time::timeout(
        Duration::from_millis(10),
        registry.add_connection("a.com", 3000),
    )
    .await;

    assert!(attempt.is_err());
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_fails_the_attempt() {
    let connector = MockConnector::gated();
    let config = Config {
        registry: RegistryConfig {
            connect_timeout: Some(Duration::from_secs(5)),
            ..RegistryConfig::default()
        },
        ..Config::default()
    };
    let registry = ConnectionRegistry::builder(connector.clone())
        .config(config)
        .build();

    let result = registry.add_connection("a.com", 3000).await;

    match result {
        Err(Error::ConnectFailed(TransportError::TimedOut(limit))) => {
            assert_eq!(limit, Duration::from_secs(5));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_remove_disconnects_once_and_is_idempotent() {
    let connector = MockConnector::new();
    let registry = registry(&connector);
    let handle = registry.add_connection("a.com", 3000).await.unwrap();

    registry.remove_connection(&handle).await;
    registry.remove_connection(&handle).await;

    assert!(registry.is_empty());
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert_eq!(connector.disconnected(), vec![ConnectionId(0)]);
}

#[tokio::test]
async fn test_removing_current_clears_it() {
    let connector = MockConnector::new();
    let registry = registry(&connector);
    let handle = registry.add_connection("a.com", 3000).await.unwrap();
    let mut current_rx = registry.subscribe_current();

    assert!(registry.set_current_connection(Some(&handle)));
    assert_eq!(registry.current_connection(), Some(handle.clone()));
    assert_eq!(*current_rx.borrow_and_update(), Some(ConnectionId(0)));

    registry.remove_connection(&handle).await;

    assert_eq!(registry.current_connection(), None);
    assert!(current_rx.has_changed().unwrap());
    assert_eq!(*current_rx.borrow_and_update(), None);
}

#[tokio::test]
async fn test_removing_other_connection_keeps_current() {
    let connector = MockConnector::new();
    let registry = registry(&connector);
    let a = registry.add_connection("a.com", 3000).await.unwrap();
    let b = registry.add_connection("b.com", 4000).await.unwrap();

    registry.set_current_connection(Some(&a));
    registry.remove_connection(&b).await;

    assert_eq!(registry.current_connection(), Some(a));
}

#[tokio::test]
async fn test_stale_handle_does_not_replace_current() {
    let connector = MockConnector::new();
    let registry = registry(&connector);
    let a = registry.add_connection("a.com", 3000).await.unwrap();
    let b = registry.add_connection("b.com", 4000).await.unwrap();

    registry.set_current_connection(Some(&b));
    registry.remove_connection(&a).await;

    assert!(!registry.set_current_connection(Some(&a)));
    assert_eq!(registry.current_connection(), Some(b));
}

#[tokio::test]
async fn test_foreign_handle_with_same_id_is_ignored() {
    let connector = MockConnector::new();
    let registry = registry(&connector);
    let other = ConnectionRegistry::new(MockConnector::new());

    let _zero = registry.add_connection("a.com", 3000).await.unwrap();
    let one = registry.add_connection("b.com", 4000).await.unwrap();
    let _foreign_zero = other.add_connection("z.com", 9000).await.unwrap();
    let foreign_one = other.add_connection("z.com", 9001).await.unwrap();
    assert_eq!(foreign_one.id(), one.id());

    registry.set_current_connection(Some(&one));
    assert!(!registry.set_current_connection(Some(&foreign_one)));
    assert_eq!(registry.current_connection(), Some(one.clone()));

    registry.remove_connection(&foreign_one).await;
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.current_connection(), Some(one));
}

#[tokio::test]
async fn test_setting_none_always_clears() {
    let connector = MockConnector::new();
    let registry = registry(&connector);

    assert!(registry.set_current_connection(None));
    assert_eq!(registry.current_connection(), None);

    let handle = registry.add_connection("a.com", 3000).await.unwrap();
    registry.set_current_connection(Some(&handle));
    assert!(registry.set_current_connection(None));
    assert_eq!(registry.current_connection(), None);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_external_disconnect_closes_without_transport_call() {
    let connector = MockConnector::new();
    let registry = registry(&connector);
    let handle = registry.add_connection("a.com", 3000).await.unwrap();
    registry.set_current_connection(Some(&handle));

    assert!(registry.handle_disconnect(handle.id()));
    assert!(!registry.handle_disconnect(handle.id()));

    assert_eq!(handle.state(), ConnectionState::Closed);
    assert_eq!(registry.current_connection(), None);
    assert!(registry.is_empty());
    assert!(connector.disconnected().is_empty());
}

#[tokio::test]
async fn test_close_all() {
    let connector = MockConnector::new();
    let registry = registry(&connector);
    let a = registry.add_connection("a.com", 3000).await.unwrap();
    registry.add_connection("b.com", 4000).await.unwrap();
    registry.set_current_connection(Some(&a));

    registry.close_all().await;

    assert!(registry.is_empty());
    assert_eq!(registry.current_connection(), None);
    assert_eq!(connector.disconnected(), vec![ConnectionId(0), ConnectionId(1)]);
}

#[tokio::test]
async fn test_registry_full() {
    let connector = MockConnector::new();
    let config = Config {
        registry: RegistryConfig {
            max_connections: 1,
            ..RegistryConfig::default()
        },
        ..Config::default()
    };
    let registry = ConnectionRegistry::builder(connector.clone())
        .config(config)
        .build();

    let a = registry.add_connection("a.com", 3000).await.unwrap();
    assert!(matches!(
        registry.add_connection("b.com", 4000).await,
        Err(Error::RegistryFull { limit: 1 })
    ));

    registry.remove_connection(&a).await;
    let b = registry.add_connection("b.com", 4000).await.unwrap();
    assert_eq!(b.id(), ConnectionId(1));
}

#[tokio::test]
async fn test_persistence_failure_does_not_fail_connect() {
    let connector = MockConnector::new();
    let registry = ConnectionRegistry::builder(connector.clone())
        .store(BrokenStore)
        .build();

    let handle = registry.add_connection("a.com", 3000).await.unwrap();

    assert_eq!(handle.state(), ConnectionState::Connected);
    assert_eq!(registry.last_known_endpoint(), None);
}

#[tokio::test]
async fn test_persisted_record_is_overwritten() {
    let connector = MockConnector::new();
    let store = Arc::new(MemoryStore::new());
    let registry = ConnectionRegistry::builder(connector.clone())
        .store(SharedStore(store.clone()))
        .build();

    registry.add_connection("h2.com", 2000).await.unwrap();
    registry.add_connection("h.com", 1000).await.unwrap();

    assert_eq!(
        store.load("lastUserConnection").unwrap(),
        Some(Endpoint::new("h.com", 1000))
    );
}

/// Lets a test keep its own reference to the store handed to the registry.
struct SharedStore(Arc<MemoryStore>);

impl EndpointStore for SharedStore {
    fn load(&self, key: &str) -> Result<Option<Endpoint>> {
        self.0.load(key)
    }

    fn save(&self, key: &str, endpoint: &Endpoint) -> Result<()> {
        self.0.save(key, endpoint)
    }
}

#[tokio::test]
async fn test_lifecycle_events_are_reported_in_order() {
    let connector = MockConnector::new();
    connector.fail_host("x.com");
    let events = Arc::new(StdMutex::new(Vec::new()));
    let recorded = events.clone();
    let registry = ConnectionRegistry::builder(connector.clone())
        .event_listener(move |event| recorded.lock().unwrap().push(event.clone()))
        .build();

    let handle = registry.add_connection("a.com", 3000).await.unwrap();
    registry.set_current_connection(Some(&handle));
    let _ = registry.add_connection("x.com", 1).await;
    registry.remove_connection(&handle).await;

    let id0 = ConnectionId(0);
    let id1 = ConnectionId(1);
    use ConnectionState::*;
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            LifecycleEvent::ConnectionAdded { id: id0, endpoint: Endpoint::new("a.com", 3000) },
            LifecycleEvent::StateTransition { id: id0, from: Idle, to: Connecting },
            LifecycleEvent::StateTransition { id: id0, from: Connecting, to: Connected },
            LifecycleEvent::CurrentChanged { id: Some(id0) },
            LifecycleEvent::ConnectionAdded { id: id1, endpoint: Endpoint::new("x.com", 1) },
            LifecycleEvent::StateTransition { id: id1, from: Idle, to: Connecting },
            LifecycleEvent::StateTransition { id: id1, from: Connecting, to: Failed },
            LifecycleEvent::ConnectionEvicted { id: id1 },
            LifecycleEvent::StateTransition { id: id0, from: Connected, to: Closed },
            LifecycleEvent::CurrentChanged { id: None },
            LifecycleEvent::ConnectionRemoved { id: id0 },
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_get_unique_ids() {
    let connector = MockConnector::new();
    let registry = registry(&connector);

    let tasks: Vec<_> = (0..50u16)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.add_connection(format!("host{i}.com"), 1000 + i).await })
        })
        .collect();

    let mut ids = Vec::new();
    for task in futures::future::join_all(tasks).await {
        ids.push(task.unwrap().unwrap().id());
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 50);
    assert_eq!(ids.first(), Some(&ConnectionId(0)));
    assert_eq!(ids.last(), Some(&ConnectionId(49)));
    assert_eq!(registry.len(), 50);
}
