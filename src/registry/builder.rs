//! Builder for `ConnectionRegistry`.

use super::ConnectionRegistry;
use crate::{
    config::Config,
    connection::lifecycle::{EventListener, LifecycleEvent, StateTransitionExecutor},
    endpoint::{DefaultValidator, EndpointValidator},
    store::{EndpointStore, MemoryStore},
    transport::Connector,
};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Configures a [`ConnectionRegistry`] before it is created.
///
/// Unset parts default to `Config::default()`, a [`MemoryStore`], and a
/// [`DefaultValidator`] built from the validation section of the config.
///
/// 在创建 [`ConnectionRegistry`] 之前对其进行配置。
pub struct RegistryBuilder<C: Connector> {
    connector: C,
    config: Config,
    store: Option<Arc<dyn EndpointStore>>,
    validator: Option<Box<dyn EndpointValidator>>,
    event_listeners: Vec<EventListener>,
}

impl<C: Connector> RegistryBuilder<C> {
    pub(crate) fn new(connector: C) -> Self {
        Self {
            connector,
            config: Config::default(),
            store: None,
            validator: None,
            event_listeners: Vec::new(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Where the last-known endpoint is persisted.
    /// 最近端点的持久化位置。
    pub fn store(mut self, store: impl EndpointStore) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn validator(mut self, validator: impl EndpointValidator) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// 注册事件监听器
    /// Register event listener
    pub fn event_listener(
        mut self,
        listener: impl Fn(&LifecycleEvent) + Send + Sync + 'static,
    ) -> Self {
        self.event_listeners.push(Box::new(listener));
        self
    }

    pub fn build(self) -> ConnectionRegistry<C> {
        let validator = self.validator.unwrap_or_else(|| {
            Box::new(DefaultValidator::new(self.config.validation.clone()))
        });
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let (current, _) = watch::channel(None);

        ConnectionRegistry {
            connector: self.connector,
            config: self.config,
            connections: DashMap::new(),
            next_id: Mutex::new(0),
            current,
            store,
            validator,
            executor: StateTransitionExecutor::new(self.event_listeners),
        }
    }
}
