//! A process-local endpoint store.

use super::EndpointStore;
use crate::{endpoint::Endpoint, error::Result};
use dashmap::DashMap;

/// Keeps records in memory for the lifetime of the process.
/// 在进程生命周期内把记录保存在内存中。
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, Endpoint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EndpointStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Endpoint>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    fn save(&self, key: &str, endpoint: &Endpoint) -> Result<()> {
        self.records.insert(key.to_string(), endpoint.clone());
        Ok(())
    }
}
