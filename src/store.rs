//! Durable storage for the last-known-endpoint record.
//! 最近端点记录的持久化存储。

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::{endpoint::Endpoint, error::Result};

/// A key-value store holding endpoint records.
///
/// The registry writes one fixed key after every successful connect and reads
/// it on demand.
///
/// 保存端点记录的键值存储。注册表在每次成功连接后写入一个固定键，并按需读取。
pub trait EndpointStore: Send + Sync + 'static {
    fn load(&self, key: &str) -> Result<Option<Endpoint>>;

    /// Replaces the record under `key`.
    /// 替换 `key` 下的记录。
    fn save(&self, key: &str, endpoint: &Endpoint) -> Result<()>;
}
