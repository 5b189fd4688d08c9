//! A JSON file backed endpoint store.
//! 基于JSON文件的端点存储。

use super::EndpointStore;
use crate::{
    endpoint::Endpoint,
    error::{Error, Result},
};
use serde_json::{Map, Value};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::{debug, warn};

/// Persists records as one JSON object, `{ "<key>": { "host": ..., "port": ... } }`.
///
/// Keys written by other parts of the application are preserved. Writes go to
/// a sibling temporary file that is then renamed over the original, so a crash
/// mid-write never leaves a truncated file behind. A file that no longer
/// parses is replaced on the next save rather than blocking it forever.
///
/// 以单个JSON对象持久化记录。应用其他部分写入的键会被保留。
/// 写入先落到同目录的临时文件，再重命名覆盖原文件。
/// 无法解析的文件会在下一次保存时被替换。
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl EndpointStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Endpoint>> {
        match self.read_all()?.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, endpoint: &Endpoint) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut records = match self.read_all() {
            Ok(records) => records,
            Err(Error::Serialization(e)) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable endpoint file");
                Map::new()
            }
            Err(e) => return Err(e),
        };
        records.insert(key.to_string(), serde_json::to_value(endpoint)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(&records)?)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), key, %endpoint, "Endpoint record saved");
        Ok(())
    }
}
