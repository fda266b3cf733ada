use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write store file: {path}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to parse store file")]
    Parse(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One committed mutation, delivered to every subscriber in commit order.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub version: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    entries: Map<String, Value>,
    #[serde(default)]
    written: HashMap<String, u64>,
}

#[derive(Debug, Default)]
struct StoreInner {
    data: StoreFile,
    subscribers: Vec<Sender<StoreChange>>,
    path: Option<PathBuf>,
}

/// Durable key/value mapping with change subscription. Clones share one map.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl SharedStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let serialized = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&serialized)?
        } else {
            StoreFile::default()
        };
        tracing::debug!(path = %path.display(), version = data.version, "opened store");

        Ok(Self {
            inner: Rc::new(RefCell::new(StoreInner {
                data,
                subscribers: Vec::new(),
                path: Some(path),
            })),
        })
    }

    pub fn version(&self) -> u64 {
        self.inner.borrow().data.version
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().data.entries.get(key).cloned()
    }

    pub fn subscribe(&self) -> Receiver<StoreChange> {
        let (tx, rx) = mpsc::channel();
        self.inner.borrow_mut().subscribers.push(tx);
        rx
    }

    /// Keys under `prefix` with the version of their last write.
    pub fn entries_with_prefix(&self, prefix: &str) -> Vec<(String, u64)> {
        let inner = self.inner.borrow();
        inner
            .data
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| {
                let version = inner.data.written.get(key).copied().unwrap_or(0);
                (key.clone(), version)
            })
            .collect()
    }

    pub fn set(&self, key: &str, value: Value) -> StoreResult<u64> {
        self.commit(key, Some(value))
    }

    /// Removing an absent key is a no-op and returns the current version.
    pub fn remove(&self, key: &str) -> StoreResult<u64> {
        if self.get(key).is_none() {
            return Ok(self.version());
        }
        self.commit(key, None)
    }

    fn commit(&self, key: &str, new_value: Option<Value>) -> StoreResult<u64> {
        let change = {
            let mut inner = self.inner.borrow_mut();
            inner.data.version += 1;
            let version = inner.data.version;
            let old_value = match &new_value {
                Some(value) => {
                    inner.data.written.insert(key.to_string(), version);
                    inner.data.entries.insert(key.to_string(), value.clone())
                }
                None => {
                    inner.data.written.remove(key);
                    inner.data.entries.remove(key)
                }
            };
            StoreChange {
                key: key.to_string(),
                old_value,
                new_value,
                version,
            }
        };
        tracing::debug!(key = %change.key, version = change.version, "store write");

        self.notify(&change);
        self.persist()?;
        Ok(change.version)
    }

    fn notify(&self, change: &StoreChange) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }

    fn persist(&self) -> StoreResult<()> {
        let inner = self.inner.borrow();
        let Some(path) = inner.path.as_deref() else {
            return Ok(());
        };
        write_store_file(path, &inner.data)
    }
}

fn write_store_file(path: &Path, data: &StoreFile) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let serialized = serde_json::to_string_pretty(data)?;
    fs::write(path, serialized).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
