use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

/// Read-only view of the game's persisted entry. `None` means the game has
/// no saved state, which ends autoplay.
pub trait StateSource: Send {
    fn read(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Page-local key/value storage held in process. Clones share the same map,
/// so a simulated game can mutate what the driver reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.lock().insert(key.to_string(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.lock().remove(key)
    }
}

pub struct MemoryStateSource {
    storage: MemoryStorage,
    key: String,
}

impl MemoryStateSource {
    pub fn new(storage: MemoryStorage, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }
}

impl StateSource for MemoryStateSource {
    fn read(&mut self) -> impl Future<Output = Result<Option<String>>> + Send {
        let value = self.storage.get(&self.key);
        async move { Ok(value) }
    }
}

/// Yields a fixed sequence of reads, then absent forever.
#[derive(Debug, Default)]
pub struct ScriptedStateSource {
    reads: VecDeque<Option<String>>,
    served: usize,
}

impl ScriptedStateSource {
    pub fn new<I, S>(reads: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            reads: reads.into_iter().map(|r| r.map(Into::into)).collect(),
            served: 0,
        }
    }

    pub fn served(&self) -> usize {
        self.served
    }
}

impl StateSource for ScriptedStateSource {
    fn read(&mut self) -> impl Future<Output = Result<Option<String>>> + Send {
        self.served += 1;
        let value = self.reads.pop_front().flatten();
        async move { Ok(value) }
    }
}

/// Persisted entry exported to a file. A missing file reads as absent.
#[derive(Debug, Clone)]
pub struct FileStateSource {
    path: PathBuf,
}

impl FileStateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateSource for FileStateSource {
    fn read(&mut self) -> impl Future<Output = Result<Option<String>>> + Send {
        let path = self.path.clone();
        async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
    }
}
