//! Test utilities for cash crates.

use async_trait::async_trait;
use cash_backends_core::{Backend, BackendError, BackendResult, BackendStats};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    std::fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

#[derive(Default)]
struct Faults {
    load: Option<String>,
    store: Option<String>,
    delete: Option<String>,
}

#[derive(Default)]
struct Calls {
    loads: AtomicU64,
    stores: AtomicU64,
    deletes: AtomicU64,
}

/// Scriptable in-memory tier.
///
/// Counts every call, can be told to fail any operation with a fixed
/// message, and exposes its raw bytes so tests can check exactly what the
/// orchestrator wrote.
pub struct MockBackend {
    name: String,
    local: bool,
    entries: Mutex<HashMap<String, Vec<u8>>>,
    faults: Mutex<Faults>,
    calls: Calls,
}

impl MockBackend {
    fn new(name: impl Into<String>, local: bool) -> Self {
        Self {
            name: name.into(),
            local,
            entries: Mutex::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
            calls: Calls::default(),
        }
    }

    /// An in-process tier.
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// A networked tier.
    pub fn remote(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// Make every `load` fail with `message`.
    pub fn fail_loads(self, message: impl Into<String>) -> Self {
        self.faults.lock().load = Some(message.into());
        self
    }

    /// Make every `store` fail with `message`.
    pub fn fail_stores(self, message: impl Into<String>) -> Self {
        self.faults.lock().store = Some(message.into());
        self
    }

    /// Make every `delete` fail with `message`.
    pub fn fail_deletes(self, message: impl Into<String>) -> Self {
        self.faults.lock().delete = Some(message.into());
        self
    }

    /// Clear every injected failure.
    pub fn heal(&self) {
        *self.faults.lock() = Faults::default();
    }

    /// Bytes currently held under `key`, bypassing the call counters.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    /// Put bytes under `key`, bypassing the call counters.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.lock().insert(key.into(), value.into());
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entries are held.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of `load` calls received.
    pub fn load_calls(&self) -> u64 {
        self.calls.loads.load(Ordering::SeqCst)
    }

    /// Number of `store` calls received.
    pub fn store_calls(&self) -> u64 {
        self.calls.stores.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls received.
    pub fn delete_calls(&self) -> u64 {
        self.calls.deletes.load(Ordering::SeqCst)
    }

    fn fault(&self, pick: impl FnOnce(&Faults) -> &Option<String>) -> BackendResult<()> {
        match pick(&self.faults.lock()) {
            Some(message) => Err(BackendError::custom(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_local(&self) -> bool {
        self.local
    }

    async fn load(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        self.calls.loads.fetch_add(1, Ordering::SeqCst);
        self.fault(|f| &f.load)?;
        Ok(self.raw(key))
    }

    async fn store(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        self.calls.stores.fetch_add(1, Ordering::SeqCst);
        self.fault(|f| &f.store)?;
        self.insert_raw(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        self.calls.deletes.fetch_add(1, Ordering::SeqCst);
        self.fault(|f| &f.delete)?;
        self.entries.lock().remove(key);
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            entries: self.len() as u64,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_temp_file_creation() {
        let content = "test content";
        let (_dir, path) = temp_file(content);
        assert!(path.is_file());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_mock_backend_counts_and_stores() {
        let mock = MockBackend::local("l1");
        assert!(mock.load("k").await.unwrap().is_none());
        mock.store("k", b"v").await.unwrap();
        assert_eq!(mock.load("k").await.unwrap(), Some(b"v".to_vec()));
        mock.delete("k").await.unwrap();

        assert_eq!(mock.load_calls(), 2);
        assert_eq!(mock.store_calls(), 1);
        assert_eq!(mock.delete_calls(), 1);
        assert!(mock.is_empty());
        assert!(mock.is_local());
    }

    #[tokio::test]
    async fn test_mock_backend_fault_injection() {
        let mock = MockBackend::remote("r1")
            .fail_loads("load down")
            .fail_stores("store down");
        mock.insert_raw("k", b"v".to_vec());

        let err = assert_err!(mock.load("k").await);
        assert_eq!(err.to_string(), "load down");
        let err = assert_err!(mock.store("k", b"x").await);
        assert_eq!(err.to_string(), "store down");
        assert_ok!(mock.delete("missing").await);

        mock.heal();
        assert_eq!(assert_ok!(mock.load("k").await), Some(b"v".to_vec()));
        assert!(!mock.is_local());
    }

    proptest! {
        #[test]
        fn test_temp_file_content_roundtrip(content in "\\PC*") {
            let (_dir, path) = temp_file(&content);
            let read_content = std::fs::read_to_string(&path).unwrap();
            prop_assert_eq!(content, read_content);
        }
    }
}
