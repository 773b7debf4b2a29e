//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod flaky_transport;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rmt_core::retry::RetryPolicy;
use rmt_core::LocalStore;

use flaky_transport::FlakyTransport;

/// Scratch directory with a local store (bucket `bucket`) wrapped in a `FlakyTransport`.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub transport: Arc<FlakyTransport>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store"));
        store.create_bucket("bucket").unwrap();
        Harness {
            dir,
            transport: Arc::new(FlakyTransport::new(store)),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Path of a committed object in the store.
    pub fn object_path(&self, key: &str) -> PathBuf {
        self.transport.inner().root().join("bucket").join(key)
    }
}

/// Backoff short enough for tests.
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

/// Deterministic, non-repeating-per-part test content.
pub fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i / 7) ^ (i * 13)) as u8).collect()
}

pub fn checkpoint_part_numbers(path: &Path) -> Vec<u32> {
    rmt_core::checkpoint::CheckpointState::load(path)
        .unwrap()
        .parts
        .iter()
        .map(|p| p.number())
        .collect()
}
