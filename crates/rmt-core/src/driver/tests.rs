use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::*;
use crate::multipart::{TransactionState, TransferOptions, TransferRequest};
use crate::transport::LocalStore;

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    }
}

struct Env {
    dir: tempfile::TempDir,
    store: Arc<LocalStore>,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::new(dir.path().join("store")));
        store.create_bucket("bucket").unwrap();
        Env { dir, store }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn driver(&self) -> Driver {
        Driver::new(self.store.clone()).with_retry_policy(fast_policy())
    }

    fn object(&self, key: &str) -> PathBuf {
        self.store.root().join("bucket").join(key)
    }
}

fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn upload_transfers_all_parts_and_commits() {
    let env = Env::new();
    let data = content(25);
    fs::write(env.path("src.bin"), &data).unwrap();
    let cpt = env.path("src.bin.cpt");
    let request = TransferRequest::upload("bucket", "dir/obj", env.path("src.bin"), TransferOptions::new(10, &cpt));
    let txn = Transaction::start(env.store.as_ref(), request).unwrap();

    let summary = txn.run(&env.driver().with_max_concurrent(2)).unwrap();
    assert_eq!(
        summary,
        TransferSummary {
            parts_total: 3,
            parts_skipped: 0,
            parts_transferred: 3,
            bytes_transferred: 25,
        }
    );
    assert_eq!(txn.state(), TransactionState::Finalized);
    assert_eq!(fs::read(env.object("dir/obj")).unwrap(), data);
    assert!(!cpt.exists());
}

#[test]
fn download_writes_destination_via_temp_file() {
    let env = Env::new();
    let data = content(1000);
    fs::write(env.object("obj"), &data).unwrap();
    let dest = env.path("out/dest.bin");
    let cpt = env.path("dest.cpt");
    let request = TransferRequest::download("bucket", "obj", &dest, TransferOptions::new(300, &cpt));
    let txn = Transaction::start(env.store.as_ref(), request).unwrap();

    let summary = txn.run(&env.driver()).unwrap();
    assert_eq!(summary.parts_transferred, 4);
    assert_eq!(fs::read(&dest).unwrap(), data);
    assert!(!crate::storage::temp_path(&dest).exists());
    assert!(!cpt.exists());
}

#[test]
fn empty_source_uploads_one_empty_part() {
    let env = Env::new();
    fs::write(env.path("empty"), b"").unwrap();
    let request = TransferRequest::upload("bucket", "empty", env.path("empty"), TransferOptions::new(10, env.path("e.cpt")));
    let txn = Transaction::start(env.store.as_ref(), request).unwrap();
    let summary = txn.run(&env.driver()).unwrap();
    assert_eq!(summary.parts_transferred, 1);
    assert_eq!(fs::read(env.object("empty")).unwrap(), b"");
}

#[test]
fn progress_is_reported_after_each_part() {
    let env = Env::new();
    fs::write(env.path("src.bin"), content(30)).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let options = TransferOptions::new(10, env.path("src.cpt"))
        .with_progress(move |s: &ProgressStats| sink.lock().unwrap().push((s.parts_done, s.bytes_done, s.total_bytes)));
    let request = TransferRequest::upload("bucket", "obj", env.path("src.bin"), options);
    let txn = Transaction::start(env.store.as_ref(), request).unwrap();
    txn.run(&env.driver().with_max_concurrent(1)).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![(1, 10, 30), (2, 20, 30), (3, 30, 30)]);
}

#[test]
fn abort_request_stops_and_aborts_transaction() {
    let env = Env::new();
    fs::write(env.path("src.bin"), content(30)).unwrap();
    let cpt = env.path("src.cpt");
    let abort = AbortHandle::new();
    let trigger = abort.clone();
    let options = TransferOptions::new(10, &cpt).with_progress(move |_: &ProgressStats| trigger.request_abort());
    let request = TransferRequest::upload("bucket", "obj", env.path("src.bin"), options);
    let txn = Transaction::start(env.store.as_ref(), request).unwrap();

    let driver = env.driver().with_max_concurrent(1).with_abort_handle(abort);
    let err = txn.run(&driver).unwrap_err();
    assert!(matches!(err, TransferError::Aborted { .. }), "{:?}", err);
    assert_eq!(txn.state(), TransactionState::Aborted);
    // The part in flight when abort was requested may still land.
    assert!(txn.completed_parts().len() < 3);
    assert!(!cpt.exists());
    assert!(!env.store.root().join(".multipart").join(txn.id()).exists());
    assert!(!env.object("obj").exists());
}

#[test]
fn upload_source_resized_after_start_is_refused() {
    let env = Env::new();
    fs::write(env.path("src.bin"), content(30)).unwrap();
    let request = TransferRequest::upload("bucket", "obj", env.path("src.bin"), TransferOptions::new(10, env.path("c.cpt")));
    let txn = Transaction::start(env.store.as_ref(), request).unwrap();
    fs::write(env.path("src.bin"), content(31)).unwrap();
    let err = txn.run(&env.driver()).unwrap_err();
    assert!(matches!(err, TransferError::SourceChanged { .. }), "{:?}", err);
    assert!(env.path("c.cpt").exists());
}

#[test]
fn missing_object_is_fatal_at_start() {
    let env = Env::new();
    let request = TransferRequest::download("bucket", "nope", env.path("d"), TransferOptions::new(10, env.path("d.cpt")));
    let err = Transaction::start(env.store.as_ref(), request).unwrap_err();
    assert!(matches!(err, TransferError::FatalTransfer { .. }), "{:?}", err);
    assert!(!env.path("d.cpt").exists());
}

#[tokio::test]
async fn run_blocking_drives_to_completion() {
    let env = Env::new();
    fs::write(env.path("src.bin"), content(15)).unwrap();
    let request = TransferRequest::upload("bucket", "obj", env.path("src.bin"), TransferOptions::new(10, env.path("c.cpt")));
    let txn = Arc::new(Transaction::start(env.store.as_ref(), request).unwrap());
    let summary = run_blocking(env.driver(), Arc::clone(&txn)).await.unwrap();
    assert_eq!(summary.parts_transferred, 2);
    assert_eq!(txn.state(), TransactionState::Finalized);
}
