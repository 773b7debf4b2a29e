//! `Transport` wrapper over `LocalStore` that injects failures and records calls.

use std::collections::HashMap;
use std::sync::Mutex;

use rmt_core::multipart::{Part, TransferOptions};
use rmt_core::partition::PartRange;
use rmt_core::{LocalStore, ObjectMeta, Transport, TransportError};

/// How a part call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// 403 on every attempt.
    Fatal,
    /// 503 for the next `n` attempts, then pass through.
    Transient(u32),
    /// 503 on every attempt.
    AlwaysTransient,
}

#[derive(Default)]
struct Calls {
    parts: Vec<u32>,
    completes: Vec<Vec<u32>>,
    initiates: usize,
    cancels: usize,
}

pub struct FlakyTransport {
    inner: LocalStore,
    failures: Mutex<HashMap<u32, Failure>>,
    fail_cancel: Mutex<bool>,
    calls: Mutex<Calls>,
}

impl FlakyTransport {
    pub fn new(inner: LocalStore) -> Self {
        FlakyTransport {
            inner,
            failures: Mutex::new(HashMap::new()),
            fail_cancel: Mutex::new(false),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn inner(&self) -> &LocalStore {
        &self.inner
    }

    pub fn fail_part(&self, number: u32, failure: Failure) {
        self.failures.lock().unwrap().insert(number, failure);
    }

    pub fn fail_cancel(&self, fail: bool) {
        *self.fail_cancel.lock().unwrap() = fail;
    }

    /// Forget injected failures and recorded calls.
    pub fn reset(&self) {
        self.failures.lock().unwrap().clear();
        *self.calls.lock().unwrap() = Calls::default();
    }

    /// Part numbers of every upload/download attempt, in call order.
    pub fn dispatched(&self) -> Vec<u32> {
        self.calls.lock().unwrap().parts.clone()
    }

    /// Part numbers passed to each `complete` call.
    pub fn completes(&self) -> Vec<Vec<u32>> {
        self.calls.lock().unwrap().completes.clone()
    }

    pub fn initiates(&self) -> usize {
        self.calls.lock().unwrap().initiates
    }

    pub fn cancels(&self) -> usize {
        self.calls.lock().unwrap().cancels
    }

    fn attempt(&self, number: u32) -> Result<(), TransportError> {
        self.calls.lock().unwrap().parts.push(number);
        let mut failures = self.failures.lock().unwrap();
        match failures.get(&number).copied() {
            None => Ok(()),
            Some(Failure::Fatal) => Err(TransportError::http(403, "AccessDenied")),
            Some(Failure::AlwaysTransient) => Err(TransportError::http(503, "SlowDown")),
            Some(Failure::Transient(0)) => {
                failures.remove(&number);
                Ok(())
            }
            Some(Failure::Transient(n)) => {
                if n == 1 {
                    failures.remove(&number);
                } else {
                    failures.insert(number, Failure::Transient(n - 1));
                }
                Err(TransportError::http(503, "SlowDown"))
            }
        }
    }
}

impl Transport for FlakyTransport {
    fn initiate(&self, bucket: &str, object: &str, options: &TransferOptions) -> Result<String, TransportError> {
        self.calls.lock().unwrap().initiates += 1;
        self.inner.initiate(bucket, object, options)
    }

    fn upload_part(
        &self,
        bucket: &str,
        object: &str,
        transaction_id: &str,
        number: u32,
        range: &PartRange,
        body: &[u8],
    ) -> Result<Part, TransportError> {
        self.attempt(number)?;
        self.inner
            .upload_part(bucket, object, transaction_id, number, range, body)
    }

    fn download_part(
        &self,
        bucket: &str,
        object: &str,
        transaction_id: &str,
        number: u32,
        range: &PartRange,
    ) -> Result<(Vec<u8>, Part), TransportError> {
        self.attempt(number)?;
        self.inner
            .download_part(bucket, object, transaction_id, number, range)
    }

    fn complete(&self, bucket: &str, object: &str, transaction_id: &str, parts: &[Part]) -> Result<(), TransportError> {
        self.calls
            .lock()
            .unwrap()
            .completes
            .push(parts.iter().map(Part::number).collect());
        self.inner.complete(bucket, object, transaction_id, parts)
    }

    fn cancel(&self, bucket: &str, object: &str, transaction_id: &str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().cancels += 1;
        if *self.fail_cancel.lock().unwrap() {
            return Err(TransportError::Connection("connection reset by peer".to_string()));
        }
        self.inner.cancel(bucket, object, transaction_id)
    }

    fn head_object(&self, bucket: &str, object: &str) -> Result<ObjectMeta, TransportError> {
        self.inner.head_object(bucket, object)
    }
}
