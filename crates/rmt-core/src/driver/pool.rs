//! Bounded worker pool for part transfers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex, PoisonError};

use crate::control::AbortHandle;
use crate::error::Result;
use crate::multipart::Part;
use crate::partition::PartRange;

/// Run `work` for every range on up to `max_concurrent` threads, handing each
/// finished part to `record` on the calling thread as it arrives.
///
/// The first error (from a worker or from `record`) stops dispatch: the queue is
/// drained, in-flight parts finish and are still recorded, and that error is
/// returned. An abort request stops dispatch the same way but returns `Ok`; the
/// caller checks the handle.
pub(super) fn run_parts<W, R>(
    transaction_id: &str,
    pending: Vec<PartRange>,
    max_concurrent: usize,
    abort: &AbortHandle,
    work: W,
    mut record: R,
) -> Result<()>
where
    W: Fn(&PartRange) -> Result<Part> + Sync,
    R: FnMut(Part) -> Result<()>,
{
    if pending.is_empty() {
        return Ok(());
    }
    let num_workers = max_concurrent.max(1).min(pending.len());
    let queue: Mutex<VecDeque<PartRange>> = Mutex::new(pending.into_iter().collect());
    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(u32, Result<Part>)>();

    let span = tracing::Span::current();
    std::thread::scope(|s| {
        for _ in 0..num_workers {
            let tx = tx.clone();
            let (queue, stop, work) = (&queue, &stop, &work);
            let span = span.clone();
            s.spawn(move || {
                let _entered = span.enter();
                loop {
                    if stop.load(Ordering::Relaxed) || abort.is_abort_requested() {
                        break;
                    }
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                    let Some(range) = next else {
                        break;
                    };
                    tracing::debug!(id = transaction_id, part = range.number, bytes = range.len(), "dispatching part");
                    let res = work(&range);
                    if res.is_err() {
                        stop.store(true, Ordering::Relaxed);
                    }
                    if tx.send((range.number, res)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut first_error = None;
        for (number, res) in rx {
            let res = res.and_then(&mut record);
            if let Err(e) = res {
                tracing::warn!(id = transaction_id, part = number, "part failed: {}", e);
                if first_error.is_none() {
                    stop.store(true, Ordering::Relaxed);
                    queue.lock().unwrap_or_else(PoisonError::into_inner).clear();
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;

    fn ranges(n: u32) -> Vec<PartRange> {
        (1..=n)
            .map(|i| PartRange {
                number: i,
                start: u64::from(i - 1) * 10,
                end: u64::from(i) * 10,
            })
            .collect()
    }

    fn part(r: &PartRange) -> Part {
        Part::new(r.number, format!("E{}", r.number), r.len(), Utc::now())
    }

    #[test]
    fn records_every_part() {
        let mut recorded = Vec::new();
        run_parts("t", ranges(7), 3, &AbortHandle::new(), |r| Ok(part(r)), |p| {
            recorded.push(p.number());
            Ok(())
        })
        .unwrap();
        recorded.sort_unstable();
        assert_eq!(recorded, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn first_error_stops_dispatch() {
        let calls = AtomicUsize::new(0);
        let mut recorded = Vec::new();
        let err = run_parts(
            "t",
            ranges(5),
            1,
            &AbortHandle::new(),
            |r| {
                calls.fetch_add(1, Ordering::SeqCst);
                if r.number == 3 {
                    Err(TransferError::Client("boom".to_string()))
                } else {
                    Ok(part(r))
                }
            },
            |p| {
                recorded.push(p.number());
                Ok(())
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransferError::Client(_)));
        assert_eq!(recorded, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn record_failure_is_returned() {
        let err = run_parts("t", ranges(2), 1, &AbortHandle::new(), |r| Ok(part(r)), |_| {
            Err(TransferError::Client("disk full".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, TransferError::Client(_)));
    }

    #[test]
    fn abort_stops_before_dispatch() {
        let abort = AbortHandle::new();
        abort.request_abort();
        let calls = AtomicUsize::new(0);
        run_parts("t", ranges(4), 2, &abort, |r| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(part(r))
        }, |_| Ok(()))
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
