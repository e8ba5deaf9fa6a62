// ABOUTME: Correlates outstanding requests with their responses by sequence number
// ABOUTME: Shared by submitters, which wait, and the reader task, which resolves

use crate::client::error::SegmentError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Notify, oneshot};
use tokio::time::{Instant, timeout_at};

/// Message id on success
pub(crate) type Correlation = Result<String, SegmentError>;

#[derive(Debug, Default)]
pub(crate) struct PendingResponses {
    waiters: Mutex<HashMap<u32, oneshot::Sender<Correlation>>>,
    drained: Notify,
}

impl PendingResponses {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn waiters(&self) -> MutexGuard<'_, HashMap<u32, oneshot::Sender<Correlation>>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start waiting for the response to `sequence_number`. Register before
    /// writing the request so a fast response cannot be missed.
    pub(crate) fn register(&self, sequence_number: u32) -> oneshot::Receiver<Correlation> {
        let (tx, rx) = oneshot::channel();
        self.waiters().insert(sequence_number, tx);
        rx
    }

    /// Deliver a response. Returns false when nothing was waiting for it.
    pub(crate) fn resolve(&self, sequence_number: u32, result: Correlation) -> bool {
        let mut waiters = self.waiters();
        let Some(tx) = waiters.remove(&sequence_number) else {
            return false;
        };
        if waiters.is_empty() {
            self.drained.notify_waiters();
        }
        drop(waiters);

        // The waiter may have timed out already
        let _ = tx.send(result);
        true
    }

    /// Stop waiting without a result
    pub(crate) fn cancel(&self, sequence_number: u32) {
        let mut waiters = self.waiters();
        if waiters.remove(&sequence_number).is_some() && waiters.is_empty() {
            self.drained.notify_waiters();
        }
    }

    /// Fail every outstanding request. Returns how many there were.
    pub(crate) fn fail_all(&self, error: SegmentError) -> usize {
        let drained: Vec<_> = self.waiters().drain().collect();
        self.drained.notify_waiters();

        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(Err(error.clone()));
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters().len()
    }

    /// Wait until nothing is outstanding. Returns false if `limit` passed
    /// first.
    pub(crate) async fn wait_drained(&self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.len() == 0 {
                return true;
            }
            if timeout_at(deadline, notified).await.is_err() {
                return self.len() == 0;
            }
        }
    }
}
