use crate::{
    StoreError, StoreResult,
    cursor::{CursorRequest, Entry, RangeCursor},
};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::sync::{mpsc, oneshot};

/// Marks a pull as outstanding until dropped.
struct PullGuard(Arc<AtomicBool>);

impl PullGuard {
    fn claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| Self(flag.clone()))
    }
}

impl Drop for PullGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to a running iterator.
///
/// Returned by [`KeyValueStore::iterator`]. Dropping the handle stops the
/// iterator task.
///
/// [`KeyValueStore::iterator`]: crate::KeyValueStore::iterator
#[derive(Debug)]
pub struct StoreIterator {
    sender: mpsc::Sender<CursorRequest>,
    outstanding: Arc<AtomicBool>,
    opened: Arc<AtomicU64>,
}

impl StoreIterator {
    pub(crate) fn new(sender: mpsc::Sender<CursorRequest>, opened: Arc<AtomicU64>) -> Self {
        Self { sender, outstanding: Arc::new(AtomicBool::new(false)), opened }
    }

    /// Pull the next entry.
    ///
    /// The pull is registered when this method is called, not when the
    /// returned future is first polled. Calling `next` again before the
    /// previous future completes yields
    /// [`StoreError::ProtocolViolation`]. Dropping an unfinished future
    /// releases the pull and its entry goes to the next call.
    ///
    /// Fails with [`StoreError::Cancelled`] once the store is closed.
    pub fn next(&self) -> impl Future<Output = StoreResult<Option<Entry>>> + Send + 'static {
        let guard = PullGuard::claim(&self.outstanding);
        let sender = self.sender.clone();
        async move {
            let Some(_guard) = guard else {
                return Err(StoreError::ProtocolViolation(
                    "next() called while a previous call is still outstanding",
                ));
            };
            let (resp, rx) = oneshot::channel();
            sender.send(CursorRequest::Next { resp }).await.map_err(|_| StoreError::Cancelled)?;
            rx.await.map_err(|_| StoreError::Cancelled)?
        }
    }

    /// End the iteration. Later pulls deliver `None`.
    ///
    /// Ending an iterator whose task has already stopped is a no-op.
    pub async fn end(&self) -> StoreResult<()> {
        let (resp, rx) = oneshot::channel();
        if self.sender.send(CursorRequest::End { resp }).await.is_err() {
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }

    /// Number of engine cursors opened so far. Grows by one on each reopen
    /// after a transaction expiry.
    pub fn cursors_opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }
}

impl RangeCursor for StoreIterator {
    fn next(&self) -> impl Future<Output = StoreResult<Option<Entry>>> + Send {
        Self::next(self)
    }

    fn end(&self) -> impl Future<Output = StoreResult<()>> + Send {
        Self::end(self)
    }
}
