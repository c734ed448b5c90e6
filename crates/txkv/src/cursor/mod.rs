//! Range iteration over a store.
//!
//! Each iterator is backed by a task that owns one engine cursor at a time:
//!
//! - [`StoreIterator`] is the caller's handle. Each
//!   [`next`](StoreIterator::next) sends one pull to the task and waits for
//!   exactly one reply.
//! - [`CursorTask`] runs the pull loop. It interleaves caller requests with
//!   the in-flight engine fetch, and stops when the store closes or the
//!   handle is dropped.
//!
//! Engine transactions are short-lived. When a cursor's transaction expires
//! between two rows the iterator either fails with
//! [`StoreError::CursorTimeout`], or, with
//! [`reopen_on_timeout`](IteratorOptions::reopen_on_timeout), opens a fresh
//! cursor that resumes strictly after the last key it received.
//!
//! [`StoreError::CursorTimeout`]: crate::StoreError::CursorTimeout

mod handle;
pub use handle::StoreIterator;

mod options;
pub use options::IteratorOptions;

mod session;
pub(crate) use session::CursorSession;

mod task;
pub(crate) use task::CURSOR_CHANNEL_SIZE;
pub use task::CursorTask;

use crate::{Key, StoreError, Value};
use std::future::Future;
use tokio::sync::oneshot;

/// Response sender type alias that propagates Result types.
pub(crate) type Responder<T> = oneshot::Sender<Result<T, StoreError>>;

/// A key/value pair delivered by an iterator.
pub type Entry = (Key, Value);

/// Messages sent from a [`StoreIterator`] to its [`CursorTask`].
#[derive(Debug)]
pub(crate) enum CursorRequest {
    /// Deliver the next entry, or `None` once the iterator is done.
    Next {
        /// The response channel.
        resp: Responder<Option<Entry>>,
    },
    /// Stop iterating. Later pulls deliver `None`.
    End {
        /// The response channel.
        resp: Responder<()>,
    },
}

/// Pull-based access to an ordered range of entries.
pub trait RangeCursor: Send + Sync {
    /// Pull the next entry. `None` means the range is exhausted or the
    /// cursor was ended.
    ///
    /// Only one pull may be outstanding at a time. A second pull issued
    /// while the first is pending fails with
    /// [`StoreError::ProtocolViolation`] and leaves the first untouched.
    fn next(&self) -> impl Future<Output = Result<Option<Entry>, StoreError>> + Send;

    /// End the iteration. Later pulls deliver `None`.
    fn end(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
