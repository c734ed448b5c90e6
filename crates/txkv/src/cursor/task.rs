use crate::{
    KvConnection,
    cursor::{CursorRequest, CursorSession},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Channel size for iterator requests. A well-behaved caller has at most
/// one pull and one end in flight.
pub(crate) const CURSOR_CHANNEL_SIZE: usize = 2;

/// The task driving one iterator.
///
/// The task owns the iterator's [`CursorSession`] and runs until the
/// store's cancellation token fires or every [`StoreIterator`] handle is
/// dropped.
///
/// # Processing Model
///
/// - **Requests**: pulls and ends from the handle are applied to the
///   session in arrival order.
/// - **Fetches**: while the engine owes a row, the task awaits it
///   alongside incoming requests. The fetch is cancel-safe, so a request
///   arriving first does not lose the row.
///
/// [`StoreIterator`]: crate::StoreIterator
pub struct CursorTask<N: KvConnection> {
    session: CursorSession<N>,
    requests: mpsc::Receiver<CursorRequest>,
    cancel_token: CancellationToken,
}

impl<N: KvConnection> std::fmt::Debug for CursorTask<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorTask").finish_non_exhaustive()
    }
}

impl<N: KvConnection> CursorTask<N> {
    pub(crate) const fn new(
        session: CursorSession<N>,
        requests: mpsc::Receiver<CursorRequest>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self { session, requests, cancel_token }
    }

    /// Run the task, processing requests until shutdown.
    #[instrument(skip(self), name = "cursor_task")]
    pub async fn run(mut self) {
        debug!("Cursor task started");
        self.session.start();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => {
                    debug!("Cursor task received cancellation signal");
                    break;
                }

                maybe_req = self.requests.recv() => {
                    let Some(req) = maybe_req else {
                        debug!("Cursor request channel closed");
                        break;
                    };
                    match req {
                        CursorRequest::Next { resp } => self.session.on_next(resp),
                        CursorRequest::End { resp } => {
                            self.session.on_end();
                            let _ = resp.send(Ok(()));
                        }
                    }
                }

                row = self.session.fetch(), if self.session.fetching() => {
                    self.session.on_row(row);
                }
            }
        }

        debug!("Cursor task shut down");
    }
}
