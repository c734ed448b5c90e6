use crate::{
    EngineError, EngineResult, IteratorOptions, Key, KeyCodec, KvConnection, ScanRange,
    StoreError, StoreResult, Value,
    codec::decode_value,
    cursor::{Entry, Responder},
    engine::EngineCursor,
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::debug;

/// Where the session is in its lifecycle.
enum Phase<C> {
    /// No cursor has been opened yet.
    Idle,
    /// A cursor is open. `in_flight` is set while the engine owes a row.
    Active { cursor: C, in_flight: bool },
    /// The previous cursor's transaction expired. The next pull reopens.
    Reopening,
    /// Every pull delivers `None`.
    Exhausted,
    /// Every pull delivers the stored error.
    Errored(StoreError),
}

/// Iteration state of one iterator.
///
/// Caller pulls fill `pending_request`, engine rows fill `pending_result`,
/// and [`reconcile`](Self::reconcile) answers the pull once both are in.
pub(crate) struct CursorSession<N: KvConnection> {
    conn: Arc<N>,
    collection: String,
    scan: ScanRange,
    codec: KeyCodec,
    key_as_buffer: bool,
    value_as_buffer: bool,
    reopen_on_timeout: bool,

    phase: Phase<N::Cursor>,
    delivered: u64,
    last_key: Option<Key>,
    opened: Arc<AtomicU64>,

    pending_request: Option<Responder<Option<Entry>>>,
    pending_result: Option<(Key, Value)>,
}

impl<N: KvConnection> std::fmt::Debug for CursorSession<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorSession")
            .field("collection", &self.collection)
            .field("scan", &self.scan)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}

impl<N: KvConnection> CursorSession<N> {
    /// Build a session over `options`. Fails if the limit is invalid.
    pub(crate) fn new(
        conn: Arc<N>,
        collection: String,
        codec: KeyCodec,
        options: &IteratorOptions,
        opened: Arc<AtomicU64>,
    ) -> StoreResult<Self> {
        Ok(Self {
            conn,
            collection,
            scan: ScanRange::new(options, &codec)?,
            codec,
            key_as_buffer: options.key_as_buffer,
            value_as_buffer: options.value_as_buffer,
            reopen_on_timeout: options.reopen_on_timeout,
            phase: Phase::Idle,
            delivered: 0,
            last_key: None,
            opened,
            pending_request: None,
            pending_result: None,
        })
    }

    /// Open the first cursor. A zero limit exhausts the session instead.
    pub(crate) fn start(&mut self) {
        if self.scan.limit().is_zero() {
            debug!("zero limit, iterator exhausted");
            self.phase = Phase::Exhausted;
            return;
        }
        self.open();
    }

    /// True while the engine owes the session a row.
    pub(crate) const fn fetching(&self) -> bool {
        matches!(self.phase, Phase::Active { in_flight: true, .. })
    }

    /// Wait for the row owed by the engine. Never resolves unless
    /// [`fetching`](Self::fetching) is true.
    pub(crate) async fn fetch(&mut self) -> EngineResult<Option<(Key, Value)>> {
        match &mut self.phase {
            Phase::Active { cursor, in_flight: true } => cursor.fetch().await,
            _ => std::future::pending().await,
        }
    }

    fn open(&mut self) {
        if !self.scan.limit().allows(self.delivered) {
            self.phase = Phase::Exhausted;
            return;
        }
        let Some(range) = self.scan.effective(self.last_key.as_ref()) else {
            debug!("empty range, iterator exhausted");
            self.phase = Phase::Exhausted;
            return;
        };
        match self.conn.open_cursor(&self.collection, range, self.scan.direction()) {
            Ok(cursor) => {
                let opens = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(opens, resumed = self.last_key.is_some(), "cursor opened");
                self.phase = Phase::Active { cursor, in_flight: true };
            }
            Err(err) => {
                debug!(%err, "cursor open failed");
                self.phase = Phase::Errored(err.into());
            }
        }
    }

    /// Record a row (or the end of the range) reported by the engine.
    pub(crate) fn on_row(&mut self, row: EngineResult<Option<(Key, Value)>>) {
        if let Phase::Active { in_flight, .. } = &mut self.phase {
            *in_flight = false;
        }
        match row {
            Ok(Some((key, value))) if self.scan.limit().allows(self.delivered) => {
                self.last_key = Some(key.clone());
                self.pending_result = Some((key, value));
            }
            Ok(_) => {
                debug!(delivered = self.delivered, "iterator exhausted");
                self.phase = Phase::Exhausted;
            }
            Err(err) => {
                debug!(%err, "cursor fetch failed");
                self.phase = Phase::Errored(err.into());
            }
        }
        self.reconcile();
    }

    /// Register a caller pull.
    pub(crate) fn on_next(&mut self, resp: Responder<Option<Entry>>) {
        if self.pending_request.as_ref().is_some_and(|pending| !pending.is_closed()) {
            let _ = resp.send(Err(StoreError::ProtocolViolation(
                "next() called while a previous call is still outstanding",
            )));
            return;
        }
        self.pending_request = Some(resp);
        if matches!(self.phase, Phase::Idle | Phase::Reopening) {
            self.open();
        }
        self.reconcile();
    }

    /// End the iteration. An outstanding pull is answered with `None`.
    pub(crate) fn on_end(&mut self) {
        if !matches!(self.phase, Phase::Errored(_)) {
            self.phase = Phase::Exhausted;
        }
        self.pending_result = None;
        if let Some(resp) = self.pending_request.take() {
            let _ = resp.send(Ok(None));
        }
        debug!(delivered = self.delivered, "iterator ended");
    }

    /// Answer the pending pull if its result is available.
    fn reconcile(&mut self) {
        // a dropped pull leaves its result for the next one
        if self.pending_request.as_ref().is_some_and(|pending| pending.is_closed()) {
            self.pending_request = None;
        }
        let Some(resp) = self.pending_request.take() else { return };

        let reply = match &self.phase {
            Phase::Exhausted => Ok(None),
            Phase::Errored(err) => Err(err.clone()),
            _ => match self.pending_result.take() {
                Some(row) => self.resolve(row),
                None => {
                    self.pending_request = Some(resp);
                    return;
                }
            },
        };
        let _ = resp.send(reply);
    }

    /// Decode a row for delivery and prefetch the next one.
    fn resolve(&mut self, (key, value): (Key, Value)) -> StoreResult<Option<Entry>> {
        let value = match decode_value(value, self.value_as_buffer, false) {
            Ok(value) => value,
            Err(err) => {
                self.phase = Phase::Errored(err.clone());
                return Err(err);
            }
        };
        let entry = (self.codec.denormalize(key, self.key_as_buffer), value);
        self.delivered += 1;

        if !self.scan.limit().allows(self.delivered) {
            debug!(delivered = self.delivered, "limit reached");
            self.phase = Phase::Exhausted;
            return Ok(Some(entry));
        }

        let advanced = match &mut self.phase {
            Phase::Active { cursor, in_flight } => {
                let res = cursor.advance();
                *in_flight = res.is_ok();
                res
            }
            _ => Ok(()),
        };
        match advanced {
            Ok(()) => Ok(Some(entry)),
            Err(EngineError::TransactionInactive) if self.reopen_on_timeout => {
                debug!(delivered = self.delivered, "cursor transaction expired, reopening");
                self.phase = Phase::Reopening;
                Ok(Some(entry))
            }
            Err(err) => {
                let err = StoreError::from(err);
                debug!(%err, "cursor advance failed");
                self.phase = Phase::Errored(err.clone());
                Err(err)
            }
        }
    }
}
