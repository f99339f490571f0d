//! Multi-book routing and the core task event loop.
//!
//! One `BookManager` owns every book in the process. All inputs —
//! decoded stream frames and snapshot completions — arrive on a single
//! queue and are applied serially, so no book ever sees concurrent
//! mutation. The stream transport and snapshot fetch tasks only post
//! onto the queue.

use super::book::{BookMode, OrderBook};
use super::error::BookError;
use super::listener::SharedBookListener;
use super::reconcile::{self, MAX_RECONCILE_ATTEMPTS, SnapshotSource};
use super::snapshot::BookSnapshot;
use crate::feed::auth::{FeedCredentials, public_subscribe_frame};
use crate::feed::error::FeedError;
use crate::feed::message::{FeedMessage, Frame, decode_frame};
use crate::feed::websocket::FeedHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Inputs consumed by the core task.
#[derive(Debug)]
pub enum CoreInput {
    /// Raw text frame from the stream transport.
    Frame(String),
    /// Completion of a snapshot fetch for one reconciliation generation.
    Snapshot {
        /// Product the snapshot was fetched for.
        product_id: String,
        /// Generation the fetch was issued under.
        generation: u64,
        /// The snapshot, or why the fetch failed.
        result: Result<BookSnapshot, FeedError>,
    },
    /// Stream reconnected: every book re-bootstraps.
    Reset,
}

/// Routes inputs to per-product books and drives their reconciliation.
pub struct BookManager {
    books: HashMap<String, OrderBook>,
    source: Arc<dyn SnapshotSource>,
    listener: Option<SharedBookListener>,
    credentials: Option<FeedCredentials>,
    feed: Option<FeedHandle>,
    strict: bool,
    core_tx: mpsc::UnboundedSender<CoreInput>,
}

impl BookManager {
    /// Create a manager and the receiving end of its input queue. Hand
    /// `sender()` clones to the transport; pass the receiver to [`run`]
    /// (or drive [`handle_input`] directly in tests).
    ///
    /// [`run`]: BookManager::run
    /// [`handle_input`]: BookManager::handle_input
    pub fn new(source: Arc<dyn SnapshotSource>) -> (Self, mpsc::UnboundedReceiver<CoreInput>) {
        let (core_tx, core_rx) = mpsc::unbounded_channel();
        (
            Self {
                books: HashMap::new(),
                source,
                listener: None,
                credentials: None,
                feed: None,
                strict: false,
                core_tx,
            },
            core_rx,
        )
    }

    /// Observer attached to every book this manager creates.
    pub fn set_listener(&mut self, listener: SharedBookListener) {
        self.listener = Some(listener);
    }

    /// Credentials used to sign subscribe frames.
    pub fn set_credentials(&mut self, credentials: FeedCredentials) {
        self.credentials = Some(credentials);
    }

    /// Attach the stream handle used for outbound subscribe frames.
    pub fn attach_feed(&mut self, feed: FeedHandle) {
        self.feed = Some(feed);
    }

    /// Drop frames for unregistered products instead of lazily creating
    /// books for them.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// A clone of the core input sender.
    pub fn sender(&self) -> mpsc::UnboundedSender<CoreInput> {
        self.core_tx.clone()
    }

    /// Read-only access to one book.
    pub fn book(&self, product_id: &str) -> Option<&OrderBook> {
        self.books.get(product_id)
    }

    /// True when a book exists for the product.
    pub fn has_book(&self, product_id: &str) -> bool {
        self.books.contains_key(product_id)
    }

    /// Number of books under management.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Products with a registered book.
    pub fn products(&self) -> Vec<String> {
        self.books.keys().cloned().collect()
    }

    /// Register a book ahead of its first frame and subscribe its
    /// product on the stream.
    pub fn init_book(&mut self, product_id: &str) {
        if self.books.contains_key(product_id) {
            warn!(product_id, "book already initialized");
            return;
        }
        let book = self.new_book(product_id);
        self.books.insert(product_id.to_string(), book);
        self.subscribe(product_id);
        info!(product_id, "book registered");
    }

    fn new_book(&self, product_id: &str) -> OrderBook {
        match &self.listener {
            Some(listener) => OrderBook::with_listener(product_id, Arc::clone(listener)),
            None => OrderBook::new(product_id),
        }
    }

    /// Send the subscribe frame for one product, signed when
    /// credentials are configured.
    fn subscribe(&self, product_id: &str) {
        let Some(feed) = &self.feed else {
            debug!(product_id, "no feed attached, subscribe skipped");
            return;
        };
        let products = vec![product_id.to_string()];
        let frame = match &self.credentials {
            Some(credentials) => match credentials.subscribe_frame(&products) {
                Ok(frame) => frame,
                Err(error) => {
                    error!(%error, product_id, "could not sign subscribe frame");
                    return;
                }
            },
            None => public_subscribe_frame(&products),
        };
        if !feed.send(frame) {
            warn!(product_id, "feed handle closed, subscribe dropped");
        }
    }

    /// Consume the input queue until it closes.
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<CoreInput>) {
        while let Some(input) = inputs.recv().await {
            self.handle_input(input);
        }
        info!("core task input queue closed");
    }

    /// Apply one queue input. Synchronous: one input completes before
    /// the next is dequeued.
    pub fn handle_input(&mut self, input: CoreInput) {
        match input {
            CoreInput::Frame(text) => self.on_frame(&text),
            CoreInput::Snapshot {
                product_id,
                generation,
                result,
            } => self.on_snapshot(&product_id, generation, result),
            CoreInput::Reset => self.reset_all(),
        }
    }

    fn on_frame(&mut self, text: &str) {
        let message = match decode_frame(text) {
            Ok(Frame::Message(message)) => message,
            Ok(Frame::Heartbeat) => return,
            Err(error) => {
                warn!(%error, "dropping undecodable frame");
                return;
            }
        };
        if matches!(message, FeedMessage::Unknown) {
            return;
        }
        let Some(product_id) = message.product_id().map(str::to_string) else {
            return;
        };
        if !self.books.contains_key(&product_id) {
            if self.strict {
                warn!(product_id = %product_id, "frame for unregistered product dropped");
                return;
            }
            let book = self.new_book(&product_id);
            self.books.insert(product_id.clone(), book);
            info!(product_id = %product_id, "book created on first frame");
        }

        let needs_snapshot = self
            .books
            .get(&product_id)
            .is_some_and(|book| book.mode() == BookMode::Fresh);
        if needs_snapshot {
            self.start_reconciliation(&product_id);
        }

        let Some(book) = self.books.get_mut(&product_id) else {
            return;
        };
        match book.on_message(message) {
            Ok(_) => {}
            Err(error @ BookError::MissingSequences { .. }) => {
                error!(%error, "sequence gap on live book");
                self.restart_reconciliation(&product_id);
            }
            Err(error) => error!(%error, "book rejected frame"),
        }
    }

    fn on_snapshot(
        &mut self,
        product_id: &str,
        generation: u64,
        result: Result<BookSnapshot, FeedError>,
    ) {
        let Some(book) = self.books.get_mut(product_id) else {
            debug!(product_id, "snapshot for unknown book discarded");
            return;
        };
        if book.mode() == BookMode::Failed {
            return;
        }
        if generation != book.generation() {
            debug!(
                product_id,
                generation,
                current = book.generation(),
                "stale snapshot discarded"
            );
            return;
        }
        match result {
            Ok(snapshot) => match book.complete_snapshot(generation, snapshot) {
                Ok(()) => {}
                Err(error @ BookError::MissingSequences { .. }) => {
                    error!(%error, "replay after snapshot gapped");
                    self.restart_reconciliation(product_id);
                }
                Err(error) => debug!(%error, "snapshot completion discarded"),
            },
            Err(error) => {
                error!(%error, product_id, "snapshot fetch failed");
                self.retry_fetch(product_id);
            }
        }
    }

    /// First fetch of a reconciliation: new generation, cleared buffer.
    fn start_reconciliation(&mut self, product_id: &str) {
        let Some(book) = self.books.get_mut(product_id) else {
            return;
        };
        let generation = book.begin_reconciliation();
        let attempt = book.reconcile_attempts();
        reconcile::spawn_snapshot_fetch(
            Arc::clone(&self.source),
            product_id.to_string(),
            generation,
            attempt,
            self.core_tx.clone(),
        );
    }

    /// Re-fetch under the same generation after a failed fetch; the
    /// buffer keeps accumulating.
    fn retry_fetch(&mut self, product_id: &str) {
        let Some(attempt) = self.note_failure(product_id) else {
            return;
        };
        let Some(book) = self.books.get(product_id) else {
            return;
        };
        reconcile::spawn_snapshot_fetch(
            Arc::clone(&self.source),
            product_id.to_string(),
            book.generation(),
            attempt,
            self.core_tx.clone(),
        );
    }

    /// Restart reconciliation from scratch after a sequence gap.
    fn restart_reconciliation(&mut self, product_id: &str) {
        if self.note_failure(product_id).is_some() {
            self.start_reconciliation(product_id);
        }
    }

    /// Record a reconciliation failure. Returns the attempt count for
    /// the next try, or `None` when the book was parked.
    fn note_failure(&mut self, product_id: &str) -> Option<u32> {
        let book = self.books.get_mut(product_id)?;
        let attempts = book.note_reconcile_failure();
        if attempts >= MAX_RECONCILE_ATTEMPTS {
            book.park();
            error!(
                product_id,
                attempts, "book parked after repeated reconciliation failures; operator attention required"
            );
            return None;
        }
        Some(attempts)
    }

    fn reset_all(&mut self) {
        warn!("stream reset: re-bootstrapping all books");
        let products = self.products();
        for product_id in products {
            if let Some(book) = self.books.get_mut(&product_id) {
                book.reset();
            }
            self.subscribe(&product_id);
        }
    }
}
