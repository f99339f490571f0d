//! Core book state machine: ladders, indices, sequence discipline, and
//! reconciliation state for one product.

use super::error::BookError;
use super::index::{OrderIndex, OrderLocation};
use super::ladder::PriceLadder;
use super::listener::SharedBookListener;
use super::order::{Order, Side};
use super::snapshot::BookSnapshot;
use crate::feed::message::FeedMessage;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Cap on frames buffered while a snapshot is in flight. When the cap
/// is hit the oldest frame is dropped; any resulting gap is caught by
/// drain-time sequence discipline and restarts reconciliation.
pub const REPLAY_BUFFER_LIMIT: usize = 16_384;

/// Reconciliation state of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookMode {
    /// No snapshot requested yet; frames are buffered.
    Fresh,
    /// Snapshot request in flight; frames are buffered.
    AwaitingSnapshot,
    /// Snapshot applied and buffer drained; frames apply directly.
    Live,
    /// Parked after exhausting reconciliation retries; frames dropped.
    Failed,
}

/// What happened to one frame offered to a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event mutated the book and advanced the cursor.
    Event,
    /// `seq <= last_seq`: overlap with the snapshot, discarded.
    Overlap,
    /// Buffered while a snapshot is pending.
    Buffered,
    /// Unknown event type, or a frame for a parked book.
    Skipped,
}

/// One product's level-3 book.
///
/// Owned and mutated by a single task; inputs must be serialized. The
/// ladders own the resting orders, the index maps ids to their ladder
/// location or to the pending table, and `last_seq` enforces strict
/// per-product ordering with at-most-once application.
pub struct OrderBook {
    product_id: String,
    pub(super) bids: PriceLadder,
    pub(super) asks: PriceLadder,
    pub(super) index: OrderIndex,
    last_seq: i64,
    mode: BookMode,
    generation: u64,
    reconcile_attempts: u32,
    replay_buffer: VecDeque<FeedMessage>,
    /// Observer hooks; `None` disables fan-out.
    pub listener: Option<SharedBookListener>,
}

impl OrderBook {
    /// Create a fresh book for one product.
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            bids: PriceLadder::new(Side::Buy),
            asks: PriceLadder::new(Side::Sell),
            index: OrderIndex::default(),
            last_seq: -1,
            mode: BookMode::Fresh,
            generation: 0,
            reconcile_attempts: 0,
            replay_buffer: VecDeque::new(),
            listener: None,
        }
    }

    /// Create a fresh book with an observer attached.
    pub fn with_listener(product_id: impl Into<String>, listener: SharedBookListener) -> Self {
        let mut book = Self::new(product_id);
        book.listener = Some(listener);
        book
    }

    /// The product this book mirrors.
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Current reconciliation state.
    pub fn mode(&self) -> BookMode {
        self.mode
    }

    /// Sequence of the last applied event, `-1` before any snapshot.
    pub fn last_seq(&self) -> i64 {
        self.last_seq
    }

    /// Current reconciliation generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Failed reconciliation attempts since the book last went live.
    pub fn reconcile_attempts(&self) -> u32 {
        self.reconcile_attempts
    }

    /// Frames currently waiting for a snapshot.
    pub fn buffered_len(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Offer one decoded frame to the book, honoring its mode.
    pub fn on_message(&mut self, message: FeedMessage) -> Result<Applied, BookError> {
        match self.mode {
            BookMode::Live => self.update(&message),
            BookMode::Fresh | BookMode::AwaitingSnapshot => {
                self.buffer(message);
                Ok(Applied::Buffered)
            }
            BookMode::Failed => {
                debug!(product_id = %self.product_id, "dropping frame for parked book");
                Ok(Applied::Skipped)
            }
        }
    }

    fn buffer(&mut self, message: FeedMessage) {
        if self.replay_buffer.len() >= REPLAY_BUFFER_LIMIT {
            warn!(
                product_id = %self.product_id,
                "replay buffer full, dropping oldest buffered frame"
            );
            self.replay_buffer.pop_front();
        }
        self.replay_buffer.push_back(message);
    }

    /// Begin (or restart) reconciliation. Clears any stale buffer,
    /// advances the generation so in-flight snapshot completions are
    /// discarded, and returns the new generation for the fetch task.
    pub fn begin_reconciliation(&mut self) -> u64 {
        self.mode = BookMode::AwaitingSnapshot;
        self.replay_buffer.clear();
        self.generation += 1;
        debug!(
            product_id = %self.product_id,
            generation = self.generation,
            "awaiting level-3 snapshot"
        );
        self.generation
    }

    /// Apply a snapshot completion, then drain the replay buffer through
    /// the live path (overlapping sequences discard themselves). A gap
    /// during the drain leaves the book invalid and surfaces the error
    /// so the caller can restart reconciliation.
    pub fn complete_snapshot(
        &mut self,
        generation: u64,
        snapshot: BookSnapshot,
    ) -> Result<(), BookError> {
        if generation != self.generation {
            return Err(BookError::SnapshotStale {
                product_id: self.product_id.clone(),
                generation,
                current: self.generation,
            });
        }
        self.apply_snapshot(&snapshot);
        while let Some(message) = self.replay_buffer.pop_front() {
            self.update(&message)?;
        }
        self.mode = BookMode::Live;
        self.reconcile_attempts = 0;
        info!(
            product_id = %self.product_id,
            sequence = self.last_seq,
            "book live"
        );
        Ok(())
    }

    /// Reset ladders and the resting index to the snapshot contents and
    /// adopt its sequence. Pending orders survive; the subsequent replay
    /// reconciles them.
    pub fn apply_snapshot(&mut self, snapshot: &BookSnapshot) {
        info!(
            product_id = %self.product_id,
            sequence = snapshot.sequence,
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            "applying level-3 snapshot"
        );
        self.bids.clear();
        self.asks.clear();
        self.index.clear_resting();
        for entry in &snapshot.bids {
            let order = entry
                .clone()
                .into_order(&self.product_id, snapshot.sequence, Side::Buy);
            self.add_order(order, None);
        }
        for entry in &snapshot.asks {
            let order = entry
                .clone()
                .into_order(&self.product_id, snapshot.sequence, Side::Sell);
            self.add_order(order, None);
        }
        self.last_seq = snapshot.sequence as i64;
    }

    /// Full re-bootstrap (stream reconnect): forget everything, return
    /// to `Fresh`, and invalidate in-flight snapshot fetches.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.index.clear_resting();
        self.index.clear_pending();
        self.replay_buffer.clear();
        self.last_seq = -1;
        self.generation += 1;
        self.reconcile_attempts = 0;
        self.mode = BookMode::Fresh;
    }

    /// Apply one event under sequence discipline: overlaps discard, the
    /// successor applies, anything further is a gap that invalidates the
    /// book until re-bootstrap.
    pub fn update(&mut self, message: &FeedMessage) -> Result<Applied, BookError> {
        let Some(sequence) = message.sequence() else {
            return Ok(Applied::Skipped);
        };
        let sequence = sequence as i64;
        if sequence <= self.last_seq {
            return Ok(Applied::Overlap);
        }
        if sequence > self.last_seq + 1 {
            self.mode = BookMode::Fresh;
            return Err(BookError::MissingSequences {
                product_id: self.product_id.clone(),
                expected: self.last_seq + 1,
                got: sequence,
            });
        }
        match message {
            FeedMessage::Received(m) => self.receive_order(m),
            FeedMessage::Open(m) => self.open_order(m),
            FeedMessage::Done(m) => self.remove_order(m),
            FeedMessage::Match(m) => self.match_order(m),
            FeedMessage::Change(m) => self.change_order(m),
            FeedMessage::Unknown => return Ok(Applied::Skipped),
        }
        self.last_seq = sequence;
        Ok(Applied::Event)
    }

    /// Best bid price, if any.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.best()
    }

    /// Best ask price, if any.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.best()
    }

    /// Best ask minus best bid, when both sides are populated.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Midpoint of the best bid and ask, when both sides are populated.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Classify an order id across the resting and pending indices.
    pub fn get_any(&self, order_id: &str) -> OrderLocation {
        self.index.get_any(order_id)
    }

    /// Read-only reference to a resting order.
    pub fn resting_order(&self, order_id: &str) -> Option<&Order> {
        let (price, side) = self.index.resting_location(order_id)?;
        self.ladder(side).order(price, order_id)
    }

    /// Read-only reference to a pending order.
    pub fn pending_order(&self, order_id: &str) -> Option<&Order> {
        self.index.pending(order_id)
    }

    /// Number of resting orders.
    pub fn resting_count(&self) -> usize {
        self.index.resting_len()
    }

    /// Number of pending orders.
    pub fn pending_count(&self) -> usize {
        self.index.pending_len()
    }

    /// Read-only view of one price level.
    pub fn level(&self, side: Side, price: Decimal) -> Option<&VecDeque<Order>> {
        self.ladder(side).level(price)
    }

    pub(super) fn ladder(&self, side: Side) -> &PriceLadder {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(super) fn ladder_mut(&mut self, side: Side) -> &mut PriceLadder {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    pub(super) fn note_reconcile_failure(&mut self) -> u32 {
        self.reconcile_attempts += 1;
        self.reconcile_attempts
    }

    pub(super) fn park(&mut self) {
        self.mode = BookMode::Failed;
    }
}
