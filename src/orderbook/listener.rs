//! Observer hooks fired by the book state machine.
//!
//! A listener is the observer capability supplied at book construction:
//! one trait object, side-effect-only callbacks. Hooks run synchronously
//! on the task that owns the book, in event order, and must not mutate
//! book state. During reconciliation no hook fires for buffered events
//! until the snapshot has been applied.

use super::order::Order;
use crate::feed::message::{
    ChangeMessage, DoneMessage, MatchMessage, OpenMessage, ReceivedMessage,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared listener handle stored by books.
pub type SharedBookListener = Arc<dyn BookListener>;

/// Callbacks for book mutations. Every method defaults to a no-op, so
/// implementors override only what they observe.
pub trait BookListener: Send + Sync {
    /// The venue received an order; it is now pending.
    fn on_received(&self, order: &Order, message: &ReceivedMessage) {
        let _ = (order, message);
    }

    /// An order was rested on a ladder. `message` is absent when the
    /// order came from a snapshot row rather than an `open` event.
    fn on_add(&self, order: &Order, message: Option<&OpenMessage>) {
        let _ = (order, message);
    }

    /// A resting order left the book. The event carries time, sequence,
    /// remaining size, and the venue's reason.
    fn on_remove(&self, order: &Order, message: &DoneMessage) {
        let _ = (order, message);
    }

    /// A trade printed. `maker_order` is the resting order after the
    /// match when it is still known to the book.
    fn on_match(&self, message: &MatchMessage, maker_order: Option<&Order>) {
        let _ = (message, maker_order);
    }

    /// A resting order was resized in place.
    fn on_change(&self, order: &Order, old_size: Decimal, new_size: Decimal, message: &ChangeMessage) {
        let _ = (order, old_size, new_size, message);
    }
}

/// Listener that logs order flow and flags orders whose notional
/// exceeds a threshold.
pub struct LoggingListener {
    large_threshold: Decimal,
}

impl LoggingListener {
    /// Create a logging listener flagging notionals above `large_threshold`.
    pub fn new(large_threshold: Decimal) -> Self {
        Self { large_threshold }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new(Decimal::from(50_000))
    }
}

impl BookListener for LoggingListener {
    fn on_received(&self, order: &Order, message: &ReceivedMessage) {
        debug!(sequence = message.sequence, order = %order, "received");
    }

    fn on_add(&self, order: &Order, _message: Option<&OpenMessage>) {
        debug!(order = %order, "added");
        if let Some(notional) = order.notional() {
            if notional > self.large_threshold {
                info!(product_id = %order.product_id, order = %order, %notional, "large order added");
            }
        }
    }

    fn on_remove(&self, order: &Order, message: &DoneMessage) {
        debug!(order = %order, reason = %message.reason, "removed");
        if let (Some(price), Some(remaining)) = (order.price, message.remaining_size) {
            if price * remaining > self.large_threshold {
                info!(product_id = %order.product_id, order = %order, "large order removed");
            }
        }
    }

    fn on_match(&self, message: &MatchMessage, maker_order: Option<&Order>) {
        info!(
            product_id = %message.product_id,
            price = %message.price,
            size = %message.size,
            trade_id = message.trade_id,
            maker = %message.maker_order_id,
            taker = %message.taker_order_id,
            maker_resting = maker_order.is_some(),
            "trade"
        );
    }

    fn on_change(&self, order: &Order, old_size: Decimal, new_size: Decimal, _message: &ChangeMessage) {
        debug!(order_id = %order.order_id, %old_size, %new_size, "size changed");
    }
}
