//! Per-book order indices: resting locations and pending orders.
//!
//! The ladder queues own the resting `Order` values; the resting index
//! only records where an id lives so lookups avoid scanning levels. The
//! pending index owns orders the venue has received but not yet opened
//! (market orders never open and stay here until matches drain them).

use super::order::{Order, OrderId, Side};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Where an order id currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLocation {
    /// Resting on a ladder at this price and side.
    Resting {
        /// Price level the order rests at.
        price: Decimal,
        /// Side of the book.
        side: Side,
    },
    /// Received by the venue but not on a ladder.
    Pending,
    /// Unknown to this book.
    Absent,
}

/// The two per-book id indices. Their key sets are disjoint: an id moves
/// from pending to resting at `open`, and leaves whichever map holds it
/// at `done`.
#[derive(Debug, Default)]
pub(super) struct OrderIndex {
    pub(super) resting: HashMap<OrderId, (Decimal, Side)>,
    pub(super) pending: HashMap<OrderId, Order>,
}

impl OrderIndex {
    /// Record a resting order's location.
    pub(super) fn insert_resting(&mut self, order_id: OrderId, price: Decimal, side: Side) {
        debug_assert!(
            !self.pending.contains_key(&order_id),
            "id {order_id} resting while pending"
        );
        self.resting.insert(order_id, (price, side));
    }

    /// Forget a resting order's location.
    pub(super) fn remove_resting(&mut self, order_id: &str) -> Option<(Decimal, Side)> {
        self.resting.remove(order_id)
    }

    /// Location of a resting order, if any.
    pub(super) fn resting_location(&self, order_id: &str) -> Option<(Decimal, Side)> {
        self.resting.get(order_id).copied()
    }

    /// Track a received-but-not-opened order.
    pub(super) fn insert_pending(&mut self, order: Order) {
        debug_assert!(
            !self.resting.contains_key(&order.order_id),
            "id {} pending while resting",
            order.order_id
        );
        self.pending.insert(order.order_id.clone(), order);
    }

    /// Remove and return a pending order.
    pub(super) fn remove_pending(&mut self, order_id: &str) -> Option<Order> {
        self.pending.remove(order_id)
    }

    /// Read-only reference to a pending order.
    pub(super) fn pending(&self, order_id: &str) -> Option<&Order> {
        self.pending.get(order_id)
    }

    /// Mutable reference to a pending order.
    pub(super) fn pending_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.pending.get_mut(order_id)
    }

    /// Classify an id across both maps.
    pub(super) fn get_any(&self, order_id: &str) -> OrderLocation {
        if let Some((price, side)) = self.resting_location(order_id) {
            return OrderLocation::Resting { price, side };
        }
        if self.pending.contains_key(order_id) {
            return OrderLocation::Pending;
        }
        OrderLocation::Absent
    }

    /// Number of resting ids.
    pub(super) fn resting_len(&self) -> usize {
        self.resting.len()
    }

    /// Number of pending ids.
    pub(super) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every resting location (snapshot application).
    pub(super) fn clear_resting(&mut self) {
        self.resting.clear();
    }

    /// Drop every pending order (full reset).
    pub(super) fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
