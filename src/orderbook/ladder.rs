//! Sorted price ladder holding a FIFO queue of resting orders per level.

use super::order::{Order, OrderId, Side};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};

/// Outcome of [`PriceLadder::match_head`].
#[derive(Debug)]
pub enum MatchHead {
    /// The head order was reduced in place; carries its remaining size.
    Reduced(Decimal),
    /// The head order was fully consumed and popped off its level.
    /// The level itself is evicted when the pop empties it.
    Filled(Order),
    /// The head of the level is not the expected maker.
    HeadMismatch {
        /// Identifier of the order actually at the head.
        head_id: OrderId,
    },
    /// No level exists at the given price.
    LevelMissing,
}

/// One side of the book: an ordered map price → FIFO queue of orders.
///
/// Queue order reflects venue time priority at that level. Empty queues
/// are never kept; the level key is dropped when its last order leaves.
#[derive(Debug)]
pub struct PriceLadder {
    side: Side,
    levels: BTreeMap<Decimal, VecDeque<Order>>,
}

impl PriceLadder {
    /// Create an empty ladder for one side of the book.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// The side this ladder holds.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Append an order to the tail of the queue at `price`, creating the
    /// level if absent.
    pub fn insert_tail(&mut self, price: Decimal, order: Order) {
        self.levels.entry(price).or_default().push_back(order);
    }

    /// Remove the first order with `order_id` from the queue at `price`.
    ///
    /// Linear in the level depth, which is bounded in practice; removal
    /// by id is rare relative to head-match removal.
    pub fn remove_by_id(&mut self, price: Decimal, order_id: &str) -> Option<Order> {
        let queue = self.levels.get_mut(&price)?;
        let position = queue.iter().position(|order| order.order_id == order_id)?;
        let removed = queue.remove(position);
        if queue.is_empty() {
            self.levels.remove(&price);
        }
        removed
    }

    /// Decrement the head order at `price` by `size`.
    ///
    /// The head must be the expected maker; a mismatch leaves the level
    /// untouched so the caller can log and decide. A decrement to zero
    /// (or below, for malformed input the caller clamps) pops the head.
    pub fn match_head(&mut self, price: Decimal, maker_id: &str, size: Decimal) -> MatchHead {
        let Some(queue) = self.levels.get_mut(&price) else {
            return MatchHead::LevelMissing;
        };
        let Some(head) = queue.front_mut() else {
            // Invariant: queues are never empty. Repair and report.
            self.levels.remove(&price);
            return MatchHead::LevelMissing;
        };
        if head.order_id != maker_id {
            return MatchHead::HeadMismatch {
                head_id: head.order_id.clone(),
            };
        }
        if head.size > size {
            head.size -= size;
            return MatchHead::Reduced(head.size);
        }
        let Some(order) = queue.pop_front() else {
            return MatchHead::LevelMissing;
        };
        if queue.is_empty() {
            self.levels.remove(&price);
        }
        MatchHead::Filled(order)
    }

    /// Best price on this side: maximum for bids, minimum for asks.
    pub fn best(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Read-only view of the queue at `price`.
    pub fn level(&self, price: Decimal) -> Option<&VecDeque<Order>> {
        self.levels.get(&price)
    }

    /// Read-only reference to one resting order.
    pub fn order(&self, price: Decimal, order_id: &str) -> Option<&Order> {
        self.levels
            .get(&price)?
            .iter()
            .find(|order| order.order_id == order_id)
    }

    /// Mutable reference to one resting order.
    pub fn order_mut(&mut self, price: Decimal, order_id: &str) -> Option<&mut Order> {
        self.levels
            .get_mut(&price)?
            .iter_mut()
            .find(|order| order.order_id == order_id)
    }

    /// Number of populated price levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total number of resting orders across all levels.
    pub fn order_count(&self) -> usize {
        self.levels.values().map(VecDeque::len).sum()
    }

    /// True when no level is populated.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Drop every level.
    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Iterate levels in ascending price order.
    pub fn iter(&self) -> impl Iterator<Item = (&Decimal, &VecDeque<Order>)> {
        self.levels.iter()
    }
}
