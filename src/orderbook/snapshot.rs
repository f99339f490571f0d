//! Level-3 snapshot wire model.

use super::order::{Order, OrderId, OrderKind, Side};
use rust_decimal::Decimal;
use serde::Deserialize;

/// One `[price, size, order_id]` row of a level-3 snapshot. Prices and
/// sizes arrive as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotEntry(pub Decimal, pub Decimal, pub OrderId);

impl SnapshotEntry {
    /// Row price.
    pub fn price(&self) -> Decimal {
        self.0
    }

    /// Row size.
    pub fn size(&self) -> Decimal {
        self.1
    }

    /// Row order id.
    pub fn order_id(&self) -> &str {
        &self.2
    }

    /// Build the resting limit order this row describes. Snapshot rows
    /// carry no timestamp; the order adopts the snapshot sequence.
    pub fn into_order(self, product_id: &str, sequence: u64, side: Side) -> Order {
        Order {
            time: None,
            sequence,
            product_id: product_id.to_string(),
            order_id: self.2,
            kind: OrderKind::Limit,
            side,
            price: Some(self.0),
            size: self.1,
            funds: None,
        }
    }
}

/// A venue level-3 book snapshot at a known sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct BookSnapshot {
    /// Sequence the snapshot was taken at.
    pub sequence: u64,
    /// Bid rows, best first as served by the venue.
    pub bids: Vec<SnapshotEntry>,
    /// Ask rows, best first as served by the venue.
    pub asks: Vec<SnapshotEntry>,
}

impl BookSnapshot {
    /// An empty book at `sequence`.
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }
}
