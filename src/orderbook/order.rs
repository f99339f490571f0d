//! Order model shared by the ladders and indices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Venue-assigned order identifier. Opaque, globally unique within a product.
pub type OrderId = String;

/// Side of the book an order rests on (or would rest on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy orders; the bid ladder, best price is the maximum.
    Buy,
    /// Sell orders; the ask ladder, best price is the minimum.
    Sell,
}

impl Side {
    /// The opposite side of the book.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Venue order type as reported on `received` events.
///
/// Market orders never rest on a ladder; they live in the pending index
/// until a `match`/`done` chain drains them. Anything the venue adds
/// beyond limit and market decodes as `Other` and is treated like a
/// limit order wherever a price is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Limit,
    Market,
    #[serde(other)]
    Other,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "limit"),
            OrderKind::Market => write!(f, "market"),
            OrderKind::Other => write!(f, "other"),
        }
    }
}

/// One venue order as mirrored by the book.
///
/// `time` is absent until the first confirmed receipt (snapshot rows
/// carry no timestamp). `price` is absent for market orders. A `size`
/// of zero encodes an untracked size (funds-only market orders), which
/// is drained eagerly on the first match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    /// Venue ingest timestamp, if known.
    pub time: Option<DateTime<Utc>>,
    /// Sequence of the event that produced this state of the order.
    pub sequence: u64,
    /// Product this order belongs to.
    pub product_id: String,
    /// Venue order identifier.
    pub order_id: OrderId,
    /// Venue order type.
    pub kind: OrderKind,
    /// Side of the book.
    pub side: Side,
    /// Limit price; `None` for market orders.
    pub price: Option<Decimal>,
    /// Remaining size. Never negative; zero means untracked.
    pub size: Decimal,
    /// Quote-currency budget for market orders.
    pub funds: Option<Decimal>,
}

impl Order {
    /// Price × size, when the order has a price.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.map(|price| price * self.size)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.side == Side::Buy { '+' } else { '-' };
        match self.price {
            Some(price) => write!(
                f,
                "Order {} {} {}{}@{} id={}",
                self.product_id, self.kind, sign, self.size, price, self.order_id
            ),
            None => write!(
                f,
                "Order {} {} {}{} funds={} id={}",
                self.product_id,
                self.kind,
                sign,
                self.size,
                self.funds.unwrap_or(Decimal::ZERO),
                self.order_id
            ),
        }
    }
}
