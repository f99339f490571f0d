//! Wire frame decoding for the venue's full (level-3) feed.
//!
//! Numeric fields arrive as JSON strings and decode straight into
//! `Decimal`; timestamps are ISO-8601 with a microsecond fraction and
//! decode into `DateTime<Utc>`. Optional fields stay absent rather than
//! defaulting, so downstream code can tell "missing" from "zero".

use crate::feed::error::FeedError;
use crate::orderbook::{OrderId, OrderKind, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;

/// Raw liveness frame sent by the venue; never JSON.
pub const HEARTBEAT_FRAME: &str = "HEARTBEAT";

/// `received`: the venue accepted an order into its queue.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedMessage {
    pub product_id: String,
    pub sequence: u64,
    pub time: DateTime<Utc>,
    pub order_id: OrderId,
    pub order_type: OrderKind,
    pub side: Side,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub funds: Option<Decimal>,
}

/// `open`: a limit order rested on the book.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenMessage {
    pub product_id: String,
    pub sequence: u64,
    pub time: DateTime<Utc>,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub remaining_size: Decimal,
}

/// Why an order finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoneReason {
    Filled,
    Canceled,
    #[serde(other)]
    Other,
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoneReason::Filled => write!(f, "filled"),
            DoneReason::Canceled => write!(f, "canceled"),
            DoneReason::Other => write!(f, "other"),
        }
    }
}

/// `done`: an order left the venue's book or queue. Market takers carry
/// no `price` (and usually no `remaining_size`).
#[derive(Debug, Clone, Deserialize)]
pub struct DoneMessage {
    pub product_id: String,
    pub sequence: u64,
    pub time: DateTime<Utc>,
    pub order_id: OrderId,
    pub side: Side,
    pub reason: DoneReason,
    #[serde(default)]
    pub remaining_size: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// `match`: a trade between a resting maker and an aggressing taker.
/// `side` is the maker's side.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchMessage {
    pub product_id: String,
    pub sequence: u64,
    pub time: DateTime<Utc>,
    pub trade_id: u64,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
}

/// `change`: a resting order was resized in place (self-trade
/// prevention, order modification).
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeMessage {
    pub product_id: String,
    pub sequence: u64,
    pub time: DateTime<Utc>,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub old_size: Decimal,
    pub new_size: Decimal,
}

/// A decoded stream frame, tagged by the venue's `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    Received(ReceivedMessage),
    Open(OpenMessage),
    Done(DoneMessage),
    Match(MatchMessage),
    Change(ChangeMessage),
    /// Any other `type`. Skipped by the book without advancing the
    /// sequence cursor.
    #[serde(other)]
    Unknown,
}

impl FeedMessage {
    /// Product this frame belongs to; `None` for unknown frame types.
    pub fn product_id(&self) -> Option<&str> {
        match self {
            FeedMessage::Received(m) => Some(&m.product_id),
            FeedMessage::Open(m) => Some(&m.product_id),
            FeedMessage::Done(m) => Some(&m.product_id),
            FeedMessage::Match(m) => Some(&m.product_id),
            FeedMessage::Change(m) => Some(&m.product_id),
            FeedMessage::Unknown => None,
        }
    }

    /// Venue sequence of this frame; `None` for unknown frame types.
    pub fn sequence(&self) -> Option<u64> {
        match self {
            FeedMessage::Received(m) => Some(m.sequence),
            FeedMessage::Open(m) => Some(m.sequence),
            FeedMessage::Done(m) => Some(m.sequence),
            FeedMessage::Match(m) => Some(m.sequence),
            FeedMessage::Change(m) => Some(m.sequence),
            FeedMessage::Unknown => None,
        }
    }
}

/// A frame as delivered by the stream transport.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Raw heartbeat; updates liveness tracking only.
    Heartbeat,
    /// A JSON event frame.
    Message(FeedMessage),
}

/// Decode one raw text frame. The heartbeat short-circuits before any
/// JSON parsing.
pub fn decode_frame(text: &str) -> Result<Frame, FeedError> {
    if text == HEARTBEAT_FRAME {
        return Ok(Frame::Heartbeat);
    }
    let message = serde_json::from_str::<FeedMessage>(text)?;
    Ok(Frame::Message(message))
}
