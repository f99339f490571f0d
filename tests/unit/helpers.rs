//! Shared fixtures: raw frame builders and a scripted snapshot source.

use async_trait::async_trait;
use booksync_rs::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

pub const PRODUCT: &str = "BTC-USD";
pub const TIME: &str = "2014-11-07T08:19:27.028459Z";

pub fn received_frame(sequence: u64, order_id: &str, side: &str, price: &str, size: &str) -> String {
    json!({
        "type": "received",
        "product_id": PRODUCT,
        "sequence": sequence,
        "time": TIME,
        "order_id": order_id,
        "order_type": "limit",
        "side": side,
        "price": price,
        "size": size,
    })
    .to_string()
}

pub fn open_frame(sequence: u64, order_id: &str, side: &str, price: &str, size: &str) -> String {
    json!({
        "type": "open",
        "product_id": PRODUCT,
        "sequence": sequence,
        "time": TIME,
        "order_id": order_id,
        "side": side,
        "price": price,
        "remaining_size": size,
    })
    .to_string()
}

pub fn done_frame(sequence: u64, order_id: &str, side: &str, price: &str, size: &str) -> String {
    json!({
        "type": "done",
        "product_id": PRODUCT,
        "sequence": sequence,
        "time": TIME,
        "order_id": order_id,
        "side": side,
        "reason": "canceled",
        "price": price,
        "remaining_size": size,
    })
    .to_string()
}

/// Decode a raw frame into its typed message, for book-level tests.
pub fn decoded(frame: &str) -> FeedMessage {
    match decode_frame(frame).expect("frame decodes") {
        Frame::Message(message) => message,
        Frame::Heartbeat => panic!("unexpected heartbeat"),
    }
}

pub fn snapshot(sequence: u64, bids: &[(&str, &str, &str)], asks: &[(&str, &str, &str)]) -> BookSnapshot {
    fn entries(rows: &[(&str, &str, &str)]) -> Vec<SnapshotEntry> {
        rows.iter()
            .map(|(price, size, id)| {
                SnapshotEntry(
                    price.parse::<Decimal>().expect("price"),
                    size.parse::<Decimal>().expect("size"),
                    id.to_string(),
                )
            })
            .collect()
    }
    BookSnapshot {
        sequence,
        bids: entries(bids),
        asks: entries(asks),
    }
}

/// Snapshot source that replays a script of responses and counts calls.
/// Product-specific scripts take precedence over the shared script;
/// an exhausted script answers HTTP 500.
pub struct ScriptedSource {
    shared: Mutex<VecDeque<Result<BookSnapshot, FeedError>>>,
    per_product: Mutex<std::collections::HashMap<String, VecDeque<Result<BookSnapshot, FeedError>>>>,
    calls: AtomicU32,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<BookSnapshot, FeedError>>) -> Self {
        Self {
            shared: Mutex::new(responses.into()),
            per_product: Mutex::new(std::collections::HashMap::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Source whose every fetch fails with an HTTP 500.
    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_product(self, product_id: &str, responses: Vec<Result<BookSnapshot, FeedError>>) -> Self {
        self.per_product
            .lock()
            .expect("script lock")
            .insert(product_id.to_string(), responses.into());
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn level3_snapshot(&self, product_id: &str) -> Result<BookSnapshot, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(script) = self.per_product.lock().expect("script lock").get_mut(product_id) {
            return script.pop_front().unwrap_or(Err(FeedError::Status { status: 500 }));
        }
        self.shared
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Err(FeedError::Status { status: 500 }))
    }
}
