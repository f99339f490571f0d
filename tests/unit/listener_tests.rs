//! Observer hook contracts: firing order, payloads, and silence while
//! a snapshot is pending.

use crate::helpers::*;
use booksync_rs::prelude::*;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

/// Listener that records one tag per hook invocation.
#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn push(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl BookListener for RecordingListener {
    fn on_received(&self, order: &Order, message: &ReceivedMessage) {
        self.push(format!("received:{}:{}", order.order_id, message.sequence));
    }

    fn on_add(&self, order: &Order, message: Option<&OpenMessage>) {
        let origin = if message.is_some() { "open" } else { "snapshot" };
        self.push(format!("add:{}:{}", order.order_id, origin));
    }

    fn on_remove(&self, order: &Order, message: &DoneMessage) {
        self.push(format!("remove:{}:{}", order.order_id, message.reason));
    }

    fn on_match(&self, message: &MatchMessage, maker_order: Option<&Order>) {
        self.push(format!(
            "match:{}:{}",
            message.trade_id,
            maker_order.map(|o| o.size.to_string()).unwrap_or_default()
        ));
    }

    fn on_change(&self, order: &Order, old_size: Decimal, new_size: Decimal, _message: &ChangeMessage) {
        self.push(format!("change:{}:{old_size}->{new_size}", order.order_id));
    }
}

fn live_book_with(listener: Arc<RecordingListener>, snap: BookSnapshot) -> OrderBook {
    let mut book = OrderBook::with_listener(PRODUCT, listener);
    let generation = book.begin_reconciliation();
    book.complete_snapshot(generation, snap).expect("goes live");
    book
}

#[test]
fn test_hooks_fire_in_event_order() {
    let listener = Arc::new(RecordingListener::default());
    let mut book = live_book_with(listener.clone(), snapshot(100, &[], &[]));

    book.on_message(decoded(&received_frame(101, "A", "buy", "10.00", "1.0")))
        .unwrap();
    book.on_message(decoded(&open_frame(102, "A", "buy", "10.00", "1.0")))
        .unwrap();
    book.on_message(decoded(&done_frame(103, "A", "buy", "10.00", "1.0")))
        .unwrap();

    assert_eq!(
        listener.events(),
        vec!["received:A:101", "add:A:open", "remove:A:canceled"]
    );
}

#[test]
fn test_hooks_stay_silent_until_snapshot_applied() {
    let listener = Arc::new(RecordingListener::default());
    let mut book = OrderBook::with_listener(PRODUCT, listener.clone());
    let generation = book.begin_reconciliation();

    book.on_message(decoded(&received_frame(101, "A", "buy", "10.00", "1.0")))
        .unwrap();
    book.on_message(decoded(&open_frame(102, "A", "buy", "10.00", "1.0")))
        .unwrap();
    assert!(listener.events().is_empty(), "buffered frames must not fan out");

    book.complete_snapshot(generation, snapshot(100, &[("9.00", "2.0", "S")], &[]))
        .unwrap();

    // Snapshot rows fan out first (no originating message), then the
    // drained replay in venue order.
    assert_eq!(
        listener.events(),
        vec!["add:S:snapshot", "received:A:101", "add:A:open"]
    );
}

#[test]
fn test_on_match_reports_reduced_maker() {
    let listener = Arc::new(RecordingListener::default());
    let mut book = live_book_with(
        listener.clone(),
        snapshot(200, &[("10.00", "2.0", "B")], &[]),
    );

    let frame = serde_json::json!({
        "type": "match",
        "product_id": PRODUCT,
        "sequence": 201,
        "time": TIME,
        "trade_id": 77,
        "maker_order_id": "B",
        "taker_order_id": "T",
        "side": "buy",
        "price": "10.00",
        "size": "0.5",
    })
    .to_string();
    book.on_message(decoded(&frame)).unwrap();

    // Maker still resting, reported with its post-match size.
    assert_eq!(listener.events(), vec!["match:77:1.5"]);
}

#[test]
fn test_overlapping_replay_fires_no_hooks() {
    let listener = Arc::new(RecordingListener::default());
    let mut book = live_book_with(listener.clone(), snapshot(100, &[], &[]));

    book.on_message(decoded(&open_frame(99, "A", "buy", "10.00", "1.0")))
        .unwrap();
    book.on_message(decoded(&open_frame(100, "A", "buy", "10.00", "1.0")))
        .unwrap();

    assert!(listener.events().is_empty());
    assert_eq!(book.last_seq(), 100);
}
