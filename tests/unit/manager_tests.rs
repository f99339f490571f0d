//! Manager-level reconciliation flows: lazy creation, retry, parking,
//! and stale-generation handling.

use crate::helpers::*;
use booksync_rs::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Pump queue inputs into the manager until the book reaches `mode` or
/// the step budget runs out.
async fn pump_until(
    manager: &mut BookManager,
    inputs: &mut UnboundedReceiver<CoreInput>,
    product_id: &str,
    mode: BookMode,
) {
    for _ in 0..64 {
        if manager.book(product_id).map(|b| b.mode()) == Some(mode) {
            return;
        }
        let input = inputs.recv().await.expect("core queue open");
        manager.handle_input(input);
    }
    panic!(
        "book never reached {mode:?}, currently {:?}",
        manager.book(product_id).map(|b| b.mode())
    );
}

#[tokio::test]
async fn test_first_frame_bootstraps_book_to_live() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot(
        100,
        &[("10.00", "2.0", "B")],
        &[],
    ))]));
    let (mut manager, mut inputs) = BookManager::new(source.clone());

    manager.handle_input(CoreInput::Frame(received_frame(
        101, "A", "buy", "9.50", "1.0",
    )));
    let book = manager.book(PRODUCT).expect("book lazily created");
    assert_eq!(book.mode(), BookMode::AwaitingSnapshot);

    pump_until(&mut manager, &mut inputs, PRODUCT, BookMode::Live).await;

    let book = manager.book(PRODUCT).unwrap();
    assert_eq!(book.last_seq(), 101);
    assert_eq!(book.best_bid(), Some("10.00".parse().unwrap()));
    assert_eq!(book.pending_order("A").map(|o| o.sequence), Some(101));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_strict_mode_drops_unregistered_products() {
    let source = Arc::new(ScriptedSource::new(vec![]));
    let (mut manager, _inputs) = BookManager::new(source);
    manager.set_strict(true);

    manager.handle_input(CoreInput::Frame(received_frame(
        101, "A", "buy", "9.50", "1.0",
    )));
    assert!(!manager.has_book(PRODUCT));
    assert_eq!(manager.book_count(), 0);
}

#[tokio::test]
async fn test_undecodable_and_unknown_frames_are_dropped() {
    let source = Arc::new(ScriptedSource::new(vec![]));
    let (mut manager, _inputs) = BookManager::new(source);

    manager.handle_input(CoreInput::Frame("{broken".to_string()));
    manager.handle_input(CoreInput::Frame(
        r#"{"type":"activate","product_id":"BTC-USD","sequence":7}"#.to_string(),
    ));
    manager.handle_input(CoreInput::Frame("HEARTBEAT".to_string()));

    assert_eq!(manager.book_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_retries_with_backoff_until_live() {
    let source = Arc::new(ScriptedSource::new(vec![
        Err(FeedError::Status { status: 500 }),
        Err(FeedError::Timeout { seconds: 10 }),
        Ok(snapshot(100, &[], &[])),
    ]));
    let (mut manager, mut inputs) = BookManager::new(source.clone());

    manager.handle_input(CoreInput::Frame(received_frame(
        101, "A", "buy", "9.50", "1.0",
    )));
    pump_until(&mut manager, &mut inputs, PRODUCT, BookMode::Live).await;

    assert_eq!(source.calls(), 3);
    assert_eq!(manager.book(PRODUCT).unwrap().last_seq(), 101);
    // Going live resets the failure budget.
    assert_eq!(manager.book(PRODUCT).unwrap().reconcile_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_book_parks_after_exhausted_retries() {
    let source = Arc::new(ScriptedSource::always_failing());
    let (mut manager, mut inputs) = BookManager::new(source.clone());

    manager.handle_input(CoreInput::Frame(received_frame(
        101, "A", "buy", "9.50", "1.0",
    )));
    pump_until(&mut manager, &mut inputs, PRODUCT, BookMode::Failed).await;

    assert_eq!(source.calls(), MAX_RECONCILE_ATTEMPTS);
    // Frames for a parked book are dropped without effect.
    manager.handle_input(CoreInput::Frame(received_frame(
        102, "B", "buy", "9.40", "1.0",
    )));
    assert_eq!(manager.book(PRODUCT).unwrap().mode(), BookMode::Failed);
    assert_eq!(manager.book(PRODUCT).unwrap().last_seq(), -1);
}

#[tokio::test(start_paused = true)]
async fn test_live_gap_triggers_fresh_reconciliation() {
    let source = Arc::new(ScriptedSource::new(vec![
        Ok(snapshot(100, &[], &[])),
        Ok(snapshot(200, &[("10.00", "1.0", "C")], &[])),
    ]));
    let (mut manager, mut inputs) = BookManager::new(source.clone());

    manager.handle_input(CoreInput::Frame(open_frame(101, "A", "buy", "9.50", "1.0")));
    pump_until(&mut manager, &mut inputs, PRODUCT, BookMode::Live).await;
    assert_eq!(manager.book(PRODUCT).unwrap().last_seq(), 101);

    // 103 gaps over 102: the book re-bootstraps from a new snapshot.
    manager.handle_input(CoreInput::Frame(open_frame(103, "B", "buy", "9.60", "1.0")));
    assert_ne!(manager.book(PRODUCT).unwrap().mode(), BookMode::Live);

    pump_until(&mut manager, &mut inputs, PRODUCT, BookMode::Live).await;
    let book = manager.book(PRODUCT).unwrap();
    assert_eq!(book.last_seq(), 200);
    assert_eq!(book.best_bid(), Some("10.00".parse().unwrap()));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_reset_discards_inflight_snapshot() {
    let source = Arc::new(ScriptedSource::new(vec![
        Ok(snapshot(100, &[("10.00", "1.0", "B")], &[])),
    ]));
    let (mut manager, mut inputs) = BookManager::new(source);

    manager.handle_input(CoreInput::Frame(received_frame(
        101, "A", "buy", "9.50", "1.0",
    )));
    // The stream drops before the snapshot completion is consumed.
    manager.handle_input(CoreInput::Reset);

    let completion = inputs.recv().await.expect("fetch completion");
    manager.handle_input(completion);

    // The stale completion was discarded: still fresh, nothing applied.
    let book = manager.book(PRODUCT).unwrap();
    assert_eq!(book.mode(), BookMode::Fresh);
    assert_eq!(book.last_seq(), -1);
    assert_eq!(book.resting_count(), 0);
}

#[tokio::test]
async fn test_init_book_registers_ahead_of_frames() {
    let source = Arc::new(ScriptedSource::new(vec![]));
    let (mut manager, _inputs) = BookManager::new(source);

    manager.init_book(PRODUCT);
    assert!(manager.has_book(PRODUCT));
    assert_eq!(manager.book(PRODUCT).unwrap().mode(), BookMode::Fresh);
    assert_eq!(manager.products(), vec![PRODUCT.to_string()]);

    // Re-registration is a no-op.
    manager.init_book(PRODUCT);
    assert_eq!(manager.book_count(), 1);
}

#[tokio::test]
async fn test_frames_route_by_product() {
    let source = Arc::new(
        ScriptedSource::new(vec![])
            .with_product(PRODUCT, vec![Ok(snapshot(100, &[], &[]))])
            .with_product("ETH-USD", vec![Ok(snapshot(500, &[], &[]))]),
    );
    let (mut manager, mut inputs) = BookManager::new(source);

    manager.handle_input(CoreInput::Frame(received_frame(
        101, "A", "buy", "9.50", "1.0",
    )));
    let other = serde_json::json!({
        "type": "received",
        "product_id": "ETH-USD",
        "sequence": 501,
        "time": TIME,
        "order_id": "E",
        "order_type": "limit",
        "side": "sell",
        "price": "200.00",
        "size": "1.0",
    })
    .to_string();
    manager.handle_input(CoreInput::Frame(other));
    assert_eq!(manager.book_count(), 2);

    pump_until(&mut manager, &mut inputs, PRODUCT, BookMode::Live).await;
    pump_until(&mut manager, &mut inputs, "ETH-USD", BookMode::Live).await;

    assert_eq!(manager.book(PRODUCT).unwrap().last_seq(), 101);
    assert_eq!(manager.book("ETH-USD").unwrap().last_seq(), 501);
}
