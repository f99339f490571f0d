//! # Level-3 Order-Book Synchronization Engine
//!
//! A real-time maintainer of per-order (level-3) limit order books for
//! venues that publish mutation events over a websocket full feed and
//! serve point-in-time snapshots over REST. The crate does not match
//! orders; it mirrors the venue's book exactly, one event at a time.
//!
//! ## Key Pieces
//!
//! - **Price ladders**: per-side sorted maps from price to a FIFO queue
//!   of resting orders, mirroring venue time priority at each level.
//!   Empty levels are never kept.
//!
//! - **Order indices**: a resting-location index for orders on a ladder
//!   and a pending table for orders the venue has received but not yet
//!   opened. Market orders live only in the pending table and are
//!   drained by matches.
//!
//! - **Sequence discipline**: every book tracks the venue's per-product
//!   sequence. Overlapping events are discarded, the successor applies,
//!   and a gap invalidates the book until a fresh snapshot is applied.
//!
//! - **Snapshot reconciliation**: on the first frame for a product the
//!   manager fetches a level-3 snapshot while buffering the stream,
//!   then splices the two by replaying the buffer through the same
//!   sequence filter. Fetches are bounded by a timeout and retried with
//!   exponential backoff; hopeless books are parked with an alert.
//!
//! - **Observer hooks**: a [`BookListener`] supplied at construction
//!   receives `received`/`add`/`remove`/`match`/`change` callbacks,
//!   synchronously and in venue order.
//!
//! ## Concurrency Model
//!
//! One core task owns every book. Stream frames and snapshot
//! completions funnel into a single queue ([`CoreInput`]) and are
//! applied serially; the websocket client and fetch tasks never touch
//! book state. No locks guard the books because nothing shares them.
//!
//! ## Wiring Example
//!
//! ```no_run
//! use booksync_rs::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let rest = Arc::new(RestClient::public());
//!     let (mut manager, inputs) = BookManager::new(rest);
//!     manager.set_listener(Arc::new(LoggingListener::default()));
//!
//!     let (client, feed) = FeedClient::new("wss://ws-feed.example.com", manager.sender());
//!     manager.attach_feed(feed);
//!     manager.init_book("BTC-USD");
//!
//!     tokio::spawn(client.run());
//!     manager.run(inputs).await;
//! }
//! ```
//!
//! ## Exactness
//!
//! Prices, sizes, and funds are `rust_decimal::Decimal` end to end.
//! Binary floating point never touches book state, so index lookups and
//! venue-mirroring comparisons are exact.

pub mod feed;
pub mod orderbook;
pub mod prelude;
mod utils;

pub use feed::{
    FeedClient, FeedCredentials, FeedError, FeedHandle, FeedMessage, Frame, RestClient,
    decode_frame,
};
pub use orderbook::{
    Applied, BookError, BookListener, BookManager, BookMode, BookSnapshot, CoreInput,
    LoggingListener, Order, OrderBook, OrderId, OrderKind, OrderLocation, PriceLadder,
    SharedBookListener, Side, SnapshotEntry, SnapshotSource,
};
pub use utils::current_time_millis;
