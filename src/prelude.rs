//! Prelude module that re-exports commonly used types and traits.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use booksync_rs::prelude::*;
//! ```

// Core book types
pub use crate::orderbook::{Applied, BookError, BookMode, OrderBook};

// Routing and reconciliation
pub use crate::orderbook::manager::{BookManager, CoreInput};
pub use crate::orderbook::reconcile::{MAX_RECONCILE_ATTEMPTS, SNAPSHOT_TIMEOUT, SnapshotSource};

// Order model
pub use crate::orderbook::{Order, OrderId, OrderKind, OrderLocation, Side};

// Ladder and snapshot types
pub use crate::orderbook::{BookSnapshot, MatchHead, PriceLadder, SnapshotEntry};

// Observer hooks
pub use crate::orderbook::{BookListener, LoggingListener, SharedBookListener};

// Feed collaborators
pub use crate::feed::{
    ChangeMessage, DoneMessage, DoneReason, FeedClient, FeedCredentials, FeedError, FeedHandle,
    FeedMessage, Frame, MatchMessage, OpenMessage, ReceivedMessage, RestClient, decode_frame,
    public_subscribe_frame,
};

// Utility functions
pub use crate::utils::current_time_millis;
