//! Order book error types

use std::fmt;

/// Errors surfaced by the book state machine and reconciler.
///
/// Most feed anomalies (unknown orders, attribute mismatches) are logged
/// and absorbed without an error; the variants here are the outcomes the
/// caller must react to.
#[derive(Debug)]
#[non_exhaustive]
pub enum BookError {
    /// Gap detected in the per-product sequence stream. The book is
    /// invalid until a new snapshot is applied.
    MissingSequences {
        /// Product whose stream gapped.
        product_id: String,
        /// The sequence that was expected next.
        expected: i64,
        /// The sequence that actually arrived.
        got: i64,
    },

    /// A snapshot completion arrived for a superseded reconciliation
    /// generation and was discarded.
    SnapshotStale {
        /// Product the snapshot was fetched for.
        product_id: String,
        /// Generation the fetch was issued under.
        generation: u64,
        /// The book's current generation.
        current: u64,
    },

    /// The book is parked after exhausting reconciliation retries.
    BookFailed {
        /// Product whose book is parked.
        product_id: String,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::MissingSequences {
                product_id,
                expected,
                got,
            } => {
                write!(
                    f,
                    "{product_id} book missing {} messages ({expected} - {got})",
                    got - expected
                )
            }
            BookError::SnapshotStale {
                product_id,
                generation,
                current,
            } => {
                write!(
                    f,
                    "stale snapshot for {product_id}: generation {generation}, book is at {current}"
                )
            }
            BookError::BookFailed { product_id } => {
                write!(
                    f,
                    "{product_id} book is parked after repeated reconciliation failures"
                )
            }
        }
    }
}

impl std::error::Error for BookError {}
