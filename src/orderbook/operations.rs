//! Event application: the five feed mutations against one book.
//!
//! Feed anomalies here are absorbed, not raised: unknown ids log a
//! warning, attribute mismatches log an error and the best-effort
//! update proceeds. The sequence cursor advances in `update` only after
//! the application returns.

use super::book::OrderBook;
use super::ladder::MatchHead;
use super::order::{Order, OrderKind};
use crate::feed::message::{
    ChangeMessage, DoneMessage, MatchMessage, OpenMessage, ReceivedMessage,
};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

impl OrderBook {
    /// `received`: track the order as pending until the venue opens it
    /// or finishes it. Ladders are untouched; for market orders this is
    /// usually the only sighting before a `match`/`done` chain.
    pub(super) fn receive_order(&mut self, message: &ReceivedMessage) {
        let order = Order {
            time: Some(message.time),
            sequence: message.sequence,
            product_id: message.product_id.clone(),
            order_id: message.order_id.clone(),
            kind: message.order_type,
            side: message.side,
            price: match message.order_type {
                OrderKind::Market => None,
                _ => message.price,
            },
            size: message.size.unwrap_or(Decimal::ZERO),
            funds: message.funds,
        };
        self.index.insert_pending(order);
        if let Some(listener) = &self.listener {
            if let Some(order) = self.index.pending(&message.order_id) {
                listener.on_received(order, message);
            }
        }
    }

    /// `open`: promote the pending order, or synthesize one when the
    /// receipt was never seen (snapshot boundary), then rest it.
    pub(super) fn open_order(&mut self, message: &OpenMessage) {
        let order = match self.index.remove_pending(&message.order_id) {
            Some(mut pending) => {
                pending.time = Some(message.time);
                pending.sequence = message.sequence;
                pending.size = message.remaining_size;
                pending.price = Some(message.price);
                pending
            }
            None => Order {
                time: Some(message.time),
                sequence: message.sequence,
                product_id: message.product_id.clone(),
                order_id: message.order_id.clone(),
                kind: OrderKind::Limit,
                side: message.side,
                price: Some(message.price),
                size: message.remaining_size,
                funds: None,
            },
        };
        self.add_order(order, Some(message));
    }

    /// Rest an order on its ladder and index its location. `message` is
    /// absent for snapshot rows.
    pub(super) fn add_order(&mut self, order: Order, message: Option<&OpenMessage>) {
        let Some(price) = order.price else {
            error!(order = %order, "unpriced order cannot rest on a ladder");
            return;
        };
        let side = order.side;
        let order_id = order.order_id.clone();
        // A snapshot row can describe an order whose receipt is still
        // pending from before the fetch; the resting state supersedes it.
        if self.index.remove_pending(&order_id).is_some() {
            debug!(order_id = %order_id, "pending order superseded by resting state");
        }
        self.index.insert_resting(order_id.clone(), price, side);
        self.ladder_mut(side).insert_tail(price, order);
        if let Some(listener) = &self.listener {
            if let Some(order) = self.ladder(side).order(price, &order_id) {
                listener.on_add(order, message);
            }
        }
    }

    /// `done`: drop the order from wherever it lives. Removal uses the
    /// stored price and side, after logging any disagreement with the
    /// event. A `done` without a price is a market taker finishing and
    /// resolves through the pending table.
    pub(super) fn remove_order(&mut self, message: &DoneMessage) {
        let Some((price, side)) = self.index.resting_location(&message.order_id) else {
            if self.index.remove_pending(&message.order_id).is_some() {
                debug!(
                    order_id = %message.order_id,
                    reason = %message.reason,
                    "done for pending order"
                );
            } else {
                warn!(
                    order_id = %message.order_id,
                    side = %message.side,
                    reason = %message.reason,
                    "done for unknown order"
                );
            }
            return;
        };
        if message.side != side {
            error!(
                order_id = %message.order_id,
                done_side = %message.side,
                known_side = %side,
                "done with inconsistent side"
            );
        }
        if let Some(done_price) = message.price {
            if done_price != price {
                error!(
                    order_id = %message.order_id,
                    done_price = %done_price,
                    known_price = %price,
                    "done with inconsistent price"
                );
            }
        }
        self.index.remove_resting(&message.order_id);
        match self.ladder_mut(side).remove_by_id(price, &message.order_id) {
            Some(order) => {
                if let Some(listener) = &self.listener {
                    listener.on_remove(&order, message);
                }
            }
            None => error!(
                order_id = %message.order_id,
                price = %price,
                "resting index pointed at a missing ladder entry"
            ),
        }
    }

    /// `match`: reduce the maker at the head of its level and drain the
    /// taker's pending size. A maker filled to zero is evicted from the
    /// resting index immediately; the venue's follow-up `done` then
    /// takes the unknown-order no-op path.
    pub(super) fn match_order(&mut self, message: &MatchMessage) {
        if self.index.resting_location(&message.maker_order_id).is_none() {
            warn!(
                maker_order_id = %message.maker_order_id,
                sequence = message.sequence,
                "maker order unknown for trade"
            );
        }

        let taker_remaining = match self.index.pending_mut(&message.taker_order_id) {
            Some(taker) if taker.size > Decimal::ZERO => {
                taker.size -= message.size;
                Some(taker.size)
            }
            Some(_) => Some(Decimal::ZERO),
            None => None,
        };
        match taker_remaining {
            Some(remaining) if remaining <= Decimal::ZERO => {
                self.index.remove_pending(&message.taker_order_id);
                debug!(taker_order_id = %message.taker_order_id, "taker drained");
            }
            Some(remaining) => debug!(
                taker_order_id = %message.taker_order_id,
                size = %message.size,
                %remaining,
                "taker partially filled"
            ),
            None => warn!(
                taker_order_id = %message.taker_order_id,
                sequence = message.sequence,
                "taker order unknown for trade"
            ),
        }

        let maker_removed = match self.ladder_mut(message.side).match_head(
            message.price,
            &message.maker_order_id,
            message.size,
        ) {
            MatchHead::Reduced(remaining) => {
                debug!(
                    maker_order_id = %message.maker_order_id,
                    %remaining,
                    "maker reduced"
                );
                None
            }
            MatchHead::Filled(order) => {
                if order.size != message.size {
                    error!(
                        maker_order_id = %message.maker_order_id,
                        head_size = %order.size,
                        match_size = %message.size,
                        "match exceeds maker size, head clamped to zero"
                    );
                }
                self.index.remove_resting(&message.maker_order_id);
                Some(order)
            }
            MatchHead::HeadMismatch { head_id } => {
                error!(
                    maker_order_id = %message.maker_order_id,
                    %head_id,
                    price = %message.price,
                    "match maker is not at the head of its level"
                );
                None
            }
            MatchHead::LevelMissing => {
                warn!(
                    maker_order_id = %message.maker_order_id,
                    price = %message.price,
                    "match at an unpopulated price level"
                );
                None
            }
        };

        if let Some(listener) = &self.listener {
            let maker = maker_removed.as_ref().or_else(|| {
                self.index
                    .resting_location(&message.maker_order_id)
                    .and_then(|(price, side)| {
                        self.ladder(side).order(price, &message.maker_order_id)
                    })
            });
            listener.on_match(message, maker);
        }
    }

    /// `change`: resize a resting order in place. Ladder membership and
    /// queue position are unchanged. Changes for ids the book never saw
    /// open are dropped (possible around snapshot boundaries).
    pub(super) fn change_order(&mut self, message: &ChangeMessage) {
        let Some((price, side)) = self.index.resting_location(&message.order_id) else {
            warn!(
                order_id = %message.order_id,
                side = %message.side,
                old_size = %message.old_size,
                new_size = %message.new_size,
                "change for unknown order"
            );
            return;
        };
        let Some(order) = self.ladder_mut(side).order_mut(price, &message.order_id) else {
            error!(
                order_id = %message.order_id,
                price = %price,
                "resting index pointed at a missing ladder entry"
            );
            return;
        };
        if order.size != message.old_size {
            error!(
                order_id = %message.order_id,
                old_size = %message.old_size,
                book_size = %order.size,
                "change old_size disagrees with the book"
            );
        }
        order.size = message.new_size;
        if let Some(listener) = &self.listener {
            if let Some(order) = self.ladder(side).order(price, &message.order_id) {
                listener.on_change(order, message.old_size, message.new_size, message);
            }
        }
    }
}
