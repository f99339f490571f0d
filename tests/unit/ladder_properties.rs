//! Property tests: ladder structural invariants hold under arbitrary
//! interleavings of inserts, removals, and head matches.

use booksync_rs::prelude::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn order(id: usize, price: Decimal, size: Decimal) -> Order {
    Order {
        time: None,
        sequence: id as u64,
        product_id: "BTC-USD".to_string(),
        order_id: format!("order-{id}"),
        kind: OrderKind::Limit,
        side: Side::Buy,
        price: Some(price),
        size,
        funds: None,
    }
}

proptest! {
    #[test]
    fn ladder_keeps_no_empty_levels(ops in proptest::collection::vec((0u8..3, 0u32..5, 1i64..100), 1..200)) {
        let mut ladder = PriceLadder::new(Side::Buy);
        let mut next_id = 0usize;
        let mut live: Vec<(Decimal, String)> = Vec::new();

        for (op, price_step, raw_size) in ops {
            let price = Decimal::from(10 + price_step);
            let size = Decimal::from(raw_size);
            match op {
                0 => {
                    let id = format!("order-{next_id}");
                    ladder.insert_tail(price, order(next_id, price, size));
                    live.push((price, id));
                    next_id += 1;
                }
                1 => {
                    if let Some((at, id)) = live.pop() {
                        prop_assert!(ladder.remove_by_id(at, &id).is_some());
                    }
                }
                _ => {
                    if let Some(best) = ladder.best() {
                        let head_id = ladder
                            .level(best)
                            .and_then(|queue| queue.front())
                            .map(|o| o.order_id.clone())
                            .unwrap();
                        if let MatchHead::Filled(filled) = ladder.match_head(best, &head_id, size) {
                            live.retain(|(_, id)| *id != filled.order_id);
                        }
                    }
                }
            }

            // No empty queue is ever kept, and every queued order agrees
            // with its level price.
            for (level_price, queue) in ladder.iter() {
                prop_assert!(!queue.is_empty());
                for resting in queue {
                    prop_assert_eq!(resting.price, Some(*level_price));
                    prop_assert!(resting.size > Decimal::ZERO);
                }
            }

            // Every order we believe is live is findable exactly where
            // we left it.
            for (at, id) in &live {
                prop_assert!(ladder.order(*at, id).is_some());
            }

            prop_assert_eq!(ladder.order_count(), live.len());
        }
    }
}
