#![cfg(test)]

use crate::engine::MatchingEngine;
use crate::order_book::OrderBook;
use crate::types::{OrderId, Quantity, Side};
use std::collections::HashSet;

pub(crate) fn new_engine() -> MatchingEngine {
    MatchingEngine::new()
}

/// Checks the book's structural invariants: levels are non-empty with
/// accurate cached totals, every live order sits in exactly one level with
/// matching side and price, the index agrees with the levels, and the book
/// is never crossed.
pub(crate) fn assert_book_invariants(book: &OrderBook) {
    let mut seen: HashSet<OrderId> = HashSet::new();

    for (side, levels) in [(Side::Buy, &book.bids), (Side::Sell, &book.asks)] {
        for (&price, level) in levels {
            assert!(!level.is_empty(), "{side} level {price} is empty");
            assert_eq!(level.price(), price, "level price disagrees with its key");

            let mut sum: Quantity = 0;
            for id in level.iter() {
                assert!(
                    seen.insert(id),
                    "order {id} appears in more than one level"
                );
                let order = book
                    .get_order(id)
                    .unwrap_or_else(|| panic!("order {id} queued but not live in the index"));
                assert_eq!(order.side, side, "order {id} queued on the wrong side");
                assert_eq!(order.price, price, "order {id} queued at the wrong price");
                assert!(
                    order.remaining_quantity > 0,
                    "order {id} is resting with zero quantity"
                );
                sum += order.remaining_quantity;
            }
            assert_eq!(
                level.total_quantity(),
                sum,
                "cached total for {side} level {price} drifted"
            );
        }
    }

    assert_eq!(
        seen.len(),
        book.id_index.len(),
        "index and levels disagree on the set of live orders"
    );

    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        assert!(bid < ask, "book is crossed: bid {bid} >= ask {ask}");
    }
}
