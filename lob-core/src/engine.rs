use crate::order_book::OrderBook;
use crate::types::{EngineError, Order, OrderId, Price, Quantity, Side, Timestamp, Trade, Trades};
use tracing::{debug, trace};

/// Whether an opposite level at `level_price` can trade with a taker
/// limited to `taker_price`.
fn crosses(taker_side: Side, taker_price: Price, level_price: Price) -> bool {
    match taker_side {
        Side::Buy => level_price <= taker_price,
        Side::Sell => level_price >= taker_price,
    }
}

/// The matching engine for a single instrument.
///
/// Owns the order book (and through it all order storage) and the id
/// allocator. Each submitted order is matched against the opposite side of
/// the book in best-price-first, FIFO-within-level order; any remainder
/// rests. The engine is synchronous and single-threaded: calls run to
/// completion, and a given call sequence always produces the same trades
/// and the same final book.
pub struct MatchingEngine {
    book: OrderBook,
    /// Next id to assign; ids start at 1 and are never reused
    next_order_id: OrderId,
    /// Admission sequence stamped onto orders, a debug aid only
    next_timestamp: Timestamp,
}

impl MatchingEngine {
    /// Creates an engine with an empty book.
    pub fn new() -> Self {
        MatchingEngine {
            book: OrderBook::new(),
            next_order_id: 1,
            next_timestamp: 0,
        }
    }

    /// Submits a limit order and returns the trades it produced.
    ///
    /// The order is assigned the next id (retrievable via
    /// [`last_order_id`](Self::last_order_id)), matched against the opposite
    /// side while prices cross, and rested in the book if any quantity
    /// remains. Fills always execute at the resting (maker) price, and an
    /// incoming order never jumps ahead of resting liquidity at its own
    /// price.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidArgument`] if `price` or `quantity` is not
    /// strictly positive; no id is allocated in that case.
    pub fn submit_order(
        &mut self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<Trades, EngineError> {
        if price <= 0 {
            return Err(EngineError::InvalidArgument("price"));
        }
        if quantity == 0 {
            return Err(EngineError::InvalidArgument("quantity"));
        }

        let id = self.next_order_id;
        self.next_order_id += 1;
        let timestamp = self.next_timestamp;
        self.next_timestamp += 1;

        let mut taker = Order::new(id, side, price, quantity, timestamp);
        debug!("order {}: {} {} x {}", id, side, quantity, price);

        let trades = self.match_incoming(&mut taker);

        if taker.remaining_quantity > 0 {
            debug!("order {} rests with {} remaining", id, taker.remaining_quantity);
            self.book.add_order(taker);
        }
        Ok(trades)
    }

    /// Matches an incoming order against the opposite side of the book.
    ///
    /// Walks opposite levels best-first while they cross the taker's limit,
    /// filling each level FIFO and erasing levels it drains. Stops as soon
    /// as the taker is exhausted or the best opposite level no longer
    /// crosses.
    fn match_incoming(&mut self, taker: &mut Order) -> Trades {
        let mut trades = Vec::new();
        let opposite = taker.side.opposite();

        while taker.remaining_quantity > 0 {
            let level_price = match self.book.best_price(opposite) {
                Some(price) => price,
                None => break, // no liquidity
            };
            if !crosses(taker.side, taker.price, level_price) {
                break;
            }
            self.fill_level(taker, level_price, &mut trades);
            self.book.clean_level(opposite, level_price);
        }
        trades
    }

    /// Fills the taker against one opposite level until one of them is
    /// exhausted.
    ///
    /// Makers fill in queue order. A fully consumed maker is popped and
    /// dropped from the index; a partially consumed one stays at the front
    /// with its remaining quantity reduced in place.
    fn fill_level(&mut self, taker: &mut Order, level_price: Price, trades: &mut Trades) {
        let opposite = taker.side.opposite();

        while taker.remaining_quantity > 0 {
            let maker_id = match self.book.front_at(opposite, level_price) {
                Some(id) => id,
                None => break, // level exhausted
            };
            let maker = self
                .book
                .orders
                .get_mut(&maker_id)
                .expect("level entry resolves to a stored order");

            let fill = taker.remaining_quantity.min(maker.remaining_quantity);
            trades.push(Trade::new(maker_id, taker.id, maker.price, fill));
            taker.remaining_quantity -= fill;
            maker.remaining_quantity -= fill;
            let maker_filled = maker.remaining_quantity == 0;
            trace!(
                "fill {} @ {} (maker: {}, taker: {})",
                fill,
                level_price,
                maker_id,
                taker.id
            );

            let level = self
                .book
                .level_mut(opposite, level_price)
                .expect("crossed level is present");
            debug_assert_eq!(level.price(), level_price);
            if maker_filled {
                level.pop_front(fill);
                self.book.remove_from_index(maker_id);
            } else {
                level.adjust_total(fill);
            }
        }
    }

    /// Cancels a resting order. Returns whether it was live; cancelling an
    /// unknown or already-dead id is not an error.
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        let cancelled = self.book.cancel_order(id);
        if cancelled {
            debug!("order {} cancelled", id);
        }
        cancelled
    }

    /// Modifies a resting order.
    ///
    /// At the same price this is a reduce-only, priority-preserving change
    /// and returns no trades. At a different price it is cancel + resubmit:
    /// the order forfeits time priority, gets a fresh id (readable via
    /// [`last_order_id`](Self::last_order_id)), and may trade immediately;
    /// those trades are returned.
    ///
    /// # Errors
    ///
    /// * [`EngineError::InvalidArgument`] - non-positive new price/quantity
    /// * [`EngineError::NotFound`] - `id` is not resting in the book
    /// * [`EngineError::InvalidModify`] - same-price modify that does not
    ///   reduce the remaining quantity
    ///
    /// The book is unchanged on every error path.
    pub fn modify_order(
        &mut self,
        id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) -> Result<Trades, EngineError> {
        if new_price <= 0 {
            return Err(EngineError::InvalidArgument("price"));
        }
        if new_quantity == 0 {
            return Err(EngineError::InvalidArgument("quantity"));
        }
        let order = self.book.get_order(id).ok_or(EngineError::NotFound(id))?;
        let (side, price, remaining) = (order.side, order.price, order.remaining_quantity);

        if new_price == price {
            if new_quantity >= remaining {
                return Err(EngineError::InvalidModify {
                    id,
                    remaining,
                    new_quantity,
                });
            }
            let reduced = self.book.modify_quantity(id, new_quantity);
            debug_assert!(reduced, "validated reduce failed for order {}", id);
            debug!("order {} reduced to {}", id, new_quantity);
            Ok(Vec::new())
        } else {
            self.book.cancel_order(id);
            debug!("order {} repriced {} -> {}, resubmitting", id, price, new_price);
            self.submit_order(side, new_price, new_quantity)
        }
    }

    /// Read-only view of the book.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// The most recently assigned order id. Never decreases; 0 until the
    /// first order is accepted.
    pub fn last_order_id(&self) -> OrderId {
        self.next_order_id - 1
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use crate::test_support::assert_book_invariants;

    // --- submission and resting ---

    #[test]
    fn resting_order_no_match() {
        let mut engine = MatchingEngine::new();

        let trades = engine.submit_order(Side::Buy, 10000, 100).unwrap();

        assert!(trades.is_empty());
        assert_eq!(engine.last_order_id(), 1);
        assert_eq!(engine.book().best_bid(), Some(10000));
        assert_eq!(engine.book().best_ask(), None);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn submit_rejects_non_positive_arguments() {
        let mut engine = MatchingEngine::new();

        assert_eq!(
            engine.submit_order(Side::Buy, 0, 100),
            Err(EngineError::InvalidArgument("price"))
        );
        assert_eq!(
            engine.submit_order(Side::Sell, -100, 100),
            Err(EngineError::InvalidArgument("price"))
        );
        assert_eq!(
            engine.submit_order(Side::Buy, 10000, 0),
            Err(EngineError::InvalidArgument("quantity"))
        );
        // No id was allocated for any of the rejects.
        assert_eq!(engine.last_order_id(), 0);
        assert!(engine.book().is_empty());
    }

    // --- matching ---

    #[test]
    fn exact_match_empties_book() {
        let mut engine = MatchingEngine::new();

        let first = engine.submit_order(Side::Buy, 10000, 100).unwrap();
        let second = engine.submit_order(Side::Sell, 10000, 100).unwrap();

        assert!(first.is_empty());
        assert_eq!(second, vec![Trade::new(1, 2, 10000, 100)]);
        assert!(engine.book().is_empty());
        assert!(!engine.book().has_order(1));
        assert_book_invariants(engine.book());
    }

    #[test]
    fn partial_fill_rests_remainder() {
        let mut engine = MatchingEngine::new();

        engine.submit_order(Side::Buy, 10000, 50).unwrap();
        let trades = engine.submit_order(Side::Sell, 10000, 100).unwrap();

        assert_eq!(trades, vec![Trade::new(1, 2, 10000, 50)]);
        assert!(engine.book().has_order(2));
        assert_eq!(engine.book().best_ask(), Some(10000));
        assert_eq!(engine.book().depth(Side::Sell, 1), vec![(10000, 50)]);
        assert_eq!(engine.book().best_bid(), None);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn price_priority_hits_better_bid_first() {
        let mut engine = MatchingEngine::new();

        engine.submit_order(Side::Buy, 9900, 100).unwrap();
        engine.submit_order(Side::Buy, 10000, 100).unwrap();
        let trades = engine.submit_order(Side::Sell, 9800, 100).unwrap();

        let prices: Vec<_> = trades.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![10000]);
        assert_eq!(engine.book().best_bid(), Some(9900));
        assert_book_invariants(engine.book());
    }

    #[test]
    fn time_priority_fifo_within_level() {
        let mut engine = MatchingEngine::new();

        engine.submit_order(Side::Buy, 10000, 50).unwrap(); // id 1
        engine.submit_order(Side::Buy, 10000, 50).unwrap(); // id 2
        let trades = engine.submit_order(Side::Sell, 10000, 50).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, 1);
        assert!(engine.book().has_order(2));
        assert_book_invariants(engine.book());
    }

    #[test]
    fn aggressive_order_sweeps_multiple_levels() {
        let mut engine = MatchingEngine::new();

        engine.submit_order(Side::Sell, 10000, 50).unwrap();
        engine.submit_order(Side::Sell, 10100, 50).unwrap();
        engine.submit_order(Side::Sell, 10200, 50).unwrap();
        let trades = engine.submit_order(Side::Buy, 10200, 150).unwrap();

        let prices: Vec<_> = trades.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![10000, 10100, 10200]);
        let total: Quantity = trades.iter().map(|t| t.quantity).sum();
        assert_eq!(total, 150);
        assert_eq!(engine.book().best_ask(), None);
        assert!(engine.book().is_empty());
        assert_book_invariants(engine.book());
    }

    #[test]
    fn non_crossing_taker_rests_in_full() {
        let mut engine = MatchingEngine::new();

        engine.submit_order(Side::Sell, 10100, 50).unwrap();
        let trades = engine.submit_order(Side::Buy, 10000, 80).unwrap();

        assert!(trades.is_empty());
        assert_eq!(engine.book().depth(Side::Buy, 1), vec![(10000, 80)]);
        assert_eq!(engine.book().spread(), Some(100));
        assert_book_invariants(engine.book());
    }

    #[test]
    fn fills_execute_at_maker_price() {
        let mut engine = MatchingEngine::new();

        engine.submit_order(Side::Sell, 10000, 50).unwrap();
        // Taker is willing to pay more; the maker's resting price wins.
        let trades = engine.submit_order(Side::Buy, 10500, 50).unwrap();
        assert_eq!(trades[0].price, 10000);

        engine.submit_order(Side::Buy, 9900, 50).unwrap();
        let trades = engine.submit_order(Side::Sell, 9500, 50).unwrap();
        assert_eq!(trades[0].price, 9900);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn sweep_consumes_partial_maker_at_last_level() {
        let mut engine = MatchingEngine::new();

        engine.submit_order(Side::Sell, 10000, 30).unwrap();
        engine.submit_order(Side::Sell, 10000, 40).unwrap();
        engine.submit_order(Side::Sell, 10100, 50).unwrap();
        let trades = engine.submit_order(Side::Buy, 10100, 90).unwrap();

        assert_eq!(
            trades,
            vec![
                Trade::new(1, 4, 10000, 30),
                Trade::new(2, 4, 10000, 40),
                Trade::new(3, 4, 10100, 20),
            ]
        );
        // The partially consumed maker keeps the front of its level.
        assert_eq!(engine.book().get_order(3).unwrap().remaining_quantity, 30);
        assert_eq!(engine.book().depth(Side::Sell, 5), vec![(10100, 30)]);
        assert_book_invariants(engine.book());
    }

    // --- cancel ---

    #[test]
    fn cancel_is_idempotent() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Buy, 10000, 100).unwrap();

        assert!(engine.cancel_order(1));
        assert!(!engine.cancel_order(1));
        assert!(!engine.cancel_order(42));
        assert!(engine.book().is_empty());
        assert_book_invariants(engine.book());
    }

    #[test]
    fn cancel_of_only_order_removes_level() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Sell, 10100, 10).unwrap();
        engine.submit_order(Side::Sell, 10200, 10).unwrap();

        assert!(engine.cancel_order(1));
        assert_eq!(engine.book().best_ask(), Some(10200));
        assert_book_invariants(engine.book());
    }

    // --- modify ---

    #[test]
    fn modify_unknown_id_is_not_found() {
        let mut engine = MatchingEngine::new();
        assert_eq!(
            engine.modify_order(5, 10000, 10),
            Err(EngineError::NotFound(5))
        );
    }

    #[test]
    fn modify_same_price_reduces_and_keeps_priority() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Buy, 10000, 100).unwrap(); // id 1
        engine.submit_order(Side::Buy, 10000, 100).unwrap(); // id 2

        let trades = engine.modify_order(1, 10000, 40).unwrap();
        assert!(trades.is_empty());
        assert_eq!(engine.book().get_order(1).unwrap().remaining_quantity, 40);
        // Same id, same queue position.
        assert_eq!(engine.last_order_id(), 2);
        let trades = engine.submit_order(Side::Sell, 10000, 40).unwrap();
        assert_eq!(trades[0].maker_order_id, 1);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn modify_same_price_must_reduce() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Buy, 10000, 100).unwrap();

        assert_eq!(
            engine.modify_order(1, 10000, 100),
            Err(EngineError::InvalidModify {
                id: 1,
                remaining: 100,
                new_quantity: 100
            })
        );
        assert_eq!(
            engine.modify_order(1, 10000, 150),
            Err(EngineError::InvalidModify {
                id: 1,
                remaining: 100,
                new_quantity: 150
            })
        );
        // The order is untouched.
        assert_eq!(engine.book().get_order(1).unwrap().remaining_quantity, 100);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn modify_rejects_non_positive_arguments_without_cancelling() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Buy, 9900, 100).unwrap();

        assert_eq!(
            engine.modify_order(1, 10100, 0),
            Err(EngineError::InvalidArgument("quantity"))
        );
        assert_eq!(
            engine.modify_order(1, 0, 10),
            Err(EngineError::InvalidArgument("price"))
        );
        // A bad reprice must not half-run: the original order is still live.
        assert!(engine.book().has_order(1));
        assert_book_invariants(engine.book());
    }

    #[test]
    fn modify_price_is_cancel_plus_resubmit() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Buy, 10000, 50).unwrap(); // id 1
        engine.submit_order(Side::Buy, 10000, 50).unwrap(); // id 2

        let trades = engine.modify_order(1, 9900, 50).unwrap();
        assert!(trades.is_empty());

        // Old id is gone, the replacement has a fresh id at the new price.
        assert!(!engine.book().has_order(1));
        let new_id = engine.last_order_id();
        assert_eq!(new_id, 3);
        let order = engine.book().get_order(new_id).unwrap();
        assert_eq!(order.price, 9900);
        assert_eq!(order.remaining_quantity, 50);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn reprice_forfeits_time_priority() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Buy, 10000, 50).unwrap(); // id 1
        engine.submit_order(Side::Buy, 9900, 50).unwrap(); // id 2, resting at 9900
        engine.submit_order(Side::Buy, 9900, 50).unwrap(); // id 3, behind id 2

        // Move order 1 down to 9900: it joins the tail of that level.
        engine.modify_order(1, 9900, 50).unwrap();
        let replacement = engine.last_order_id();

        let trades = engine.submit_order(Side::Sell, 9900, 150).unwrap();
        let makers: Vec<_> = trades.iter().map(|t| t.maker_order_id).collect();
        assert_eq!(makers, vec![2, 3, replacement]);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn modify_price_can_trigger_match() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Sell, 10100, 100).unwrap(); // id 1
        engine.submit_order(Side::Buy, 9900, 100).unwrap(); // id 2

        let trades = engine.modify_order(2, 10100, 100).unwrap();

        assert_eq!(trades, vec![Trade::new(1, 3, 10100, 100)]);
        assert!(!engine.book().has_order(2));
        assert!(!engine.book().has_order(3)); // fully filled on entry
        assert!(engine.book().is_empty());
        assert_book_invariants(engine.book());
    }

    // --- accounting laws ---

    #[test]
    fn conservation_of_quantity() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Sell, 10000, 30).unwrap();
        engine.submit_order(Side::Sell, 10050, 45).unwrap();

        let submitted = 60;
        let trades = engine.submit_order(Side::Buy, 10050, submitted).unwrap();
        let filled: Quantity = trades.iter().map(|t| t.quantity).sum();
        let resting = engine
            .book()
            .get_order(engine.last_order_id())
            .map(|o| o.remaining_quantity)
            .unwrap_or(0);

        assert!(trades.iter().all(|t| t.quantity > 0));
        assert_eq!(filled + resting, submitted);
        assert_book_invariants(engine.book());
    }

    #[test]
    fn ids_increase_monotonically() {
        let mut engine = MatchingEngine::new();
        engine.submit_order(Side::Buy, 9900, 10).unwrap();
        engine.submit_order(Side::Sell, 10100, 10).unwrap();
        engine.modify_order(1, 9950, 10).unwrap(); // resubmit takes id 3

        assert_eq!(engine.last_order_id(), 3);
        engine.submit_order(Side::Buy, 9800, 10).unwrap();
        assert_eq!(engine.last_order_id(), 4);
    }
}
