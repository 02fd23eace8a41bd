use crate::types::{Order, OrderId, Price, PriceAndQuantity, PriceLevel, Quantity, Side};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A limit order book that maintains resting buy and sell orders.
///
/// Orders are organized by price level, with price-time priority for
/// matching. Buy orders (bids) are best at the highest price, sell orders
/// (asks) at the lowest.
///
/// The book owns all order storage: levels hold order ids, the `orders`
/// arena holds the orders themselves, and `id_index` marks which ids are
/// currently resting. Orders stay in the arena after they fill or cancel;
/// only the index changes, so `has_order` answers for resting orders alone.
pub struct OrderBook {
    /// Buy side, keyed by price; the best bid is the last key
    pub(crate) bids: BTreeMap<Price, PriceLevel>,
    /// Sell side, keyed by price; the best ask is the first key
    pub(crate) asks: BTreeMap<Price, PriceLevel>,
    /// Arena of every order that ever rested, addressed by id
    pub(crate) orders: HashMap<OrderId, Order>,
    /// Ids currently resting in some level
    pub(crate) id_index: HashSet<OrderId>,
}

impl OrderBook {
    /// Creates a new empty order book.
    pub fn new() -> Self {
        OrderBook {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
            id_index: HashSet::new(),
        }
    }

    fn side(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rests an order: finds or creates the level for its side and price,
    /// appends it at the tail, and records it in the arena and the index.
    ///
    /// Callers guarantee a positive remaining quantity and a fresh id; the
    /// engine is the sole caller and allocates ids itself.
    pub(crate) fn add_order(&mut self, order: Order) {
        debug_assert!(order.remaining_quantity > 0, "resting a filled order");
        debug_assert!(
            !self.id_index.contains(&order.id),
            "order {} already resting",
            order.id
        );

        self.side_mut(order.side)
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .add(order.id, order.remaining_quantity);
        self.id_index.insert(order.id);
        self.orders.insert(order.id, order);
    }

    /// Removes a resting order from its level, dropping the level if it is
    /// now empty.
    ///
    /// Returns whether the order was live. Cancelling an unknown (or already
    /// filled, or already cancelled) id returns `false` and changes nothing,
    /// which makes cancel idempotent under at-least-once delivery.
    pub(crate) fn cancel_order(&mut self, id: OrderId) -> bool {
        if !self.id_index.contains(&id) {
            return false;
        }
        let (side, price, remaining) = {
            let order = self.orders.get(&id).expect("indexed order is stored");
            (order.side, order.price, order.remaining_quantity)
        };

        let side_map = self.side_mut(side);
        let level = side_map.get_mut(&price).expect("resting order has a level");
        let removed = level.remove(id, remaining);
        debug_assert!(removed, "index and level disagree for order {}", id);
        if level.is_empty() {
            side_map.remove(&price);
        }
        self.id_index.remove(&id);
        true
    }

    /// Reduce-only quantity change for a resting order, in place.
    ///
    /// Returns `false` if the id is unknown, or if `new_quantity` is zero or
    /// does not reduce the current remaining quantity. On success the order
    /// keeps its position in the queue, so time priority is unchanged.
    pub(crate) fn modify_quantity(&mut self, id: OrderId, new_quantity: Quantity) -> bool {
        if !self.id_index.contains(&id) {
            return false;
        }
        let order = self.orders.get_mut(&id).expect("indexed order is stored");
        if new_quantity == 0 || new_quantity >= order.remaining_quantity {
            return false;
        }
        let removed = order.remaining_quantity - new_quantity;
        order.remaining_quantity = new_quantity;
        let (side, price) = (order.side, order.price);

        self.level_mut(side, price)
            .expect("resting order has a level")
            .adjust_total(removed);
        true
    }

    /// Erases the level at `(side, price)` if it exists and is empty.
    /// Idempotent; the matcher calls this after draining a level.
    pub(crate) fn clean_level(&mut self, side: Side, price: Price) {
        let side_map = self.side_mut(side);
        if side_map.get(&price).is_some_and(|level| level.is_empty()) {
            side_map.remove(&price);
        }
    }

    /// Unlinks an id from the index without touching any level. Used by the
    /// matcher after fully filling a maker it has already popped.
    pub(crate) fn remove_from_index(&mut self, id: OrderId) {
        self.id_index.remove(&id);
    }

    /// Best price on the given side, if that side is non-empty.
    pub(crate) fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bids.keys().next_back().copied(),
            Side::Sell => self.asks.keys().next().copied(),
        }
    }

    /// Id of the oldest order at `(side, price)`, if that level exists.
    pub(crate) fn front_at(&self, side: Side, price: Price) -> Option<OrderId> {
        self.side(side).get(&price).and_then(|level| level.front())
    }

    pub(crate) fn level_mut(&mut self, side: Side, price: Price) -> Option<&mut PriceLevel> {
        self.side_mut(side).get_mut(&price)
    }

    /// Returns the highest bid price, or `None` if there are no bids.
    pub fn best_bid(&self) -> Option<Price> {
        self.best_price(Side::Buy)
    }

    /// Returns the lowest ask price, or `None` if there are no asks.
    pub fn best_ask(&self) -> Option<Price> {
        self.best_price(Side::Sell)
    }

    /// Best ask minus best bid, in minor units, when both sides are
    /// non-empty.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Exact midpoint of the best bid and ask, in minor units, when both
    /// sides are non-empty. Returned as a [`Decimal`] so a half-cent
    /// midpoint loses nothing; conversion for display is the caller's
    /// concern.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => {
                Some((Decimal::from(bid) + Decimal::from(ask)) / Decimal::TWO)
            }
            _ => None,
        }
    }

    /// Returns market depth for the specified side: up to `levels`
    /// `(price, total_quantity)` pairs, best price first.
    ///
    /// # Arguments
    ///
    /// * `side` - Which side of the book to query
    /// * `levels` - Maximum number of price levels to return
    pub fn depth(&self, side: Side, levels: usize) -> Vec<PriceAndQuantity> {
        let iter: Box<dyn Iterator<Item = (&Price, &PriceLevel)>> = match side {
            Side::Buy => Box::new(self.bids.iter().rev()),
            Side::Sell => Box::new(self.asks.iter()),
        };

        iter.take(levels)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// Returns true if `id` is currently resting in the book.
    pub fn has_order(&self, id: OrderId) -> bool {
        self.id_index.contains(&id)
    }

    /// Returns the resting order with this id, or `None` if it is not live.
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        if !self.id_index.contains(&id) {
            return None;
        }
        self.orders.get(&id)
    }

    /// Returns true if the order book has no resting orders on either side.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Number of resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.id_index.len()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
