use derive_more::Display;
use std::collections::VecDeque;

/// Price in signed minor units (cents). Matching compares these exactly;
/// no floating point anywhere in the matching path.
pub type Price = i64;
pub type Quantity = u64;

pub type PriceAndQuantity = (Price, Quantity);
pub type OrderId = u64;
/// Monotonic admission sequence number. A debug aid only; time priority
/// within a level is the level's queue order.
pub type Timestamp = u64;

/// Represents a price level in the order book.
///
/// A price level is the FIFO queue of all resting orders on one side at one
/// price, with a cached total quantity. It stores order ids, not orders;
/// the orders themselves live in the book's central arena, so callers supply
/// the relevant remaining quantity whenever an entry leaves the queue.
#[derive(Debug)]
pub(crate) struct PriceLevel {
    /// The price for this level
    price: Price,
    /// Queue of order ids at this price level (FIFO ordering)
    orders: VecDeque<OrderId>,
    /// Total remaining quantity across all orders at this level
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Creates a new empty price level at the specified price.
    pub(crate) fn new(price: Price) -> Self {
        PriceLevel {
            price,
            orders: VecDeque::new(),
            total_quantity: 0,
        }
    }

    pub(crate) fn price(&self) -> Price {
        self.price
    }

    /// Appends an order to the back of the queue and grows the total.
    pub(crate) fn add(&mut self, id: OrderId, quantity: Quantity) {
        self.orders.push_back(id);
        self.total_quantity += quantity;
    }

    /// Returns the id of the oldest order at this level, or `None` if empty.
    pub(crate) fn front(&self) -> Option<OrderId> {
        self.orders.front().copied()
    }

    /// Removes and returns the oldest order. `remaining` must be that
    /// order's remaining quantity at the time of removal; it is subtracted
    /// from the total.
    pub(crate) fn pop_front(&mut self, remaining: Quantity) -> Option<OrderId> {
        let id = self.orders.pop_front()?;
        debug_assert!(remaining <= self.total_quantity);
        self.total_quantity -= remaining;
        Some(id)
    }

    /// Removes a specific order from anywhere in the queue (cancellation).
    /// Linear in the queue length. Returns whether the order was found;
    /// on a hit, `remaining` is subtracted from the total.
    pub(crate) fn remove(&mut self, id: OrderId, remaining: Quantity) -> bool {
        if let Some(pos) = self.orders.iter().position(|&queued| queued == id) {
            self.orders.remove(pos);
            debug_assert!(remaining <= self.total_quantity);
            self.total_quantity -= remaining;
            true
        } else {
            false
        }
    }

    /// Shrinks the total by `removed`. Used when an order in the queue had
    /// its remaining quantity reduced in place (partial fill, reduce-only
    /// modify). The argument is the amount removed, never a new total.
    pub(crate) fn adjust_total(&mut self, removed: Quantity) {
        debug_assert!(removed <= self.total_quantity);
        self.total_quantity -= removed;
    }

    pub(crate) fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    #[allow(dead_code)]
    pub(crate) fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Returns true if this price level has no orders.
    pub(crate) fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterates the order ids in FIFO order.
    #[allow(dead_code)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.orders.iter().copied()
    }
}

/// Represents the side of an order in the order book.
///
/// Orders can be either buy orders (bids) or sell orders (asks).
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "lower"))]
pub enum Side {
    /// Buy order (bid) - willing to buy at specified price or lower
    Buy,
    /// Sell order (ask) - willing to sell at specified price or higher
    Sell,
}

impl Side {
    /// The side an incoming order on `self` matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Represents an order held by the matching engine.
///
/// `remaining_quantity` is strictly positive while the order is live and
/// reaches zero exactly when the order is fully filled; `original_quantity`
/// never changes after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Unique identifier, assigned by the engine, never reused
    pub id: OrderId,
    /// Whether this is a buy or sell order
    pub side: Side,
    /// Limit price in minor units
    pub price: Price,
    /// Quantity still unfilled
    pub remaining_quantity: Quantity,
    /// Quantity at submission
    pub original_quantity: Quantity,
    /// Admission sequence number
    pub timestamp: Timestamp,
}

impl Order {
    /// Creates a new unfilled order.
    pub fn new(
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        Order {
            id,
            side,
            price,
            remaining_quantity: quantity,
            original_quantity: quantity,
            timestamp,
        }
    }
}

/// Represents a completed fill between two orders.
///
/// The maker is the order that was resting in the book, the taker the
/// incoming order that matched against it. The price is always the maker's
/// resting price.
#[derive(Display, Debug, Clone, PartialEq, Eq)]
#[display(
    "Trade: {} @ {} (maker: {}, taker: {})",
    quantity,
    price,
    maker_order_id,
    taker_order_id
)]
pub struct Trade {
    /// ID of the maker order (resting in book)
    pub maker_order_id: OrderId,
    /// ID of the taker order (incoming)
    pub taker_order_id: OrderId,
    /// Execution price of the trade, in minor units
    pub price: Price,
    /// Number of units traded; always positive
    pub quantity: Quantity,
}

impl Trade {
    pub fn new(
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Trade {
            maker_order_id,
            taker_order_id,
            price,
            quantity,
        }
    }
}

/// A collection of trades, as returned from order matching operations.
pub type Trades = Vec<Trade>;

/// Error type for engine operations.
///
/// Cancelling an unknown id is not an error (it returns `false`), so every
/// variant here leaves the book unchanged.
#[derive(Display, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `modify_order` referenced an id that is not resting in the book
    #[display("order {} not found", _0)]
    NotFound(OrderId),
    /// Same-price modify that does not reduce the remaining quantity
    #[display(
        "modify at the same price can only reduce quantity (order {id}: {new_quantity} vs {remaining} remaining)"
    )]
    InvalidModify {
        id: OrderId,
        remaining: Quantity,
        new_quantity: Quantity,
    },
    /// Non-positive price or quantity on submit or modify
    #[display("{} must be strictly positive", _0)]
    InvalidArgument(&'static str),
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_level_new_and_is_empty() {
        let mut lvl = PriceLevel::new(10);
        assert_eq!(lvl.price(), 10);
        assert!(lvl.is_empty());
        assert_eq!(lvl.total_quantity(), 0);
        assert_eq!(lvl.front(), None);

        lvl.add(1, 5);
        assert!(!lvl.is_empty());
        assert_eq!(lvl.total_quantity(), 5);
    }

    #[test]
    fn price_level_add_fifo_and_totals() {
        let mut lvl = PriceLevel::new(42);

        lvl.add(1, 30);
        lvl.add(2, 20);

        assert_eq!(lvl.order_count(), 2);
        // FIFO preserved
        assert_eq!(lvl.front(), Some(1));
        assert_eq!(lvl.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(lvl.total_quantity(), 50);
    }

    #[test]
    fn price_level_pop_front_in_order() {
        let mut lvl = PriceLevel::new(99);
        lvl.add(1, 10);
        lvl.add(2, 25);

        assert_eq!(lvl.pop_front(10), Some(1));
        assert_eq!(lvl.total_quantity(), 25);
        assert_eq!(lvl.front(), Some(2));

        assert_eq!(lvl.pop_front(25), Some(2));
        assert_eq!(lvl.total_quantity(), 0);
        assert!(lvl.is_empty());

        // Popping from empty => None
        assert_eq!(lvl.pop_front(0), None);
    }

    #[test]
    fn price_level_remove_from_middle_keeps_fifo() {
        let mut lvl = PriceLevel::new(77);
        lvl.add(1, 100);
        lvl.add(2, 200);
        lvl.add(3, 150);

        assert!(lvl.remove(2, 200));
        assert_eq!(lvl.order_count(), 2);
        assert_eq!(lvl.total_quantity(), 250);
        assert_eq!(lvl.iter().collect::<Vec<_>>(), vec![1, 3]);

        // Unknown id leaves the level untouched
        assert!(!lvl.remove(999, 50));
        assert_eq!(lvl.total_quantity(), 250);
    }

    #[test]
    fn price_level_adjust_total_after_partial_fill() {
        let mut lvl = PriceLevel::new(55);
        lvl.add(1, 10);
        lvl.add(2, 25);

        // Front order reduced 10 -> 4 elsewhere; level only sees the delta.
        lvl.adjust_total(6);
        assert_eq!(lvl.total_quantity(), 29);
        assert_eq!(lvl.order_count(), 2);
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn order_new_tracks_original_quantity() {
        let order = Order::new(7, Side::Sell, 10100, 40, 3);
        assert_eq!(order.remaining_quantity, 40);
        assert_eq!(order.original_quantity, 40);
        assert_eq!(order.timestamp, 3);
    }

    #[test]
    fn trade_display() {
        let trade = Trade::new(1, 2, 10000, 50);
        assert_eq!(
            format!("{}", trade),
            "Trade: 50 @ 10000 (maker: 1, taker: 2)"
        );
    }

    #[test]
    fn engine_error_display() {
        assert_eq!(format!("{}", EngineError::NotFound(9)), "order 9 not found");
        assert_eq!(
            format!("{}", EngineError::InvalidArgument("price")),
            "price must be strictly positive"
        );
    }
}
