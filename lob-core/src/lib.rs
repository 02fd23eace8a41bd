//! # lob-core
//!
//! A single-instrument, in-memory limit order book with a price-time
//! priority matching engine.
//!
//! The [`MatchingEngine`] accepts limit orders, matches them against resting
//! liquidity on the opposite side of the book (best price first, FIFO within
//! a price level), emits [`Trade`] records for every fill, and rests any
//! unfilled remainder. Cancel and modify operate on the resting book
//! directly. Everything is synchronous and deterministic: the same call
//! sequence always yields the same trades and the same final book.
//!
//! Prices are signed integers in minor units (cents); there is no floating
//! point anywhere in the matching path. Decimal conversion for input and
//! display lives in the units helpers.
//!
//! ## Example
//!
//! ```rust
//! use lob_core::{MatchingEngine, Side};
//!
//! let mut engine = MatchingEngine::new();
//!
//! // Rest a bid: $100.00 for 100 units.
//! let trades = engine.submit_order(Side::Buy, 10000, 100).unwrap();
//! assert!(trades.is_empty());
//! assert_eq!(engine.last_order_id(), 1);
//!
//! // A crossing sell fills at the maker's resting price.
//! let trades = engine.submit_order(Side::Sell, 9900, 40).unwrap();
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].price, 10000);
//! assert_eq!(trades[0].quantity, 40);
//!
//! // The bid rests with what's left.
//! assert_eq!(engine.book().best_bid(), Some(10000));
//! assert_eq!(engine.book().depth(Side::Buy, 1), vec![(10000, 60)]);
//! ```

pub mod engine;
pub mod order_book;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;
mod units;

pub use engine::MatchingEngine;
pub use order_book::OrderBook;
pub use types::{EngineError, Order, Side, Trade, Trades};
pub use units::{format_mid, format_price, price_from_minor_units, price_to_minor_units};
