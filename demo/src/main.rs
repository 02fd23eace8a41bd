//! # Matching Engine Demo
//!
//! Demonstrates various features and behaviors of the matching engine.
//!
//! This demo shows:
//! - Basic order matching
//! - Partial fills
//! - Price-time priority
//! - Multi-level sweeps
//! - Cancel and modify semantics

use lob_core::{format_price, price_to_minor_units, MatchingEngine, Side, Trade};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Main entry point that runs all demo scenarios.
fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("set tracing subscriber");

    println!("=== Limit Order Book Demo ===\n");

    demo_basic_matching(&mut MatchingEngine::new());
    demo_partial_fills(&mut MatchingEngine::new());
    demo_price_time_priority(&mut MatchingEngine::new());
    demo_multi_level_sweep(&mut MatchingEngine::new());
    demo_cancel_and_modify(&mut MatchingEngine::new());
}

/// Demonstrates basic order matching between buy and sell orders.
fn demo_basic_matching(engine: &mut MatchingEngine) {
    println!("-----------------------");
    println!("1. Basic Matching Demo:");
    println!("-----------------------");

    let trades = submit_decimal(engine, Side::Buy, "100.00", 10);
    print_trades(&trades);
    print_book_state(engine);

    let trades = submit_decimal(engine, Side::Sell, "100.00", 10);
    print_trades(&trades);
    print_book_state(engine);
}

/// Demonstrates partial order fills: the resting order absorbs two takers.
fn demo_partial_fills(engine: &mut MatchingEngine) {
    println!("---------------------");
    println!("2. Partial Fill Demo:");
    println!("---------------------");

    submit_decimal(engine, Side::Buy, "100.00", 15);

    let trades = submit_decimal(engine, Side::Sell, "100.00", 10);
    print_trades(&trades);
    print_book_state(engine);

    let trades = submit_decimal(engine, Side::Sell, "100.00", 10);
    print_trades(&trades);
    print_book_state(engine);
}

/// Demonstrates price-time priority matching rules: the best price fills
/// first, and orders at the same price fill in arrival order.
fn demo_price_time_priority(engine: &mut MatchingEngine) {
    println!("----------------------------");
    println!("3. Price-Time Priority Demo:");
    println!("----------------------------");

    submit_decimal(engine, Side::Buy, "99.00", 10);
    submit_decimal(engine, Side::Buy, "100.00", 10);
    submit_decimal(engine, Side::Buy, "100.00", 10);

    print_book_state(engine);

    let trades = submit_decimal(engine, Side::Sell, "99.00", 25);
    print_trades(&trades);
    print_book_state(engine);
}

/// Demonstrates an aggressive order that crosses the spread and sweeps
/// several price levels.
fn demo_multi_level_sweep(engine: &mut MatchingEngine) {
    println!("--------------------------");
    println!("4. Multi-Level Sweep Demo:");
    println!("--------------------------");

    println!("Building initial order book:");
    submit_decimal(engine, Side::Buy, "98.00", 20);
    submit_decimal(engine, Side::Buy, "99.00", 15);
    submit_decimal(engine, Side::Sell, "101.00", 10);
    submit_decimal(engine, Side::Sell, "102.00", 15);
    submit_decimal(engine, Side::Sell, "103.00", 20);

    print_book_state(engine);

    println!("\nLarge aggressive BUY order crosses the spread:");
    let trades = submit_decimal(engine, Side::Buy, "102.00", 30);
    print_trades(&trades);
    print_book_state(engine);
}

/// Demonstrates cancel and the two modify paths: a same-price reduce keeps
/// queue position, a reprice re-enters the queue and can trade immediately.
fn demo_cancel_and_modify(engine: &mut MatchingEngine) {
    println!("---------------------------");
    println!("5. Cancel and Modify Demo:");
    println!("---------------------------");

    submit_decimal(engine, Side::Sell, "101.00", 10);
    submit_decimal(engine, Side::Buy, "99.00", 10);
    submit_decimal(engine, Side::Buy, "98.00", 10);
    print_book_state(engine);

    println!("Cancelling order 3:");
    let cancelled = engine.cancel_order(3);
    println!("--Cancelled: {}", cancelled);
    print_book_state(engine);

    println!("Reducing order 2 to 5 units (keeps its place in the queue):");
    engine
        .modify_order(2, price("99.00"), 5)
        .expect("reduce succeeds");
    print_book_state(engine);

    println!("Repricing order 2 up to 101.00 (new id, crosses the ask):");
    let trades = engine
        .modify_order(2, price("101.00"), 5)
        .expect("reprice succeeds");
    println!("--Replacement order id: {}", engine.last_order_id());
    print_trades(&trades);
    print_book_state(engine);
}

fn price(decimal: &str) -> i64 {
    price_to_minor_units(Decimal::from_str(decimal).unwrap()).unwrap()
}

/// Submits an order given a decimal price string, echoing what was sent.
fn submit_decimal(engine: &mut MatchingEngine, side: Side, price_decimal: &str, quantity: u64) -> Vec<Trade> {
    println!(
        "--Placing {} order: Price={}, Qty={}",
        side, price_decimal, quantity
    );
    let trades = engine
        .submit_order(side, price(price_decimal), quantity)
        .expect("demo orders are valid");
    println!("--Assigned id {}", engine.last_order_id());
    trades
}

/// Prints a list of executed trades in a formatted way.
fn print_trades(trades: &[Trade]) {
    if trades.is_empty() {
        println!("--No trades executed");
    } else {
        println!("--Trades executed:");
        for trade in trades {
            println!(
                "----Trade: {} @ {} (maker: {}, taker: {})",
                trade.quantity,
                format_price(trade.price),
                trade.maker_order_id,
                trade.taker_order_id
            );
        }
    }
}

/// Prints the current top of book.
fn print_book_state(engine: &MatchingEngine) {
    let book = engine.book();
    println!("--Book state:");
    match book.best_bid() {
        Some(bid) => println!("----Best BID: {}", format_price(bid)),
        None => println!("----Best BID: None"),
    }
    match book.best_ask() {
        Some(ask) => println!("----Best ASK: {}", format_price(ask)),
        None => println!("----Best ASK: None"),
    }
    println!();
}
