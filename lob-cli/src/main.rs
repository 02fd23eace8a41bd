//! # Order Book CLI
//!
//! A command-line interface for driving the matching engine.
//!
//! With no subcommand this starts an interactive session against a single
//! engine; one-shot subcommands run against a fresh engine and exit.

use clap::{Parser, Subcommand};
use lob_core::{
    format_mid, format_price, price_to_minor_units, MatchingEngine, Side, Trade,
};
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "lob-cli")]
#[command(about = "A limit order book CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Place an order against a fresh engine and exit
    #[command(name = "place-order")]
    PlaceOrder {
        /// Order side (buy/sell)
        side: Side,
        /// Price in decimal format (e.g., 100.50)
        price: String,
        /// Quantity in whole units
        quantity: u64,
    },
    /// Place a buy order (interactive mode)
    #[command(name = "buy")]
    Buy {
        /// Price in decimal format (e.g., 100.50)
        price: String,
        /// Quantity in whole units
        quantity: u64,
    },
    /// Place a sell order (interactive mode)
    #[command(name = "sell")]
    Sell {
        /// Price in decimal format (e.g., 100.50)
        price: String,
        /// Quantity in whole units
        quantity: u64,
    },
    /// Cancel a resting order (interactive mode)
    #[command(name = "cancel")]
    Cancel {
        /// Order id as reported on placement
        id: u64,
    },
    /// Modify a resting order (interactive mode). Same price reduces in
    /// place; a new price re-enters the queue under a new id.
    #[command(name = "modify")]
    Modify {
        /// Order id as reported on placement
        id: u64,
        /// New price in decimal format
        price: String,
        /// New quantity in whole units
        quantity: u64,
    },
    /// Show market depth (interactive mode)
    #[command(name = "book", aliases = ["b"])]
    Book {
        /// Number of levels to show per side
        #[arg(default_value = "5")]
        levels: usize,
    },
    /// Show best bid and ask, spread and midpoint
    #[command(name = "top")]
    Top,
    /// Exit interactive mode
    #[command(name = "quit", aliases = ["exit", "q"])]
    Quit,
    /// Start interactive mode
    #[command(name = "interactive")]
    Interactive,
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("set tracing subscriber");

    let cli = Cli::parse();

    match cli.command {
        None => {
            // Default to interactive mode when no command is provided
            run_interactive_mode();
        }
        Some(Commands::PlaceOrder {
            side,
            price,
            quantity,
        }) => {
            let mut engine = MatchingEngine::new();
            match place_order(&mut engine, side, &price, quantity) {
                Ok(trades) => {
                    let id = engine.last_order_id();
                    if trades.is_empty() {
                        println!("Order {} placed. No trades executed.", id);
                    } else {
                        println!("Order {} executed! Trades:", id);
                        for trade in &trades {
                            print_trade(trade);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Error placing order: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Top) => {
            let engine = MatchingEngine::new();
            print_top(&engine);
        }
        Some(Commands::Interactive) => {
            run_interactive_mode();
        }
        // These commands are only meaningful against a persistent engine
        Some(Commands::Buy { .. })
        | Some(Commands::Sell { .. })
        | Some(Commands::Cancel { .. })
        | Some(Commands::Modify { .. })
        | Some(Commands::Book { .. })
        | Some(Commands::Quit) => {
            eprintln!("This command is only available in interactive mode.");
            eprintln!("Use: cargo run --bin lob-cli -- interactive");
            std::process::exit(1);
        }
    }
}

/// Parse interactive command using clap
fn parse_interactive_command(input: &str) -> Result<Commands, String> {
    let args = shlex::split(input).ok_or("Invalid command syntax")?;
    if args.is_empty() {
        return Err("Empty command".to_string());
    }

    // Prepend a dummy program name for clap parsing
    let mut full_args = vec!["lob-cli".to_string()];
    full_args.extend(args);

    match Cli::try_parse_from(full_args) {
        Ok(cli) => match cli.command {
            Some(command) => Ok(command),
            None => Err("Interactive mode not available within interactive mode".to_string()),
        },
        Err(e) => Err(e.to_string()),
    }
}

/// Runs the interactive REPL mode
fn run_interactive_mode() {
    println!("=== Order Book Interactive CLI ===");
    println!("Type 'help' for available commands, 'quit' to exit\n");

    let mut engine = MatchingEngine::new();

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break, // EOF
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_interactive_command(trimmed) {
                    Ok(command) => match command {
                        Commands::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        Commands::Buy { price, quantity } => {
                            run_submit(&mut engine, Side::Buy, &price, quantity);
                        }
                        Commands::Sell { price, quantity } => {
                            run_submit(&mut engine, Side::Sell, &price, quantity);
                        }
                        Commands::Cancel { id } => {
                            if engine.cancel_order(id) {
                                println!("✅ Order {} cancelled.", id);
                            } else {
                                println!("❌ Order {} is not live.", id);
                            }
                        }
                        Commands::Modify {
                            id,
                            price,
                            quantity,
                        } => {
                            run_modify(&mut engine, id, &price, quantity);
                        }
                        Commands::Book { levels } => print_book(&engine, levels),
                        Commands::Top => print_top(&engine),
                        // These commands shouldn't be available in interactive mode
                        Commands::PlaceOrder { .. } | Commands::Interactive => {
                            println!("❌ Command not available in interactive mode.");
                        }
                    },
                    Err(e) => {
                        // Handle help commands specially
                        if trimmed == "help" || trimmed == "h" {
                            show_help();
                        } else if e.contains("unexpected argument") || e.contains("invalid value") {
                            println!("❌ Invalid command. Type 'help' for available commands.");
                        } else if e.contains("required arguments")
                            || e.contains("The following required arguments")
                        {
                            println!("❌ Missing required arguments. Type 'help' for usage.");
                        } else {
                            println!("❌ Error: {}", e.lines().next().unwrap_or("Invalid command"));
                        }
                    }
                }
            }
            Err(error) => {
                println!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn show_help() {
    println!("📚 Available Commands:");
    println!("  buy <price> <quantity>         - Place a buy order (e.g., buy 100.50 10)");
    println!("  sell <price> <quantity>        - Place a sell order (e.g., sell 100.25 5)");
    println!("  cancel <id>                    - Cancel a resting order");
    println!("  modify <id> <price> <quantity> - Modify a resting order");
    println!("  book [levels] | b              - Show market depth (default: 5 levels)");
    println!("  top                            - Show best bid/ask, spread and mid");
    println!("  help | h                       - Show this help message");
    println!("  quit | exit | q                - Exit the CLI");
    println!();
    println!("💡 Tips:");
    println!("  - Prices use decimal format (e.g., 100.50); quantities are whole units");
    println!("  - Order ids are assigned by the engine and echoed on placement");
    println!("  - Orders are matched using price-time priority at the maker's price");
    println!("  - Modifying to a new price re-queues the order under a new id");
    println!();
}

fn run_submit(engine: &mut MatchingEngine, side: Side, price_str: &str, quantity: u64) {
    match place_order(engine, side, price_str, quantity) {
        Ok(trades) => {
            let id = engine.last_order_id();
            if trades.is_empty() {
                println!("✅ Order {} placed. No trades executed.", id);
            } else {
                println!("🎯 Order {} executed! Trades:", id);
                for trade in &trades {
                    print!("  💰 ");
                    print_trade(trade);
                }
            }
            print_top_summary(engine);
        }
        Err(e) => println!("❌ Error: {}", e),
    }
}

fn run_modify(engine: &mut MatchingEngine, id: u64, price_str: &str, quantity: u64) {
    let before = engine.last_order_id();
    match modify_order(engine, id, price_str, quantity) {
        Ok(trades) => {
            let last = engine.last_order_id();
            if last != before {
                println!("✅ Order {} replaced by order {}.", id, last);
            } else {
                println!("✅ Order {} reduced to {}.", id, quantity);
            }
            if !trades.is_empty() {
                println!("🎯 Trades:");
                for trade in &trades {
                    print!("  💰 ");
                    print_trade(trade);
                }
            }
            print_top_summary(engine);
        }
        Err(e) => println!("❌ Error: {}", e),
    }
}

fn place_order(
    engine: &mut MatchingEngine,
    side: Side,
    price_str: &str,
    quantity: u64,
) -> Result<Vec<Trade>, String> {
    let price = parse_price(price_str)?;
    engine
        .submit_order(side, price, quantity)
        .map_err(|e| e.to_string())
}

fn modify_order(
    engine: &mut MatchingEngine,
    id: u64,
    price_str: &str,
    quantity: u64,
) -> Result<Vec<Trade>, String> {
    let price = parse_price(price_str)?;
    engine
        .modify_order(id, price, quantity)
        .map_err(|e| e.to_string())
}

fn parse_price(price_str: &str) -> Result<i64, String> {
    let decimal =
        Decimal::from_str(price_str).map_err(|_| format!("Invalid price format: {}", price_str))?;
    price_to_minor_units(decimal).ok_or_else(|| "Price too large to convert to minor units".into())
}

fn print_trade(trade: &Trade) {
    println!(
        "Trade: {} @ {} (maker: {}, taker: {})",
        trade.quantity,
        format_price(trade.price),
        trade.maker_order_id,
        trade.taker_order_id
    );
}

fn print_top(engine: &MatchingEngine) {
    let book = engine.book();
    match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => {
            println!("  💚 Best BID: {}", format_price(bid));
            println!("  ❤️  Best ASK: {}", format_price(ask));
            println!("  📏 Spread:   {}", format_price(book.spread().unwrap()));
            println!("  📍 Mid:      {}", format_mid(book.mid_price().unwrap()));
        }
        (Some(bid), None) => {
            println!("  💚 Best BID: {}", format_price(bid));
            println!("  ❤️  Best ASK: None");
        }
        (None, Some(ask)) => {
            println!("  💚 Best BID: None");
            println!("  ❤️  Best ASK: {}", format_price(ask));
        }
        (None, None) => {
            println!("  📭 Order book is empty");
        }
    }
}

fn print_book(engine: &MatchingEngine, levels: usize) {
    let book = engine.book();
    let bid_depth = book.depth(Side::Buy, levels);
    let ask_depth = book.depth(Side::Sell, levels);

    if bid_depth.is_empty() && ask_depth.is_empty() {
        println!("  📭 Order book is empty");
        return;
    }

    println!("  📈 Market Depth:");

    // Asks print worst-first so the best prices meet in the middle
    for (price, qty) in ask_depth.iter().rev() {
        println!("    🔴 {} @ {}", qty, format_price(*price));
    }

    if !ask_depth.is_empty() && !bid_depth.is_empty() {
        println!("    ─────────────────");
    }

    for (price, qty) in &bid_depth {
        println!("    🟢 {} @ {}", qty, format_price(*price));
    }
}

fn print_top_summary(engine: &MatchingEngine) {
    let book = engine.book();
    match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => {
            println!(
                "📊 Best: {} | {} (spread {})",
                format_price(bid),
                format_price(ask),
                format_price(ask - bid)
            );
        }
        (Some(bid), None) => println!("📊 Best: {} | no asks", format_price(bid)),
        (None, Some(ask)) => println!("📊 Best: no bids | {}", format_price(ask)),
        (None, None) => println!("📊 Order book is empty"),
    }
}
