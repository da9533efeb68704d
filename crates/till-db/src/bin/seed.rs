//! # Seed Data Generator
//!
//! Populates a Till database with customers and products for development.
//!
//! ## Usage
//! ```bash
//! # 200 products, 20 customers (default)
//! cargo run -p till-db --bin seed
//!
//! # Custom amounts and path
//! cargo run -p till-db --bin seed -- --products 1000 --customers 50 --db ./data/till.db
//! ```
//!
//! Every tenth product is flagged unavailable and every seventh starts with
//! zero stock, so rejections are easy to reproduce by hand.

use anyhow::Context;
use chrono::Utc;
use std::env;
use till_core::{Customer, Product};
use till_db::repository::customer::generate_customer_id;
use till_db::repository::product::generate_product_id;
use till_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Catalog lines as (SKU prefix, names).
const CATALOG: &[(&str, &[&str])] = &[
    (
        "BEV",
        &["Sparkling Water", "Cola", "Lemon Soda", "Cold Brew", "Orange Juice"],
    ),
    (
        "SNK",
        &["Salted Crisps", "Pretzel Bites", "Trail Mix", "Dark Chocolate", "Granola Bar"],
    ),
    (
        "BAK",
        &["Sourdough Loaf", "Croissant", "Bagel", "Rye Bread", "Muffin"],
    ),
    (
        "HOM",
        &["Dish Soap", "Paper Towels", "Sponges", "Trash Bags", "Light Bulb"],
    ),
];

const FIRST_NAMES: &[&str] = &["Ada", "Bola", "Chen", "Dana", "Emeka", "Farah", "Gus"];
const LAST_NAMES: &[&str] = &["Okafor", "Silva", "Nakamura", "Adeyemi", "Novak"];

struct Args {
    products: usize,
    customers: usize,
    db_path: String,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = env::args().collect();

    let mut parsed = Args {
        products: 200,
        customers: 20,
        db_path: String::from("./till_dev.db"),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    parsed.products = args[i + 1].parse().unwrap_or(parsed.products);
                    i += 1;
                }
            }
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    parsed.customers = args[i + 1].parse().unwrap_or(parsed.customers);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    parsed.db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>   Number of products to generate (default: 200)");
                println!("  -c, --customers <N>  Number of customers to generate (default: 20)");
                println!("  -d, --db <PATH>      Database file path (default: ./till_dev.db)");
                println!("  -h, --help           Show this help message");
                return None;
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    Some(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(args) = parse_args() else {
        return Ok(());
    };

    info!(
        db = %args.db_path,
        products = args.products,
        customers = args.customers,
        "Seeding database"
    );

    let db = Database::new(DbConfig::new(&args.db_path))
        .await
        .with_context(|| format!("opening {}", args.db_path))?;

    let existing = db.products().count().await? + db.customers().count().await?;
    if existing > 0 {
        warn!(
            existing,
            "Database already has data; skipping seed. Delete the file to regenerate."
        );
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut customers = 0;
    for seed in 0..args.customers {
        let customer = generate_customer(seed);
        match db.customers().insert(&customer).await {
            Ok(_) => customers += 1,
            Err(e) => warn!(phone = %customer.phone_number, error = %e, "Failed to insert customer"),
        }
    }

    let mut products = 0;
    let catalog: Vec<(&str, &str)> = CATALOG
        .iter()
        .flat_map(|(prefix, names)| names.iter().map(move |name| (*prefix, *name)))
        .collect();
    for seed in 0..args.products {
        let (prefix, name) = catalog[seed % catalog.len()];
        let product = generate_product(prefix, name, seed);
        match db.products().insert(&product).await {
            Ok(_) => products += 1,
            Err(e) => warn!(sku = %product.sku, error = %e, "Failed to insert product"),
        }
    }

    info!(
        customers,
        products,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

fn generate_customer(seed: usize) -> Customer {
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed / FIRST_NAMES.len()) % LAST_NAMES.len()];

    Customer {
        id: generate_customer_id(),
        name: format!("{first} {last}"),
        phone_number: format!("+1555{:07}", seed),
        created_at: Utc::now(),
    }
}

fn generate_product(prefix: &str, name: &str, seed: usize) -> Product {
    let now = Utc::now();

    // $0.99 - $24.98
    let price_cents = 99 + ((seed * 37) % 2400) as i64;
    let stock = if seed % 7 == 0 { 0 } else { (seed % 50) as i64 + 1 };

    Product {
        id: generate_product_id(),
        sku: format!("{prefix}-{seed:05}"),
        name: format!("{name} #{seed}"),
        price_cents,
        stock,
        is_available: seed % 10 != 9,
        created_at: now,
        updated_at: now,
    }
}
