//! # Seed Data Generator
//!
//! Populates the database with a demo store and inventory for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 items (default)
//! cargo run -p stockbook-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockbook-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p stockbook-db --bin seed -- --db ./data/stockbook.db
//! ```
//!
//! Each item gets a department-appropriate name, a price between $0.99 and
//! $19.99, and an opening stock level between 0 and 100. Prices and stock
//! are derived from the item index so repeated runs stay deterministic.

use std::env;

use stockbook_db::repository::item::NewItem;
use stockbook_db::repository::user::NewStore;
use stockbook_db::{Database, DbConfig};

/// Departments with representative item names.
const DEPARTMENTS: &[(&str, &str, &[&str])] = &[
    (
        "Beverage",
        "Drinks",
        &[
            "Cola 330ml",
            "Lemonade 500ml",
            "Orange Juice 1L",
            "Sparkling Water 500ml",
            "Iced Tea 330ml",
            "Energy Drink 250ml",
            "Apple Juice 1L",
            "Ginger Beer 330ml",
        ],
    ),
    (
        "Snack",
        "Snacks",
        &[
            "Salted Chips 120g",
            "Chocolate Bar 80g",
            "Peanuts 200g",
            "Biscuits 200g",
            "Dried Mango 100g",
            "Popcorn 100g",
        ],
    ),
    (
        "Grocery",
        "Staples",
        &[
            "Rice 1kg",
            "Flour 1kg",
            "Sugar 1kg",
            "Cooking Oil 750ml",
            "Pasta 500g",
            "Canned Tomatoes 400g",
            "Maize Meal 2.5kg",
        ],
    ),
    (
        "Household",
        "Cleaning",
        &[
            "Dish Soap 750ml",
            "Laundry Powder 2kg",
            "Bleach 750ml",
            "Sponges 5pk",
        ],
    ),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let count = arg_value(&args, "--count")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(200);
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./stockbook.db".to_string());

    tracing::info!(db_path = %db_path, count, "Seeding database");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(%err, "Failed to open database");
            std::process::exit(1);
        }
    };

    if let Err(err) = seed(&db, count).await {
        tracing::error!(%err, "Seeding failed");
        std::process::exit(1);
    }

    db.close().await;
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

async fn seed(db: &Database, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let store = db
        .users()
        .create_store(NewStore {
            name: "Demo Corner Shop".to_string(),
            industry: "Retail".to_string(),
            location: "12 Main St".to_string(),
            district: "Central".to_string(),
            country: "ZA".to_string(),
        })
        .await?;

    tracing::info!(store_id = %store.id, "Demo store created");

    let mut created = 0usize;
    'outer: for round in 0usize.. {
        for (item_type, department, names) in DEPARTMENTS {
            for (i, name) in names.iter().enumerate() {
                if created >= count {
                    break 'outer;
                }

                let seq = round * names.len() + i;
                let name = if round == 0 {
                    (*name).to_string()
                } else {
                    format!("{name} #{round}")
                };

                // Index-derived pseudo-random price and stock so repeated
                // runs produce the same inventory.
                let price_cents = 99 + ((seq * 137) % 1900) as i64;
                let qty = ((seq * 53) % 101) as i64;

                db.items()
                    .create(NewItem {
                        store_id: store.id.clone(),
                        item_type: (*item_type).to_string(),
                        department: (*department).to_string(),
                        name,
                        description: None,
                        unit_size: None,
                        unit_type: None,
                        qty_available: qty,
                        low_stock_alert_qty: Some(5),
                        selling_price_cents: price_cents,
                        cost_price_cents: Some(price_cents / 2),
                    })
                    .await?;
                created += 1;
            }
        }
    }

    tracing::info!(created, "Seeding complete");
    Ok(())
}
