//! # Demo Data Seeder
//!
//! Fills an empty register database with a small grocery catalog and a few
//! customers (one owing money, one holding store credit).
//!
//! ```bash
//! cargo run -p shopfront-db --bin seed
//! cargo run -p shopfront-db --bin seed -- --db ./data/shopfront.db
//! ```

use std::env;

use shopfront_core::{Money, NewCustomer};
use shopfront_db::{Database, DbConfig, NewItem};

/// (sku, name, price in minor units, stock, unit)
const CATALOG: &[(&str, &str, i64, i64, &str)] = &[
    ("RICE-5KG", "Basmati Rice 5kg", 95000, 40, "bag"),
    ("ATTA-10KG", "Wheat Flour 10kg", 62000, 25, "bag"),
    ("OIL-1L", "Sunflower Oil 1L", 18500, 60, "btl"),
    ("SUGAR-1KG", "Sugar 1kg", 4500, 80, "pkt"),
    ("SALT-1KG", "Iodised Salt 1kg", 2500, 100, "pkt"),
    ("TEA-500G", "Black Tea 500g", 32000, 30, "pkt"),
    ("MILK-1L", "Full Cream Milk 1L", 6500, 48, "pcs"),
    ("EGGS-12", "Eggs (dozen)", 8400, 20, "tray"),
    ("SOAP-4", "Bath Soap 4-pack", 16000, 35, "pack"),
    ("DAL-1KG", "Red Lentils 1kg", 11000, 0, "pkt"),
];

/// (name, phone, opening dues in minor units)
const CUSTOMERS: &[(&str, Option<&str>, i64)] = &[
    ("Asha Verma", Some("9811122233"), 0),
    ("Ravi Kumar", Some("9822233344"), 45000),
    ("Meera Shah", None, -20000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shopfront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront POS demo data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./shopfront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Database: {}", db_path);

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("Database already has {} items, skipping.", existing);
        return Ok(());
    }

    for (sku, name, price, stock, unit) in CATALOG {
        let item = NewItem {
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price: Money::from_cents(*price),
            stock_qty: *stock,
            unit: unit.to_string(),
        };
        if let Err(e) = db.items().insert(&item).await {
            eprintln!("Failed to insert {}: {}", sku, e);
        }
    }
    println!("Inserted {} catalog items", CATALOG.len());

    for (name, phone, dues) in CUSTOMERS {
        let customer = db
            .customers()
            .create(&NewCustomer {
                name: name.to_string(),
                phone: phone.map(str::to_string),
            })
            .await?;
        if *dues != 0 {
            db.customers()
                .adjust_dues(&customer.id, Money::from_cents(*dues))
                .await?;
        }
    }
    println!("Inserted {} customers", CUSTOMERS.len());

    Ok(())
}
