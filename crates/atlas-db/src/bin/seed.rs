//! # Seed Data Generator
//!
//! Populates the database with test products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 1,000 products (default)
//! cargo run -p atlas-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p atlas-db --bin seed -- --count 5000
//!
//! # Specify database path
//! cargo run -p atlas-db --bin seed -- --db ./data/atlas.db
//! ```
//!
//! ## Generated Products
//! Creates realistic product data across categories:
//! - Beverages (sodas, water, juice)
//! - Snacks (chips, candy, cookies)
//! - Dairy (milk, cheese, yogurt)
//! - Frozen (ice cream, frozen meals)
//! - Grocery (canned goods, pasta, rice)
//!
//! Prices and stock are derived from the product index, so re-seeding
//! an empty database always produces the same catalog.

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;

use atlas_core::Product;
use atlas_db::repository::product::generate_product_id;
use atlas_db::{Database, DbConfig};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Coca-Cola",
            "Pepsi",
            "Sprite",
            "Fanta",
            "Dr Pepper",
            "Mountain Dew",
            "7-Up",
            "Red Bull",
            "Monster Energy",
            "Gatorade",
            "Dasani Water",
            "Evian Water",
            "Orange Juice",
            "Apple Juice",
            "Grape Juice",
            "Lemonade",
            "Iced Tea",
            "Coffee",
            "Hot Chocolate",
            "Milk",
        ],
    ),
    (
        "Snacks",
        &[
            "Lays Classic",
            "Doritos Nacho",
            "Cheetos",
            "Pringles",
            "Ruffles",
            "Tostitos",
            "Fritos",
            "Snickers",
            "M&Ms",
            "Reeses",
            "Kit Kat",
            "Twix",
            "Skittles",
            "Starburst",
            "Gummy Bears",
            "Oreos",
            "Chips Ahoy",
            "Nutter Butter",
            "Goldfish",
            "Pretzels",
        ],
    ),
    (
        "Dairy",
        &[
            "Whole Milk",
            "2% Milk",
            "Skim Milk",
            "Almond Milk",
            "Oat Milk",
            "Cheddar Cheese",
            "Mozzarella",
            "Swiss Cheese",
            "Cream Cheese",
            "Butter",
            "Greek Yogurt",
            "Regular Yogurt",
            "Sour Cream",
            "Heavy Cream",
            "Half & Half",
            "Eggs Dozen",
            "Eggs Half Dozen",
            "Cottage Cheese",
            "Parmesan",
            "Feta Cheese",
        ],
    ),
    (
        "Frozen",
        &[
            "Vanilla Ice Cream",
            "Chocolate Ice Cream",
            "Strawberry Ice Cream",
            "Cookie Dough Ice Cream",
            "Mint Chip Ice Cream",
            "Frozen Pizza",
            "Frozen Burrito",
            "Frozen Dinner",
            "Ice Cream Bars",
            "Popsicles",
            "Frozen Vegetables",
            "Frozen Fruit",
            "Frozen Waffles",
            "Fish Sticks",
            "Chicken Nuggets",
            "Frozen Fries",
            "Ice Cream Sandwich",
            "Sorbet",
            "Frozen Breakfast",
            "Frozen Pie",
        ],
    ),
    (
        "Grocery",
        &[
            "White Bread",
            "Wheat Bread",
            "Pasta Spaghetti",
            "Pasta Penne",
            "Rice White",
            "Rice Brown",
            "Canned Beans",
            "Canned Corn",
            "Canned Tomatoes",
            "Canned Soup",
            "Cereal Cheerios",
            "Cereal Frosted Flakes",
            "Oatmeal",
            "Peanut Butter",
            "Jelly",
            "Honey",
            "Maple Syrup",
            "Flour",
            "Sugar",
            "Salt",
        ],
    ),
];

/// Size variants for products
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("XL", 350),
    ("12oz", 0),
    ("16oz", 50),
    ("20oz", 100),
    ("2L", 150),
    ("6-Pack", 300),
    ("12-Pack", 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 1000;
    let mut db_path = String::from("./atlas_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(1000);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Atlas POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 1000)");
                println!("  -d, --db <PATH>    Database file path (default: ./atlas_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Atlas POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate products
    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    for (category_idx, (category, products)) in CATEGORIES.iter().enumerate() {
        for (product_idx, product_name) in products.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break;
                }

                let product = generate_product(
                    category,
                    product_name,
                    size_name,
                    *price_addon,
                    category_idx * 1000 + product_idx * 20 + size_idx,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }

                generated += 1;

                if generated % 500 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }

            if generated >= count {
                break;
            }
        }

        if generated >= count {
            break;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!(
        "  Rate: {:.0} products/second",
        generated as f64 / elapsed.as_secs_f64()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic, seed-derived data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    // Price: base $1.99-$9.99 + size addon
    let base_price = 199 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    // Stock (0-100)
    let stock = (seed % 101) as i64;

    // Full product name with size
    let full_name = format!("{} {}", name, size);

    Product {
        id: generate_product_id(),
        name: full_name,
        category: category.to_string(),
        price_cents,
        stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
