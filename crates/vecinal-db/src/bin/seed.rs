//! # Seed Data Generator
//!
//! Populates the database with demo vecinos and generates the monthly
//! coupons of a year for development.
//!
//! ## Usage
//! ```bash
//! # 5 vecinos (when none exist) + coupons for the current year
//! cargo run -p vecinal-db --bin seed
//!
//! # Custom amount of vecinos and year
//! cargo run -p vecinal-db --bin seed -- --vecinos 20 --year 2025
//!
//! # Specify database path (overrides VECINAL_DB_PATH)
//! cargo run -p vecinal-db --bin seed -- --db ./data/vecinal.db
//! ```
//!
//! Amount, discounts and description come from `VECINAL_COUPON_*`.
//! Generation is idempotent, so running the seed twice for the same year
//! creates nothing the second time.

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vecinal_core::display::{format_currency, format_date};
use vecinal_core::{Money, User, VECINO_ROLE};
use vecinal_db::{Database, VecinalConfig};

/// Demo names for generated vecinos.
const FIRST_NAMES: &[&str] = &[
    "Ana", "Bernardo", "Camila", "Diego", "Elena", "Felipe", "Gabriela", "Héctor", "Isidora",
    "Joaquín", "Karen", "Luis", "Marcela", "Nicolás", "Olga", "Pablo",
];

const LAST_NAMES: &[&str] = &[
    "Rojas", "Soto", "Muñoz", "González", "Díaz", "Pérez", "Contreras", "Silva", "Morales",
    "Fuentes", "Vargas",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = env::args().collect();

    let mut config = VecinalConfig::load()?;
    let mut vecino_count: usize = 5;
    let mut year: Option<i32> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--vecinos" | "-n" => {
                if i + 1 < args.len() {
                    vecino_count = args[i + 1].parse().unwrap_or(5);
                    i += 1;
                }
            }
            "--year" | "-y" => {
                if i + 1 < args.len() {
                    year = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vecinal Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --vecinos <N>  Demo vecinos to create when none exist (default: 5)");
                println!("  -y, --year <YEAR>  Year to generate coupons for (default: current year)");
                println!("  -d, --db <PATH>    Database file path (default: VECINAL_DB_PATH or ./vecinal.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vecinal Seed Data Generator");
    println!("==============================");
    println!("Database: {}", config.database_path.display());
    println!("Amount:   {}", Money::from_pesos(config.coupon_amount));
    println!();

    let db = Database::new(config.db_config()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Vecinos
    let users = db.users();
    let existing = users.count_by_role(VECINO_ROLE).await?;
    if existing > 0 {
        println!("⚠ Database already has {} vecinos, not creating more", existing);
    } else {
        for n in 0..vecino_count {
            users.insert(&demo_user(n, VECINO_ROLE)).await?;
        }
        users.insert(&demo_user(vecino_count, "administrador")).await?;
        println!("✓ Created {} vecinos and 1 administrador", vecino_count);
    }

    // Coupons
    println!();
    println!("Generating monthly coupons...");

    let service = db.coupon_service();
    let start = std::time::Instant::now();
    let created = service
        .generate_monthly(config.generation_options(year))
        .await?;
    let elapsed = start.elapsed();

    println!("✓ Generated {} coupons in {:?}", created.len(), elapsed);

    if let (Some(first), Some(last)) = (
        created.iter().filter_map(|c| c.due_date).min(),
        created.iter().filter_map(|c| c.due_date).max(),
    ) {
        println!("  Due dates: {} → {}", format_date(Some(first)), format_date(Some(last)));
    }

    let billed: i64 = created.iter().map(|c| c.amount).sum();
    let discounted: i64 = created.iter().map(|c| c.discounted_amount().pesos()).sum();
    println!("  Billed:    {}", format_currency(Some(billed)));
    println!("  After discounts: {}", format_currency(Some(discounted)));

    println!();
    println!("Vecinos:");
    for vecino in service.list_vecinos().await? {
        let coupons = service.list_vecino_coupons(&vecino.id).await?;
        println!("  {:<28} {:>3} coupons", vecino.full_name, coupons.len());
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vecinal=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds a user with a deterministic demo name, email and RUT.
fn demo_user(seed: usize, role: &str) -> User {
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed * 7) % LAST_NAMES.len()];
    let body = 10_000_000 + seed * 137_911;

    User {
        id: Uuid::new_v4().to_string(),
        full_name: format!("{} {}", first, last),
        email: format!(
            "{}.{}{}@vecinal.example",
            first.to_lowercase(),
            last.to_lowercase(),
            seed
        ),
        rut: format!("{}-{}", body, rut_check_digit(body)),
        role: role.to_string(),
        created_at: Utc::now(),
    }
}

/// Módulo 11 check digit of a Chilean RUT body.
fn rut_check_digit(mut body: usize) -> char {
    let mut sum = 0;
    let mut factor = 2;
    while body > 0 {
        sum += (body % 10) * factor;
        body /= 10;
        factor = if factor == 7 { 2 } else { factor + 1 };
    }
    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        d => char::from_digit(d as u32, 10).unwrap_or('0'),
    }
}
