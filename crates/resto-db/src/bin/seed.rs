//! # Seed Data Generator
//!
//! Populates the database with a month of demo back-office data for
//! development: commission plans, a small roster, field dispatches with
//! settlements, and a few salary deductions.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults
//! cargo run -p resto-db --bin seed
//!
//! # Specify database path
//! cargo run -p resto-db --bin seed -- --db ./data/resto.db
//!
//! # Seed a different period
//! cargo run -p resto-db --bin seed -- --year 2025 --month 11
//! ```

use chrono::NaiveDate;
use std::env;

use resto_db::resto_core::{DeductionReason, EmployeeType, NewFieldReturn, Role};
use resto_db::{Database, DbConfig};

const FIELD_BRACKETS: &str = r#"[
    {"min": 100,  "max": 500,  "fixed": 10},
    {"min": 501,  "max": 1000, "fixed": 25},
    {"min": 1001, "max": 5000, "fixed": 60}
]"#;

const INSIDE_BRACKETS: &str = r#"[
    {"min": 100,  "max": 500,  "fixed": 5},
    {"min": 501,  "max": 1000, "fixed": 12},
    {"min": 1001, "max": 5000, "fixed": 30}
]"#;

const FIELD_WORKERS: &[&str] = &["Asif Mehmood", "Bilal Khan", "Danish Raza", "Hamza Tariq"];
const INSIDE_STAFF: &[&str] = &["Imran Shah", "Junaid Iqbal"];
const KITCHEN_STAFF: &[&str] = &["Kashif Ali"];

const ITEMS: &[(&str, i64)] = &[
    ("samosa-tray", 5_000),
    ("biryani-box", 12_000),
    ("kebab-pack", 8_000),
    ("naan-bundle", 2_500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./resto_dev.db");
    let mut year: i32 = 2025;
    let mut month: u32 = 11;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--year" | "-y" => {
                if i + 1 < args.len() {
                    year = args[i + 1].parse().unwrap_or(2025);
                    i += 1;
                }
            }
            "--month" | "-m" => {
                if i + 1 < args.len() {
                    month = args[i + 1].parse().unwrap_or(11);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Back Office Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./resto_dev.db)");
                println!("  -y, --year <YYYY>   Period year (default: 2025)");
                println!("  -m, --month <MM>    Period month (default: 11)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Back Office Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!("Period:   {}-{:02}", year, month);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Refuse to double-seed
    let has_runs = !db.payroll().list_runs().await?.is_empty();
    let has_staff = !db.employees().list_by_type(EmployeeType::Field).await?.is_empty();
    if has_runs || has_staff {
        println!("⚠ Database already has data");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Plans
    let field_plan = db.plans().create("Field standard", Role::Field, FIELD_BRACKETS).await?;
    db.plans().set_default(&field_plan.id).await?;
    let inside_plan = db.plans().create("Inside standard", Role::Inside, INSIDE_BRACKETS).await?;
    db.plans().set_default(&inside_plan.id).await?;
    println!("✓ Created 2 default commission plans");

    // Roster
    let mut field_ids = Vec::new();
    for name in FIELD_WORKERS {
        let e = db.employees().create(name, EmployeeType::Field, None).await?;
        field_ids.push(e.id);
    }
    for name in INSIDE_STAFF {
        db.employees().create(name, EmployeeType::Inside, None).await?;
    }
    let mut kitchen_ids = Vec::new();
    for name in KITCHEN_STAFF {
        let e = db.employees().create(name, EmployeeType::Kitchen, None).await?;
        kitchen_ids.push(e.id);
    }
    println!(
        "✓ Created {} employees",
        FIELD_WORKERS.len() + INSIDE_STAFF.len() + KITCHEN_STAFF.len()
    );

    // A month of dispatches: each field worker goes out on several days,
    // most dispatches get settled, a couple stay pending
    println!();
    println!("Generating dispatches...");

    let mut dispatches = 0usize;
    let mut settled = 0usize;

    for (widx, waiter_id) in field_ids.iter().enumerate() {
        for day in (2..=26).step_by(3 + widx % 2) {
            let date = match NaiveDate::from_ymd_opt(year, month, day as u32) {
                Some(d) => d,
                None => continue,
            };
            let (item, price_cents) = ITEMS[(widx + day) % ITEMS.len()];
            let qty = 6 + ((widx * 7 + day) % 10) as i64;

            let dispatch = db
                .dispatches()
                .create_dispatch(waiter_id, item, qty, price_cents, date)
                .await?;
            dispatches += 1;

            // Leave roughly one in eight pending
            if (widx + day) % 8 == 0 {
                continue;
            }

            let qty_returned = (qty / 4).min(qty);
            let loss_qty = if day % 9 == 0 { 1 } else { 0 };
            let sold_qty = (qty - qty_returned - loss_qty).max(0);
            let sold_cents = sold_qty * price_cents;
            // Hand in slightly less than the sold amount now and then
            let cash_cents = if day % 5 == 0 { sold_cents - sold_cents / 10 } else { sold_cents };

            db.dispatches()
                .create_return(
                    &dispatch.id,
                    NewFieldReturn {
                        qty_returned,
                        loss_qty,
                        cash_collected_cents: cash_cents,
                        note: None,
                    },
                )
                .await?;
            settled += 1;
        }
    }
    println!("✓ Created {} dispatches ({} settled)", dispatches, settled);

    // Deductions: an advance for one field worker, breakage for the cook
    db.deductions()
        .record(
            &field_ids[0],
            15_000,
            DeductionReason::Advance,
            NaiveDate::from_ymd_opt(year, month, 5).ok_or("bad period")?,
            Some("mid-month advance"),
        )
        .await?;
    db.deductions()
        .record(
            &kitchen_ids[0],
            4_500,
            DeductionReason::Breakage,
            NaiveDate::from_ymd_opt(year, month, 12).ok_or("bad period")?,
            Some("broken serving trays"),
        )
        .await?;
    println!("✓ Recorded 2 salary deductions");

    // Show what the month looks like
    let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or("bad period")?;
    let to = NaiveDate::from_ymd_opt(year, month, 28).ok_or("bad period")?;
    let report = db.commission_service().commission_report(from, to, None).await?;

    println!();
    println!("Commission report for {}-{:02}:", year, month);
    for row in &report.rows {
        println!(
            "  {:<16} sold {:>10}  commission {:>8}  days {:>2}",
            row.employee_name, row.sold_amount, row.commission, row.active_days
        );
    }
    println!("  Total commission: {}", report.total_commission);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
