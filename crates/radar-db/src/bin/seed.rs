//! # Seed Data Generator
//!
//! Provisions development facilities so the hub has something to serve.
//!
//! ## Usage
//! ```bash
//! # Seed the default facility set
//! cargo run -p radar-db --bin seed
//!
//! # Seed specific identifiers
//! cargo run -p radar-db --bin seed -- --facility ZTL --facility A80
//!
//! # Specify database path
//! cargo run -p radar-db --bin seed -- --db ./data/radar.db
//! ```
//!
//! ## Seeded Facilities
//! Default set is a handful of ARTCC/TRACON codes, each with a short split
//! list and one NOTAM so subscribers see non-empty snapshots. Identifiers
//! that already exist are skipped.

use radar_core::validation::validate_facility_identifier;
use radar_core::Facility;
use radar_db::{Database, DbConfig, DbError};
use std::env;

/// Default facilities with their initial split assignments and NOTAMs.
const FACILITIES: &[(&str, &[&str], &[&str])] = &[
    (
        "ZTL",
        &["North: 33, 34, 35", "South: 36, 37", "East: 38"],
        &["ATL RWY 8L/26R CLSD 0400-1000Z"],
    ),
    (
        "ZJX",
        &["Coastal: 10, 11", "Inland: 12, 13, 14"],
        &["R-2910 ACTIVE SFC-FL230"],
    ),
    (
        "A80",
        &["Arrivals: AR1, AR2", "Departures: DR1, DR2", "", "Satellites: SAT"],
        &["PDK ILS 21L OTS"],
    ),
    ("ZDC", &["Combined"], &[]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./radar_dev.db");
    let mut only: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--facility" | "-f" => {
                if i + 1 < args.len() {
                    only.push(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Radar Config Sync Seed Tool");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./radar_dev.db)");
                println!("  -f, --facility <CODE>  Seed only this identifier (repeatable)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Radar Config Sync Seed Tool");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let facilities = build_facilities(&only)?;

    let mut created = 0;
    for facility in &facilities {
        match db.facilities().insert(facility).await {
            Ok(_) => {
                created += 1;
                println!(
                    "  + {} ({})",
                    facility.facility_identifier, facility.id
                );
            }
            Err(DbError::UniqueViolation { .. }) => {
                println!("  = {} already exists, skipped", facility.facility_identifier);
            }
            Err(e) => {
                eprintln!("Failed to insert {}: {}", facility.facility_identifier, e);
            }
        }
    }

    println!();
    println!(
        "✓ Seed complete: {} created, {} total",
        created,
        db.facilities().count().await?
    );

    Ok(())
}

/// Builds the facilities to insert.
///
/// Identifiers passed on the command line that are not in the default set
/// are provisioned with empty lists.
fn build_facilities(only: &[String]) -> Result<Vec<Facility>, Box<dyn std::error::Error>> {
    if only.is_empty() {
        return Ok(FACILITIES
            .iter()
            .map(|(code, split, notices)| {
                Facility::new(*code)
                    .with_split_assignments(split.iter().copied())
                    .with_notices(notices.iter().copied())
            })
            .collect());
    }

    let mut out = Vec::with_capacity(only.len());
    for code in only {
        validate_facility_identifier(code)?;
        let facility = match FACILITIES.iter().find(|(c, _, _)| c == code) {
            Some((c, split, notices)) => Facility::new(*c)
                .with_split_assignments(split.iter().copied())
                .with_notices(notices.iter().copied()),
            None => Facility::new(code.clone()),
        };
        out.push(facility);
    }
    Ok(out)
}
