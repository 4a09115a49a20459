use anyhow::Result;
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};

// Use library instead of local modules
use waste_tracker::{export_ledger_csv, global_stats, leaderboard, setup_database};

/// Database path: WASTE_DB env var, or data/waste.db next to the binary.
fn db_path() -> PathBuf {
    env::var("WASTE_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/waste.db"))
}

fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    Ok(conn)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(),
        Some("stats") => run_stats(),
        Some("export") => {
            let out = args
                .get(2)
                .map(String::as_str)
                .unwrap_or("waste_ledger.csv");
            run_export(Path::new(out))
        }
        _ => {
            eprintln!("Usage: waste-tracker <init|stats|export [path]>");
            eprintln!("  init          create the database and seed the category catalog");
            eprintln!("  stats         print global recycling statistics");
            eprintln!("  export [path] dump the waste ledger to CSV (default waste_ledger.csv)");
            std::process::exit(1);
        }
    }
}

fn run_init() -> Result<()> {
    let path = db_path();

    println!("🗄️  Initializing waste database at {:?}", path);
    let conn = open_db(&path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");
    println!("✓ Category catalog seeded (7 categories)");

    Ok(())
}

fn run_stats() -> Result<()> {
    let path = db_path();
    let conn = open_db(&path)?;
    setup_database(&conn)?;

    let stats = global_stats(&conn)?;

    println!("♻️  Global recycling statistics");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total waste logged:   {:.2} kg", stats.total_waste_kg);
    println!("Total recycled:       {:.2} kg", stats.total_recycled_kg);
    println!("Recycling rate:       {:.2} %", stats.recycling_percentage);
    println!("Registered users:     {}", stats.total_users);
    println!("Carbon saved:         {:.2} kg CO2", stats.carbon_saved_kg);
    println!("Equivalent trees:     {:.1}", stats.equivalent_trees);

    let board = leaderboard(&conn, waste_tracker::DEFAULT_LEADERBOARD_LIMIT)?;
    if !board.is_empty() {
        println!("\n🏆 Leaderboard");
        for row in &board {
            println!(
                "  {:>2}. {:<20} {:>6} pts  {:>8.2} kg",
                row.rank, row.name, row.points, row.total_waste_kg
            );
        }
    }

    Ok(())
}

fn run_export(out: &Path) -> Result<()> {
    let path = db_path();
    let conn = open_db(&path)?;
    setup_database(&conn)?;

    println!("📂 Exporting ledger to {:?}...", out);
    let written = export_ledger_csv(&conn, out)?;
    println!("✓ Exported {} entries", written);

    Ok(())
}
