use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Fixed yearly CO2 absorption of one tree (kg). Documented approximation
/// behind the equivalent-trees estimate, not configurable.
pub const TREE_CO2_KG_PER_YEAR: f64 = 21.0;

// ============================================================================
// MODELS
// ============================================================================

/// Waste category with a fixed carbon-reduction coefficient.
/// Seed data: created once at initialization, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// kg CO2 saved per kg recycled
    pub carbon_reduction: f64,
    pub recyclable: bool,
}

/// Registered user. `points` only increase, mutated solely by the
/// point-award rule on recycled ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub points: i64,
    pub joined_at: DateTime<Utc>,
}

/// One logged waste-disposal event. Append-only: never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub weight_kg: f64,
    pub is_recycled: bool,
    pub logged_at: DateTime<Utc>,
}

// ============================================================================
// SCHEMA SETUP + SEED DATA
// ============================================================================

/// The 7 fixed categories: (name, description, coefficient, recyclable).
const CATEGORY_SEED: [(&str, &str, f64, bool); 7] = [
    ("Plastic", "Plastic bottles, bags, containers", 2.5, true),
    ("Paper", "Newspapers, cardboard, office paper", 3.2, true),
    ("Glass", "Glass bottles and jars", 2.8, true),
    ("Metal", "Aluminum cans, steel containers", 4.1, true),
    ("Organic", "Food waste, garden waste", 1.5, true),
    ("E-Waste", "Electronics, batteries, cables", 5.0, true),
    ("Mixed Waste", "General garbage", 0.0, false),
];

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            points INTEGER NOT NULL DEFAULT 0,
            joined_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS waste_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            carbon_reduction REAL NOT NULL,
            recyclable INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS waste_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            category_id INTEGER NOT NULL REFERENCES waste_categories(id),
            weight_kg REAL NOT NULL,
            is_recycled INTEGER NOT NULL DEFAULT 1,
            logged_at TEXT NOT NULL
        )",
        [],
    )?;

    // Per-user join is the hot path for stats
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_user ON waste_entries(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_category ON waste_entries(category_id)",
        [],
    )?;

    seed_categories(conn)?;

    Ok(())
}

/// Insert the fixed category rows once; no-op when already seeded.
fn seed_categories(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM waste_categories", [], |row| {
        row.get(0)
    })?;

    if count > 0 {
        return Ok(());
    }

    for (name, description, carbon_reduction, recyclable) in CATEGORY_SEED {
        conn.execute(
            "INSERT INTO waste_categories (name, description, carbon_reduction, recyclable)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, description, carbon_reduction, recyclable],
        )?;
    }

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// Timestamps are persisted as RFC 3339 text.
pub(crate) fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        carbon_reduction: row.get(3)?,
        recyclable: row.get(4)?,
    })
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let joined_at_str: String = row.get(4)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        points: row.get(3)?,
        joined_at: parse_timestamp(&joined_at_str)?,
    })
}

pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let logged_at_str: String = row.get(5)?;

    Ok(LedgerEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        weight_kg: row.get(3)?,
        is_recycled: row.get(4)?,
        logged_at: parse_timestamp(&logged_at_str)?,
    })
}

// ============================================================================
// CATALOG QUERIES
// ============================================================================

/// All categories in seed order (id ascending).
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, carbon_reduction, recyclable
         FROM waste_categories
         ORDER BY id",
    )?;

    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

pub fn get_category(conn: &Connection, category_id: i64) -> Result<Option<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, carbon_reduction, recyclable
         FROM waste_categories
         WHERE id = ?1",
    )?;

    let mut rows = stmt.query_map(params![category_id], category_from_row)?;

    match rows.next() {
        Some(category) => Ok(Some(category?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_seed_categories_once() {
        let conn = test_conn();

        let categories = list_categories(&conn).unwrap();
        assert_eq!(categories.len(), 7, "Seed should create exactly 7 categories");

        // Running setup again must not duplicate the seed rows
        setup_database(&conn).unwrap();
        let categories = list_categories(&conn).unwrap();
        assert_eq!(categories.len(), 7, "Re-running setup should not re-seed");
    }

    #[test]
    fn test_seed_values() {
        let conn = test_conn();
        let categories = list_categories(&conn).unwrap();

        let plastic = &categories[0];
        assert_eq!(plastic.name, "Plastic");
        assert_eq!(plastic.carbon_reduction, 2.5);
        assert!(plastic.recyclable);

        let mixed = categories.iter().find(|c| c.name == "Mixed Waste").unwrap();
        assert_eq!(mixed.carbon_reduction, 0.0);
        assert!(!mixed.recyclable, "Mixed Waste must be non-recyclable");
    }

    #[test]
    fn test_get_category_unknown() {
        let conn = test_conn();
        assert!(get_category(&conn, 999).unwrap().is_none());
    }
}
