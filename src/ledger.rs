//! Append-only ledger of waste-disposal events.
//!
//! Logging a recycled entry awards `floor(weight_kg * 10)` points to the
//! user inside the same SQLite transaction as the insert, so a reader can
//! never observe an entry without its point award (or vice versa).

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::{entry_from_row, get_category, LedgerEntry};
use crate::error::{Error, Result};
use crate::registry::{award_points, get_user};

/// Points awarded for a recycled entry of the given weight.
pub fn points_for_weight(weight_kg: f64) -> i64 {
    (weight_kg * 10.0).floor() as i64
}

/// Append a waste entry. Validates the weight and both foreign keys;
/// entry insert and point award commit or roll back together.
pub fn log_waste(
    conn: &mut Connection,
    user_id: i64,
    category_id: i64,
    weight_kg: f64,
    is_recycled: bool,
) -> Result<i64> {
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(Error::validation(format!(
            "weight_kg must be a non-negative number, got {}",
            weight_kg
        )));
    }

    let tx = conn.transaction()?;

    if get_user(&tx, user_id)?.is_none() {
        return Err(Error::not_found(format!("user {}", user_id)));
    }
    if get_category(&tx, category_id)?.is_none() {
        return Err(Error::not_found(format!("category {}", category_id)));
    }

    tx.execute(
        "INSERT INTO waste_entries (user_id, category_id, weight_kg, is_recycled, logged_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            category_id,
            weight_kg,
            is_recycled,
            Utc::now().to_rfc3339()
        ],
    )?;
    let entry_id = tx.last_insert_rowid();

    // Points are a reward for the recycling action, awarded at write time
    if is_recycled {
        award_points(&tx, user_id, points_for_weight(weight_kg))?;
    }

    tx.commit()?;

    Ok(entry_id)
}

/// All of one user's entries, oldest first.
pub fn list_entries(conn: &Connection, user_id: i64) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, category_id, weight_kg, is_recycled, logged_at
         FROM waste_entries
         WHERE user_id = ?1
         ORDER BY id",
    )?;

    let entries = stmt
        .query_map(params![user_id], entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}

pub fn count_entries(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM waste_entries", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// CSV EXPORT
// ============================================================================

/// One exported ledger row, entry fields joined with user and category names.
#[derive(Debug, Serialize)]
struct ExportRow {
    entry_id: i64,
    user: String,
    category: String,
    weight_kg: f64,
    is_recycled: bool,
    logged_at: String,
}

/// Dump the full ledger to a CSV file. Returns the number of rows written.
pub fn export_ledger_csv(conn: &Connection, path: &Path) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT we.id, u.name, wc.name, we.weight_kg, we.is_recycled, we.logged_at
         FROM waste_entries we
         JOIN users u ON we.user_id = u.id
         JOIN waste_categories wc ON we.category_id = wc.id
         ORDER BY we.id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ExportRow {
                entry_id: row.get(0)?,
                user: row.get(1)?,
                category: row.get(2)?,
                weight_kg: row.get(3)?,
                is_recycled: row.get(4)?,
                logged_at: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut wtr = csv::Writer::from_path(path)?;
    let mut written = 0;
    for row in &rows {
        wtr.serialize(row)?;
        written += 1;
    }
    wtr.flush().map_err(csv::Error::from)?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::registry::register;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_points_for_weight_floors() {
        assert_eq!(points_for_weight(2.0), 20);
        assert_eq!(points_for_weight(1.99), 19);
        assert_eq!(points_for_weight(0.05), 0);
        assert_eq!(points_for_weight(0.0), 0);
    }

    #[test]
    fn test_log_waste_awards_points_for_recycled() {
        let mut conn = test_conn();
        let user_id = register(&conn, "Asha", "a@x.com").unwrap();

        log_waste(&mut conn, user_id, 1, 2.0, true).unwrap();

        let user = get_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(user.points, 20, "2.0 kg recycled = 20 points");
    }

    #[test]
    fn test_log_waste_no_points_for_unrecycled() {
        let mut conn = test_conn();
        let user_id = register(&conn, "Asha", "a@x.com").unwrap();

        log_waste(&mut conn, user_id, 7, 1.0, false).unwrap();

        let user = get_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(user.points, 0, "Unrecycled waste earns no points");
        assert_eq!(count_entries(&conn).unwrap(), 1);
    }

    #[test]
    fn test_log_waste_negative_weight_leaves_no_trace() {
        let mut conn = test_conn();
        let user_id = register(&conn, "Asha", "a@x.com").unwrap();

        let result = log_waste(&mut conn, user_id, 1, -1.0, true);
        assert!(matches!(result, Err(Error::Validation(_))));

        assert_eq!(count_entries(&conn).unwrap(), 0, "Ledger unchanged");
        let user = get_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(user.points, 0, "Points unchanged");
    }

    #[test]
    fn test_log_waste_unknown_foreign_keys() {
        let mut conn = test_conn();
        let user_id = register(&conn, "Asha", "a@x.com").unwrap();

        assert!(matches!(
            log_waste(&mut conn, 999, 1, 1.0, true),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            log_waste(&mut conn, user_id, 999, 1.0, true),
            Err(Error::NotFound(_))
        ));
        assert_eq!(count_entries(&conn).unwrap(), 0);
    }

    #[test]
    fn test_points_invariant_over_sequence() {
        let mut conn = test_conn();
        let user_id = register(&conn, "Asha", "a@x.com").unwrap();

        // Mixed sequence of recycled and non-recycled entries
        log_waste(&mut conn, user_id, 1, 2.5, true).unwrap();
        log_waste(&mut conn, user_id, 2, 1.19, true).unwrap();
        log_waste(&mut conn, user_id, 7, 4.0, false).unwrap();
        log_waste(&mut conn, user_id, 3, 0.33, true).unwrap();

        let expected: i64 = [2.5, 1.19, 0.33]
            .iter()
            .map(|w| points_for_weight(*w))
            .sum();

        let user = get_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(
            user.points, expected,
            "points == sum of floor(weight*10) over recycled entries"
        );
    }

    #[test]
    fn test_export_ledger_csv() {
        let mut conn = test_conn();
        let user_id = register(&conn, "Asha", "a@x.com").unwrap();
        log_waste(&mut conn, user_id, 1, 2.0, true).unwrap();
        log_waste(&mut conn, user_id, 7, 1.0, false).unwrap();

        let dir = std::env::temp_dir();
        let path = dir.join("waste_tracker_export_test.csv");
        let written = export_ledger_csv(&conn, &path).unwrap();
        assert_eq!(written, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Asha"));
        assert!(contents.contains("Plastic"));
        assert!(contents.contains("Mixed Waste"));

        let _ = std::fs::remove_file(&path);
    }
}
