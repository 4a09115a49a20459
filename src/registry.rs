//! User registry: registration keyed by unique email, plus the
//! monotonic point accumulator mutated by the ledger's award rule.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::{user_from_row, User};
use crate::error::{Error, Result};

/// Register a user, idempotent by email: if the email is already known the
/// existing id is returned and no second row is created.
pub fn register(conn: &Connection, name: &str, email: &str) -> Result<i64> {
    let name = name.trim();
    let email = email.trim();

    if name.is_empty() {
        return Err(Error::validation("name must not be empty"));
    }
    if email.is_empty() {
        return Err(Error::validation("email must not be empty"));
    }

    let result = conn.execute(
        "INSERT INTO users (name, email, points, joined_at) VALUES (?1, ?2, 0, ?3)",
        params![name, email, Utc::now().to_rfc3339()],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            // Duplicate email is absorbed, not an error
            let id = conn.query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )?;
            Ok(id)
        }
        Err(e) => Err(e.into()),
    }
}

/// Add `delta` points to a user's total. The system only ever issues
/// non-negative deltas; `points` never decreases.
pub fn award_points(conn: &Connection, user_id: i64, delta: i64) -> Result<()> {
    if delta < 0 {
        return Err(Error::validation("point delta must not be negative"));
    }

    let updated = conn.execute(
        "UPDATE users SET points = points + ?1 WHERE id = ?2",
        params![delta, user_id],
    )?;

    if updated == 0 {
        return Err(Error::not_found(format!("user {}", user_id)));
    }

    Ok(())
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, points, joined_at FROM users WHERE id = ?1",
    )?;

    let mut rows = stmt.query_map(params![user_id], user_from_row)?;

    match rows.next() {
        Some(user) => Ok(Some(user?)),
        None => Ok(None),
    }
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}
