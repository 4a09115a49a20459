//! Stats aggregation: per-user rollups, global rollups, and the points
//! leaderboard. Every call is a stateless read derived fresh from the
//! ledger joined against the category catalog; nothing here is cached.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::TREE_CO2_KG_PER_YEAR;
use crate::error::{Error, Result};
use crate::registry::{count_users, get_user};

/// Per-user rollup joined with the user's registry fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub name: String,
    pub email: String,
    pub points: i64,
    pub joined_at: DateTime<Utc>,
    /// Sum over all entries, recycled or not
    pub total_waste_kg: f64,
    /// Sum of coefficient * weight over recycled entries, 2 decimals
    pub carbon_saved_kg: f64,
    pub recycled_count: i64,
}

/// System-wide rollup across all users and entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_waste_kg: f64,
    pub total_recycled_kg: f64,
    /// recycled / total * 100, 2 decimals; 0 when nothing is logged
    pub recycling_percentage: f64,
    pub total_users: i64,
    pub carbon_saved_kg: f64,
    /// carbon_saved_kg / 21.0, 1 decimal
    pub equivalent_trees: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// 1-based position in the ranking
    pub rank: usize,
    pub name: String,
    pub points: i64,
    pub total_waste_kg: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute a user's stats by joining their entries against the catalog.
pub fn user_stats(conn: &Connection, user_id: i64) -> Result<UserStats> {
    let user = get_user(conn, user_id)?
        .ok_or_else(|| Error::not_found(format!("user {}", user_id)))?;

    let mut stmt = conn.prepare(
        "SELECT we.weight_kg, wc.carbon_reduction, we.is_recycled
         FROM waste_entries we
         JOIN waste_categories wc ON we.category_id = wc.id
         WHERE we.user_id = ?1",
    )?;

    let rows = stmt
        .query_map(params![user_id], |row| {
            let weight_kg: f64 = row.get(0)?;
            let coefficient: f64 = row.get(1)?;
            let is_recycled: bool = row.get(2)?;
            Ok((weight_kg, coefficient, is_recycled))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut total_waste_kg = 0.0;
    let mut carbon_saved_kg = 0.0;
    let mut recycled_count = 0;

    for (weight_kg, coefficient, is_recycled) in rows {
        total_waste_kg += weight_kg;
        if is_recycled {
            carbon_saved_kg += coefficient * weight_kg;
            recycled_count += 1;
        }
    }

    Ok(UserStats {
        name: user.name,
        email: user.email,
        points: user.points,
        joined_at: user.joined_at,
        total_waste_kg,
        carbon_saved_kg: round2(carbon_saved_kg),
        recycled_count,
    })
}

/// System-wide totals. All sums default to 0 on an empty ledger, and the
/// recycling percentage is defined as 0 when no waste has been logged.
pub fn global_stats(conn: &Connection) -> Result<GlobalStats> {
    let total_waste_kg: f64 = conn.query_row(
        "SELECT COALESCE(SUM(weight_kg), 0) FROM waste_entries",
        [],
        |row| row.get(0),
    )?;

    let total_recycled_kg: f64 = conn.query_row(
        "SELECT COALESCE(SUM(weight_kg), 0) FROM waste_entries WHERE is_recycled = 1",
        [],
        |row| row.get(0),
    )?;

    let carbon_saved_kg: f64 = conn.query_row(
        "SELECT COALESCE(SUM(wc.carbon_reduction * we.weight_kg), 0)
         FROM waste_entries we
         JOIN waste_categories wc ON we.category_id = wc.id
         WHERE we.is_recycled = 1",
        [],
        |row| row.get(0),
    )?;

    let recycling_percentage = if total_waste_kg > 0.0 {
        round2(total_recycled_kg / total_waste_kg * 100.0)
    } else {
        0.0
    };

    Ok(GlobalStats {
        total_waste_kg,
        total_recycled_kg,
        recycling_percentage,
        total_users: count_users(conn)?,
        carbon_saved_kg: round2(carbon_saved_kg),
        equivalent_trees: round1(carbon_saved_kg / TREE_CO2_KG_PER_YEAR),
    })
}

/// Top users by points, descending. Ties keep registration order (id order),
/// so the ranking is deterministic. Truncated to `limit` rows.
pub fn leaderboard(conn: &Connection, limit: usize) -> Result<Vec<LeaderboardRow>> {
    let mut stmt = conn.prepare(
        "SELECT name, points,
                COALESCE((SELECT SUM(weight_kg) FROM waste_entries
                          WHERE user_id = users.id), 0) AS total_waste
         FROM users
         ORDER BY points DESC, id ASC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let board = rows
        .into_iter()
        .enumerate()
        .map(|(i, (name, points, total_waste_kg))| LeaderboardRow {
            rank: i + 1,
            name,
            points,
            total_waste_kg,
        })
        .collect();

    Ok(board)
}
