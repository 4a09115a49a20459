// EcoWaste Tracker - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod db;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod stats;

// Re-export commonly used types
pub use db::{
    get_category, list_categories, setup_database, Category, LedgerEntry, User,
    TREE_CO2_KG_PER_YEAR,
};
pub use error::{Error, Result};
pub use ledger::{count_entries, export_ledger_csv, list_entries, log_waste, points_for_weight};
pub use registry::{award_points, count_users, get_user, register};
pub use stats::{global_stats, leaderboard, user_stats, GlobalStats, LeaderboardRow, UserStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default leaderboard size when the caller does not pass a limit.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
