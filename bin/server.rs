// EcoWaste Tracker - Web Server
// REST API with Axum over the core library

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use waste_tracker::{
    global_stats, leaderboard, list_categories, log_waste, register, setup_database, user_stats,
    Error, DEFAULT_LEADERBOARD_LIMIT,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

// ============================================================================
// Request / Response Shapes
// ============================================================================

#[derive(Deserialize)]
struct CreateUserRequest {
    name: String,
    email: String,
}

#[derive(Serialize)]
struct CreateUserResponse {
    user_id: i64,
}

#[derive(Deserialize)]
struct LogWasteRequest {
    user_id: i64,
    category_id: i64,
    weight_kg: f64,
    #[serde(default = "default_recycled")]
    is_recycled: bool,
}

fn default_recycled() -> bool {
    true
}

#[derive(Serialize)]
struct LogWasteResponse {
    entry_id: i64,
    stats: waste_tracker::UserStats,
}

#[derive(Deserialize)]
struct LeaderboardParams {
    limit: Option<usize>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/users - Register a user (idempotent by email)
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, Error> {
    let conn = state.db.lock().unwrap();
    let user_id = register(&conn, &req.name, &req.email)?;

    Ok(Json(ApiResponse::ok(CreateUserResponse { user_id })))
}

/// GET /api/users/:id/stats - Per-user statistics
async fn get_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let conn = state.db.lock().unwrap();
    let stats = user_stats(&conn, user_id)?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// POST /api/waste - Log a waste entry, returns the user's updated stats
async fn create_waste_entry(
    State(state): State<AppState>,
    Json(req): Json<LogWasteRequest>,
) -> Result<impl IntoResponse, Error> {
    let mut conn = state.db.lock().unwrap();

    let entry_id = log_waste(
        &mut conn,
        req.user_id,
        req.category_id,
        req.weight_kg,
        req.is_recycled,
    )?;
    let stats = user_stats(&conn, req.user_id)?;

    Ok(Json(ApiResponse::ok(LogWasteResponse { entry_id, stats })))
}

/// GET /api/global-stats - System-wide statistics
async fn get_global_stats(State(state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let conn = state.db.lock().unwrap();
    let stats = global_stats(&conn)?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/leaderboard?limit=N - Top users by points
async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, Error> {
    let conn = state.db.lock().unwrap();
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let board = leaderboard(&conn, limit)?;

    Ok(Json(ApiResponse::ok(board)))
}

/// GET /api/categories - The fixed category catalog
async fn get_categories(State(state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let conn = state.db.lock().unwrap();
    let categories = list_categories(&conn)?;

    Ok(Json(ApiResponse::ok(categories)))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("♻️  EcoWaste Tracker - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("WASTE_DB").unwrap_or_else(|_| "data/waste.db".to_string());

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).expect("Failed to create database directory");
        }
    }

    let conn = Connection::open(&db_path).expect("Failed to open database");
    setup_database(&conn).expect("Failed to initialize database");
    println!("✓ Database ready: {}", db_path);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users", post(create_user))
        .route("/users/:id/stats", get(get_user_stats))
        .route("/waste", post(create_waste_entry))
        .route("/global-stats", get(get_global_stats))
        .route("/leaderboard", get(get_leaderboard))
        .route("/categories", get(get_categories))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/global-stats");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
