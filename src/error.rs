// Typed failures surfaced by every core operation.
// The transport layer maps these to response codes; the core never panics.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input (empty name/email, negative weight)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown user_id or category_id
    #[error("not found: {0}")]
    NotFound(String),

    /// Reserved for future write conflicts. Duplicate email registration
    /// is deliberately absorbed (returns the existing id) and never maps here.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage-layer failure
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// Ledger export failure
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }
}

#[cfg(feature = "server")]
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;

        let status = match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Db(_) | Error::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
