use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx response from the Asaas API. The body is the gateway's own
    /// error JSON; callers that need finer distinctions inspect it.
    #[error("Gateway error ({status}): {body}")]
    Gateway { status: u16, body: String },

    #[error("Gateway transport error: {0}")]
    GatewayTransport(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable error message constants shared by handlers and tests.
pub mod msg {
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const SUBSCRIPTION_NOT_FOUND: &str = "Subscription not found";
    pub const PAYMENT_NOT_FOUND: &str = "Payment not found";
    pub const EMAIL_TAKEN: &str = "A user with this email already exists";
    pub const INVALID_VALUE: &str = "value must be greater than zero";
    pub const NOT_PIX: &str = "Payment is not a Pix charge";
    pub const INVALID_WEBHOOK_TOKEN: &str = "Invalid webhook token";
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Gateway { status, body } => {
                tracing::error!("Asaas error ({}): {}", status, body);
                // The gateway rejected the request; its error body describes
                // the caller's input, not our internals, so relay it.
                (StatusCode::BAD_GATEWAY, "Payment gateway error", Some(body.clone()))
            }
            AppError::GatewayTransport(e) => {
                tracing::error!("Asaas transport error: {}", e);
                (StatusCode::BAD_GATEWAY, "Payment gateway unreachable", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Shorthand for the common `Option -> NotFound` conversion in handlers.
pub trait OptionExt<T> {
    fn or_not_found(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
