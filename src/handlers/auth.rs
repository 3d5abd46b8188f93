//! Sign-up and session issuance.
//!
//! This is deliberately minimal: Cobranca is a billing bridge, and
//! credential management (passwords, OAuth) belongs to the application in
//! front of it. Sign-up creates the account, provisions the gateway
//! customer, and returns the bearer token billing endpoints authenticate
//! with.

use axum::extract::State;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::handlers::customer::ensure_customer;
use crate::models::{CreateUser, User};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    /// Bearer token for billing endpoints. Shown once; stored hashed.
    pub token: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> Result<Json<SessionResponse>> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let conn = state.db.get()?;

    if queries::get_user_by_email(&conn, &request.email)?.is_some() {
        return Err(AppError::Conflict(msg::EMAIL_TAKEN.into()));
    }

    let mut user = queries::create_user(&conn, &request)?;

    // Provision the gateway customer record. Failure is non-fatal: the
    // find-or-create in ensure_customer runs again on the first billing
    // call, and keying on externalReference keeps retries idempotent.
    match ensure_customer(&state, &user, request.cpf_cnpj.as_deref()).await {
        Ok(customer_id) => user.asaas_customer_id = Some(customer_id),
        Err(e) => {
            tracing::warn!(
                "customer provisioning deferred for {}: {}",
                user.id,
                e
            );
        }
    }

    let token = queries::create_session(&conn, &user.id, state.session_ttl_secs)?;

    tracing::info!("user signed up: {}", user.id);

    Ok(Json(SessionResponse { user, token }))
}
