pub mod auth;
pub mod customer;
pub mod payments;
pub mod subscriptions;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Account surface
        .route("/auth/sign-up", post(auth::sign_up))
        // Session-gated billing surface; every handler takes SessionUser
        // and operates only on the caller's own rows
        .route("/billing/customer", get(customer::get_customer))
        .route("/billing/subscriptions", post(subscriptions::create_subscription))
        .route("/billing/subscriptions", get(subscriptions::list_subscriptions))
        .route("/billing/subscriptions/{id}", get(subscriptions::get_subscription))
        .route("/billing/subscriptions/{id}", delete(subscriptions::cancel_subscription))
        .route("/billing/payments", post(payments::create_payment))
        .route("/billing/payments", get(payments::list_payments))
        .route("/billing/payments/{id}", get(payments::get_payment))
        .route("/billing/payments/{id}", delete(payments::cancel_payment))
        .route("/billing/payments/{id}/pix", get(payments::get_payment_pix_qr_code))
}

async fn health() -> &'static str {
    "OK"
}
