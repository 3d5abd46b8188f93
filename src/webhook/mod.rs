//! Inbound webhook processing: verification, mirror reconciliation,
//! enrichment, and handler dispatch.
//!
//! The gateway treats any non-2xx acknowledgment as a delivery failure and
//! retries, which would duplicate caller side effects. Everything after the
//! token check is therefore best-effort: mirror misses, enrichment errors,
//! and handler failures are logged and absorbed, and the fixed `{"received":
//! true}` acknowledgment is returned unconditionally.

pub mod events;
mod handlers;

pub use events::{
    classify, EventCategory, EventCode, EventPayload, PaymentSnapshot, SubscriptionSnapshot,
    WebhookNotification,
};
pub use handlers::{EventHandler, HandlerError, WebhookHandlers};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::asaas::PixQrCodes;
use crate::db::{queries, AppState};
use crate::error::msg;
use crate::models::Subscription;

/// Header the gateway sends its configured shared token in.
pub const WEBHOOK_TOKEN_HEADER: &str = "asaas-access-token";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/asaas", post(handle_asaas_webhook))
}

/// Constant-time token comparison. A missing header never matches.
pub fn webhook_token_matches(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(p) if p.len() == expected.len() => p.as_bytes().ct_eq(expected.as_bytes()).into(),
        _ => false,
    }
}

/// Axum handler for the Asaas webhook endpoint.
///
/// The token check runs against the raw request before the body is even
/// parsed; a rejected notification has no side effects at all.
pub async fn handle_asaas_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(expected) = state.webhook_token.as_deref() {
        let provided = headers
            .get(WEBHOOK_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if !webhook_token_matches(provided, expected) {
            tracing::warn!("webhook rejected: missing or invalid {}", WEBHOOK_TOKEN_HEADER);
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": msg::INVALID_WEBHOOK_TOKEN })),
            )
                .into_response();
        }
    }

    let notification: WebhookNotification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("failed to parse webhook body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON" })),
            )
                .into_response();
        }
    };

    process_notification(&state, notification).await;

    // Fixed acknowledgment, unconditional on what processing achieved.
    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

/// Run the full reconciliation pass for one verified notification.
pub async fn process_notification(state: &AppState, notification: WebhookNotification) {
    let code = EventCode::parse(&notification.event);

    // Step 1: generic mirror sync, independent of the event type.
    match state.db.get() {
        Ok(conn) => {
            sync_mirrors(&conn, &notification);
            // SUBSCRIPTION_DELETED must land the mirror in CANCELED even
            // when the snapshot carries no status for the generic sync.
            if code == EventCode::SubscriptionDeleted {
                force_subscription_canceled(&conn, &notification);
            }
        }
        Err(e) => tracing::error!("mirror sync skipped, no DB connection: {}", e),
    }

    // Step 2: classification, with date disambiguation on the UTC calendar
    // day.
    let today = Utc::now().date_naive();
    let due_date = notification.payment.as_ref().and_then(|p| p.due_date);
    let category = classify(code, due_date, today);

    let mut payload = EventPayload {
        event: notification.event,
        category,
        payment: notification.payment,
        subscription: notification.subscription,
        pix_qr_code: None,
    };

    // Step 2b: Pix enrichment, single attempt, swallow on failure.
    attach_pix_qr_code(state.asaas.as_ref(), &mut payload).await;

    // Step 3: dispatch exactly one category handler.
    dispatch(&state.hooks, payload).await;
}

/// Overwrite mirror statuses from the embedded snapshots. Both updates are
/// last-write-wins by gateway id; a snapshot without id+status is skipped
/// and zero matched rows is expected (gateway-generated cycle charges have
/// no payment mirror).
pub fn sync_mirrors(conn: &Connection, notification: &WebhookNotification) {
    if let Some(sub) = &notification.subscription {
        if let (Some(id), Some(status)) = (&sub.id, &sub.status) {
            match queries::update_subscription_status_by_gateway_id(conn, id, status) {
                Ok(0) => tracing::debug!("no subscription mirror for {}", id),
                Ok(_) => {}
                Err(e) => tracing::warn!("subscription mirror sync failed for {}: {}", id, e),
            }
        }
    }

    if let Some(payment) = &notification.payment {
        if let (Some(id), Some(status)) = (&payment.id, &payment.status) {
            match queries::update_payment_status_by_gateway_id(conn, id, status) {
                Ok(0) => tracing::debug!("no payment mirror for {}", id),
                Ok(_) => {}
                Err(e) => tracing::warn!("payment mirror sync failed for {}: {}", id, e),
            }
        }
    }
}

/// Secondary update for `SUBSCRIPTION_DELETED`: the canceled status is
/// forced regardless of what (if anything) the snapshot reported.
fn force_subscription_canceled(conn: &Connection, notification: &WebhookNotification) {
    let Some(id) = notification
        .subscription
        .as_ref()
        .and_then(|s| s.id.as_deref())
    else {
        return;
    };
    match queries::update_subscription_status_by_gateway_id(conn, id, Subscription::CANCELED) {
        Ok(0) => tracing::debug!("no subscription mirror to cancel for {}", id),
        Ok(_) => tracing::info!("subscription {} marked {}", id, Subscription::CANCELED),
        Err(e) => tracing::warn!("failed to mark subscription {} canceled: {}", id, e),
    }
}

/// Fetch the Pix QR code for payment-creation class events. One attempt;
/// on failure the payload proceeds without it.
pub async fn attach_pix_qr_code<Q: PixQrCodes + ?Sized>(gateway: &Q, payload: &mut EventPayload) {
    if !payload.wants_pix_enrichment() {
        return;
    }
    // wants_pix_enrichment guarantees the id is present
    let Some(payment_id) = payload.payment.as_ref().and_then(|p| p.id.clone()) else {
        return;
    };
    match gateway.get_pix_qr_code(&payment_id).await {
        Ok(qr) => payload.pix_qr_code = Some(qr),
        Err(e) => {
            tracing::warn!("pix QR enrichment failed for {}: {}", payment_id, e);
        }
    }
}

/// Invoke the handler registered for the payload's category, if any.
/// Handler errors are logged and absorbed so the acknowledgment cannot be
/// affected by caller code.
pub async fn dispatch(handlers: &WebhookHandlers, payload: EventPayload) {
    let category = payload.category;
    let Some(handler) = handlers.handler_for(category) else {
        tracing::debug!(?category, "no handler registered");
        return;
    };

    let event = payload.event.clone();
    if let Err(e) = handler.as_ref()(payload).await {
        tracing::error!(?category, event = %event, "webhook handler failed: {}", e);
    }
}
