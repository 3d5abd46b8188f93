//! One-time payment endpoints (Pix, Boleto, credit card).

use axum::extract::{Path, State};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::asaas::{self, PixQrCode, PixQrCodes};
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Query};
use crate::handlers::customer::ensure_customer;
use crate::middleware::SessionUser;
use crate::models::{BillingType, NewPayment, Payment};
use crate::pagination::{Paginated, PaginationQuery};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub billing_type: BillingType,
    pub value: f64,
    /// Defaults to today.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    /// Card data is forwarded to the gateway verbatim and never stored.
    #[serde(default)]
    pub credit_card: Option<asaas::CreditCard>,
    #[serde(default)]
    pub credit_card_holder_info: Option<asaas::CreditCardHolderInfo>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<Payment>> {
    if request.value <= 0.0 {
        return Err(AppError::BadRequest(msg::INVALID_VALUE.into()));
    }

    let customer_id = ensure_customer(&state, &user, None).await?;

    let due_date = request.due_date.unwrap_or_else(|| Utc::now().date_naive());

    let gateway_payment = state
        .asaas
        .create_payment(&asaas::CreatePaymentRequest {
            customer: customer_id,
            billing_type: request.billing_type,
            value: request.value,
            due_date,
            description: request.description.clone(),
            external_reference: request.external_reference.clone(),
            credit_card: request.credit_card.clone(),
            credit_card_holder_info: request.credit_card_holder_info.clone(),
        })
        .await?;

    let conn = state.db.get()?;
    let payment = queries::create_payment(
        &conn,
        &user.id,
        &NewPayment {
            asaas_payment_id: gateway_payment.id,
            status: gateway_payment
                .status
                .unwrap_or_else(|| Payment::PENDING.to_string()),
            billing_type: request.billing_type,
            value: request.value,
            due_date: gateway_payment.due_date.or(Some(due_date)),
            description: request.description,
            invoice_url: gateway_payment.invoice_url,
            bank_slip_url: gateway_payment.bank_slip_url,
            pix_qr_code_id: None,
            external_reference: request.external_reference,
        },
    )?;

    tracing::info!(
        "payment created: user={}, payment={}, gateway={}, billing_type={}",
        user.id,
        payment.id,
        payment.asaas_payment_id,
        payment.billing_type
    );

    Ok(Json(payment))
}

pub async fn list_payments(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<Payment>>> {
    let conn = state.db.get()?;
    let (limit, offset) = (pagination.limit(), pagination.offset());
    let items = queries::list_payments_by_user(&conn, &user.id, limit, offset)?;
    let total = queries::count_payments_by_user(&conn, &user.id)?;
    Ok(Json(Paginated::new(items, total, limit, offset)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Payment>> {
    let conn = state.db.get()?;
    let payment = owned_payment(&conn, &user.id, &id)?;
    Ok(Json(payment))
}

/// GET /billing/payments/{id}/pix - QR code for an own Pix charge.
pub async fn get_payment_pix_qr_code(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
) -> Result<Json<PixQrCode>> {
    let conn = state.db.get()?;
    let payment = owned_payment(&conn, &user.id, &id)?;

    if payment.billing_type != BillingType::Pix {
        return Err(AppError::BadRequest(msg::NOT_PIX.into()));
    }

    let qr = state
        .asaas
        .get_pix_qr_code(&payment.asaas_payment_id)
        .await?;
    Ok(Json(qr))
}

/// DELETE /billing/payments/{id} - cancel at the gateway, then transition
/// the mirror to DELETED. The row is never removed.
pub async fn cancel_payment(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Payment>> {
    let conn = state.db.get()?;
    let payment = owned_payment(&conn, &user.id, &id)?;

    state.asaas.delete_payment(&payment.asaas_payment_id).await?;

    queries::update_payment_status(&conn, &payment.id, Payment::DELETED)?;
    let payment =
        queries::get_payment_by_id(&conn, &payment.id)?.or_not_found(msg::PAYMENT_NOT_FOUND)?;

    tracing::info!("payment canceled: user={}, payment={}", user.id, payment.id);

    Ok(Json(payment))
}

/// Fetch a payment and enforce that the caller owns it. A foreign row reads
/// as not-found rather than forbidden to avoid leaking ids.
fn owned_payment(conn: &rusqlite::Connection, user_id: &str, id: &str) -> Result<Payment> {
    let payment = queries::get_payment_by_id(conn, id)?.or_not_found(msg::PAYMENT_NOT_FOUND)?;
    if payment.user_id != user_id {
        return Err(AppError::NotFound(msg::PAYMENT_NOT_FOUND.into()));
    }
    Ok(payment)
}
