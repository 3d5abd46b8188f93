//! Subscription lifecycle endpoints.

use axum::extract::{Path, State};
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;

use crate::asaas;
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Query};
use crate::handlers::customer::ensure_customer;
use crate::middleware::SessionUser;
use crate::models::{BillingCycle, BillingType, NewSubscription, Subscription};
use crate::pagination::{Paginated, PaginationQuery};

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub billing_type: BillingType,
    pub value: f64,
    #[serde(default)]
    pub cycle: BillingCycle,
    /// First charge date. Defaults to today, or to the trial end when
    /// `trial_days` is given.
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    /// Free-trial length. The subscription is active immediately; the
    /// trial only pushes the first charge out.
    #[serde(default)]
    pub trial_days: Option<u32>,
    #[serde(default)]
    pub credit_card: Option<asaas::CreditCard>,
    #[serde(default)]
    pub credit_card_holder_info: Option<asaas::CreditCardHolderInfo>,
}

/// Resolve the first due date and trial end from the request.
///
/// An explicit `next_due_date` wins; `trial_days` still records the trial
/// end. With neither, the first charge is due today.
pub(crate) fn resolve_schedule(
    today: NaiveDate,
    next_due_date: Option<NaiveDate>,
    trial_days: Option<u32>,
) -> (NaiveDate, Option<NaiveDate>) {
    let trial_ends_at = trial_days.map(|days| today + Days::new(u64::from(days)));
    let next_due = next_due_date.or(trial_ends_at).unwrap_or(today);
    (next_due, trial_ends_at)
}

pub async fn create_subscription(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<Json<Subscription>> {
    if request.value <= 0.0 {
        return Err(AppError::BadRequest(msg::INVALID_VALUE.into()));
    }

    let customer_id = ensure_customer(&state, &user, None).await?;

    let today = Utc::now().date_naive();
    let (next_due_date, trial_ends_at) =
        resolve_schedule(today, request.next_due_date, request.trial_days);

    let gateway_sub = state
        .asaas
        .create_subscription(&asaas::CreateSubscriptionRequest {
            customer: customer_id,
            billing_type: request.billing_type,
            value: request.value,
            next_due_date,
            cycle: request.cycle,
            description: request.description.clone(),
            external_reference: request.external_reference.clone(),
            credit_card: request.credit_card.clone(),
            credit_card_holder_info: request.credit_card_holder_info.clone(),
        })
        .await?;

    let conn = state.db.get()?;
    let subscription = queries::create_subscription(
        &conn,
        &user.id,
        &NewSubscription {
            asaas_subscription_id: gateway_sub.id,
            // A trialing subscription is active, not pending: the gateway
            // reports ACTIVE from creation and the trial only defers the
            // first charge.
            status: gateway_sub
                .status
                .unwrap_or_else(|| Subscription::ACTIVE.to_string()),
            billing_type: request.billing_type,
            value: request.value,
            cycle: request.cycle,
            next_due_date: gateway_sub.next_due_date.or(Some(next_due_date)),
            description: request.description,
            external_reference: request.external_reference,
            trial_ends_at,
        },
    )?;

    tracing::info!(
        "subscription created: user={}, subscription={}, gateway={}",
        user.id,
        subscription.id,
        subscription.asaas_subscription_id
    );

    Ok(Json(subscription))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<Subscription>>> {
    let conn = state.db.get()?;
    let (limit, offset) = (pagination.limit(), pagination.offset());
    let items = queries::list_subscriptions_by_user(&conn, &user.id, limit, offset)?;
    let total = queries::count_subscriptions_by_user(&conn, &user.id)?;
    Ok(Json(Paginated::new(items, total, limit, offset)))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Subscription>> {
    let conn = state.db.get()?;
    let subscription = owned_subscription(&conn, &user.id, &id)?;
    Ok(Json(subscription))
}

/// DELETE /billing/subscriptions/{id} - cancel at the gateway, then
/// transition the mirror to CANCELED. The row is never removed.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Subscription>> {
    let conn = state.db.get()?;
    let subscription = owned_subscription(&conn, &user.id, &id)?;

    state
        .asaas
        .delete_subscription(&subscription.asaas_subscription_id)
        .await?;

    queries::update_subscription_status(&conn, &subscription.id, Subscription::CANCELED)?;
    let subscription = queries::get_subscription_by_id(&conn, &subscription.id)?
        .or_not_found(msg::SUBSCRIPTION_NOT_FOUND)?;

    tracing::info!(
        "subscription canceled: user={}, subscription={}",
        user.id,
        subscription.id
    );

    Ok(Json(subscription))
}

/// Fetch a subscription and enforce that the caller owns it. A foreign row
/// reads as not-found rather than forbidden to avoid leaking ids.
fn owned_subscription(
    conn: &rusqlite::Connection,
    user_id: &str,
    id: &str,
) -> Result<Subscription> {
    let subscription =
        queries::get_subscription_by_id(conn, id)?.or_not_found(msg::SUBSCRIPTION_NOT_FOUND)?;
    if subscription.user_id != user_id {
        return Err(AppError::NotFound(msg::SUBSCRIPTION_NOT_FOUND.into()));
    }
    Ok(subscription)
}
