use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BillingCycle, BillingType};

/// Local projection of one gateway subscription, kept eventually consistent
/// via webhooks. Rows are never deleted; cancellation is a status
/// transition.
///
/// `status` is an open string because its vocabulary belongs to the gateway
/// (ACTIVE, INACTIVE, EXPIRED, ...) and mirror updates are last-write-wins
/// overwrites of whatever the gateway reported. [`Subscription::CANCELED`]
/// is the one locally-assigned terminal value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub asaas_subscription_id: String,
    pub status: String,
    pub billing_type: BillingType,
    pub value: f64,
    pub cycle: BillingCycle,
    pub next_due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub external_reference: Option<String>,
    pub trial_ends_at: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Subscription {
    /// Terminal status assigned by the cancel endpoint and by
    /// `SUBSCRIPTION_DELETED` webhooks.
    pub const CANCELED: &'static str = "CANCELED";
    pub const ACTIVE: &'static str = "ACTIVE";
}

/// Fields for inserting a new mirror row after the gateway accepted the
/// subscription.
#[derive(Debug)]
pub struct NewSubscription {
    pub asaas_subscription_id: String,
    pub status: String,
    pub billing_type: BillingType,
    pub value: f64,
    pub cycle: BillingCycle,
    pub next_due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub external_reference: Option<String>,
    pub trial_ends_at: Option<NaiveDate>,
}
