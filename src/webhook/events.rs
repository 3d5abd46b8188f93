//! Event taxonomy for inbound Asaas notifications.
//!
//! The gateway's event vocabulary is open-ended; raw codes are parsed into
//! [`EventCode`] at the boundary (unknown codes become `Other`) and then
//! resolved into exactly one [`EventCategory`], which drives handler
//! dispatch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::asaas::PixQrCode;
use crate::models::BillingType;

/// Recognized gateway event codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCode {
    PaymentCreated,
    PaymentDueDateReminder,
    PaymentOverdue,
    PaymentConfirmed,
    PaymentReceived,
    PaymentRefunded,
    PaymentPartiallyRefunded,
    PaymentChargebackRequested,
    PaymentChargebackDispute,
    PaymentAwaitingChargebackReversal,
    SubscriptionCreated,
    SubscriptionRenewed,
    SubscriptionDeleted,
    /// Anything this build does not recognize. Not an error.
    Other,
}

impl EventCode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PAYMENT_CREATED" => Self::PaymentCreated,
            "PAYMENT_DUE_DATE_REMINDER" => Self::PaymentDueDateReminder,
            "PAYMENT_OVERDUE" => Self::PaymentOverdue,
            "PAYMENT_CONFIRMED" => Self::PaymentConfirmed,
            "PAYMENT_RECEIVED" => Self::PaymentReceived,
            "PAYMENT_REFUNDED" => Self::PaymentRefunded,
            "PAYMENT_PARTIALLY_REFUNDED" => Self::PaymentPartiallyRefunded,
            "PAYMENT_CHARGEBACK_REQUESTED" => Self::PaymentChargebackRequested,
            "PAYMENT_CHARGEBACK_DISPUTE" => Self::PaymentChargebackDispute,
            "PAYMENT_AWAITING_CHARGEBACK_REVERSAL" => Self::PaymentAwaitingChargebackReversal,
            "SUBSCRIPTION_CREATED" => Self::SubscriptionCreated,
            "SUBSCRIPTION_RENEWED" => Self::SubscriptionRenewed,
            "SUBSCRIPTION_DELETED" => Self::SubscriptionDeleted,
            _ => Self::Other,
        }
    }
}

/// The eleven categories handlers can subscribe to. Each notification
/// resolves to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    PaymentCreated,
    /// Reminder ahead of the due date
    PaymentDueSoon,
    /// `PAYMENT_OVERDUE` whose due date is the current UTC date
    PaymentDueToday,
    PaymentOverdue,
    PaymentConfirmed,
    PaymentRefunded,
    PaymentChargeback,
    SubscriptionCreated,
    SubscriptionRenewed,
    SubscriptionCanceled,
    /// Catch-all for unrecognized codes
    Unhandled,
}

/// Resolve an event code to its category.
///
/// `PAYMENT_OVERDUE` is date-disambiguated: the gateway emits the same code
/// on the due date and afterwards, so a charge due exactly `today` routes
/// to `PaymentDueToday` instead of `PaymentOverdue`. With no payment
/// snapshot the overdue reading wins.
pub fn classify(code: EventCode, due_date: Option<NaiveDate>, today: NaiveDate) -> EventCategory {
    match code {
        EventCode::PaymentCreated => EventCategory::PaymentCreated,
        EventCode::PaymentDueDateReminder => EventCategory::PaymentDueSoon,
        EventCode::PaymentOverdue => match due_date {
            Some(due) if due == today => EventCategory::PaymentDueToday,
            _ => EventCategory::PaymentOverdue,
        },
        EventCode::PaymentConfirmed | EventCode::PaymentReceived => EventCategory::PaymentConfirmed,
        EventCode::PaymentRefunded | EventCode::PaymentPartiallyRefunded => {
            EventCategory::PaymentRefunded
        }
        EventCode::PaymentChargebackRequested
        | EventCode::PaymentChargebackDispute
        | EventCode::PaymentAwaitingChargebackReversal => EventCategory::PaymentChargeback,
        EventCode::SubscriptionCreated => EventCategory::SubscriptionCreated,
        EventCode::SubscriptionRenewed => EventCategory::SubscriptionRenewed,
        EventCode::SubscriptionDeleted => EventCategory::SubscriptionCanceled,
        EventCode::Other => EventCategory::Unhandled,
    }
}

/// Partial payment object embedded in a notification. Every field is
/// optional; only what reconciliation and handlers need is modeled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub billing_type: Option<BillingType>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub bank_slip_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// Partial subscription object embedded in a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// Raw inbound notification body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    pub event: String,
    #[serde(default)]
    pub payment: Option<PaymentSnapshot>,
    #[serde(default)]
    pub subscription: Option<SubscriptionSnapshot>,
}

/// What a dispatched handler receives: the classified notification, plus
/// the Pix QR code when enrichment applied and succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    /// Raw gateway event code
    pub event: String,
    pub category: EventCategory,
    pub payment: Option<PaymentSnapshot>,
    pub subscription: Option<SubscriptionSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_qr_code: Option<PixQrCode>,
}

impl EventPayload {
    /// True when this payload should carry a Pix QR code: payment-creation
    /// class events for a Pix charge with a known id.
    pub fn wants_pix_enrichment(&self) -> bool {
        if !matches!(
            self.category,
            EventCategory::PaymentCreated | EventCategory::PaymentDueSoon
        ) {
            return false;
        }
        match &self.payment {
            Some(p) => p.billing_type == Some(BillingType::Pix) && p.id.is_some(),
            None => false,
        }
    }
}
