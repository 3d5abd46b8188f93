use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::BillingType;

/// Local projection of one gateway charge.
///
/// A webhook may reference a payment with no row here: charges the gateway
/// generates for subscription cycles are never created through this system.
/// Reconciliation treats that miss as expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub asaas_payment_id: String,
    pub status: String,
    pub billing_type: BillingType,
    pub value: f64,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub invoice_url: Option<String>,
    pub bank_slip_url: Option<String>,
    pub pix_qr_code_id: Option<String>,
    pub external_reference: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Payment {
    /// Terminal status assigned by the cancel endpoint; the gateway reports
    /// the same value for charges removed on its side.
    pub const DELETED: &'static str = "DELETED";
    pub const PENDING: &'static str = "PENDING";
}

/// Fields for inserting a new mirror row after the gateway accepted the
/// charge.
#[derive(Debug)]
pub struct NewPayment {
    pub asaas_payment_id: String,
    pub status: String,
    pub billing_type: BillingType,
    pub value: f64,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub invoice_url: Option<String>,
    pub bank_slip_url: Option<String>,
    pub pix_qr_code_id: Option<String>,
    pub external_reference: Option<String>,
}
