//! Wire types for the Asaas REST API (camelCase JSON).
//!
//! Response types keep only the fields this system reads; serde ignores the
//! rest of the gateway's payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BillingCycle, BillingType};

// ============ Customers ============

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    /// Local user id; the find-or-create lookup keys on this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf_cnpj: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsaasCustomer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub cpf_cnpj: Option<String>,
}

// ============ Subscriptions ============

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub customer: String,
    pub billing_type: BillingType,
    pub value: f64,
    pub next_due_date: NaiveDate,
    pub cycle: BillingCycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<CreditCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card_holder_info: Option<CreditCardHolderInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsaasSubscription {
    pub id: String,
    pub customer: String,
    #[serde(default)]
    pub status: Option<String>,
    pub billing_type: BillingType,
    pub value: f64,
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    pub cycle: BillingCycle,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

// ============ Payments ============

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub customer: String,
    pub billing_type: BillingType,
    pub value: f64,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<CreditCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card_holder_info: Option<CreditCardHolderInfo>,
}

/// Card data forwarded verbatim to the gateway; never stored or logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub holder_name: String,
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub ccv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardHolderInfo {
    pub name: String,
    pub email: String,
    pub cpf_cnpj: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsaasPayment {
    pub id: String,
    pub customer: String,
    #[serde(default)]
    pub status: Option<String>,
    pub billing_type: BillingType,
    pub value: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub bank_slip_url: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// Pix QR code for a payment, fetched separately from the charge itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixQrCode {
    pub success: bool,
    /// Base64 PNG of the QR image
    pub encoded_image: String,
    /// Copy-and-paste Pix payload
    pub payload: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

// ============ Shared ============

/// Envelope for list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsaasPage<T> {
    pub has_more: bool,
    pub total_count: i64,
    pub limit: i64,
    pub offset: i64,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
    pub id: String,
}
