//! Authenticated client for the Asaas REST API.

mod types;

pub use types::*;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Sent on every outbound request so gateway-side logs can attribute
/// traffic to this integration.
const USER_AGENT: &str = concat!("cobranca/", env!("CARGO_PKG_VERSION"));

/// The one gateway operation the webhook reconciler consumes. Kept as a
/// separate trait so event processing can be exercised without a live
/// gateway.
#[async_trait]
pub trait PixQrCodes: Send + Sync {
    async fn get_pix_qr_code(&self, payment_id: &str) -> Result<PixQrCode>;
}

#[derive(Debug, Clone)]
pub struct AsaasClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AsaasClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build a request with the fixed `access_token` and `User-Agent`
    /// headers. Every call goes through here so no code path can issue an
    /// unauthenticated gateway request.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("access_token", &self.api_key)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    /// Send a request and decode the JSON response. Non-2xx responses
    /// become `AppError::Gateway` carrying the status and body.
    async fn execute<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T> {
        let response = rb.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway {
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(Into::into)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    // ============ Customers ============

    pub async fn create_customer(&self, req: &CreateCustomerRequest) -> Result<AsaasCustomer> {
        self.post("/customers", req).await
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<AsaasCustomer> {
        self.get(&format!("/customers/{}", customer_id)).await
    }

    pub async fn list_customers(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<AsaasPage<AsaasCustomer>> {
        self.get(&format!("/customers?limit={}&offset={}", limit, offset))
            .await
    }

    /// Look up a customer by the `externalReference` tag we stamp at
    /// creation. Backs the idempotent find-or-create used at sign-up.
    pub async fn find_customer_by_external_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<AsaasCustomer>> {
        let page: AsaasPage<AsaasCustomer> = self
            .get(&format!(
                "/customers?externalReference={}&limit=1",
                external_reference
            ))
            .await?;
        Ok(page.data.into_iter().next())
    }

    // ============ Subscriptions ============

    pub async fn create_subscription(
        &self,
        req: &CreateSubscriptionRequest,
    ) -> Result<AsaasSubscription> {
        self.post("/subscriptions", req).await
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> Result<AsaasSubscription> {
        self.get(&format!("/subscriptions/{}", subscription_id)).await
    }

    pub async fn delete_subscription(&self, subscription_id: &str) -> Result<DeletedResponse> {
        self.delete(&format!("/subscriptions/{}", subscription_id)).await
    }

    // ============ Payments ============

    pub async fn create_payment(&self, req: &CreatePaymentRequest) -> Result<AsaasPayment> {
        self.post("/payments", req).await
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<AsaasPayment> {
        self.get(&format!("/payments/{}", payment_id)).await
    }

    pub async fn delete_payment(&self, payment_id: &str) -> Result<DeletedResponse> {
        self.delete(&format!("/payments/{}", payment_id)).await
    }
}

#[async_trait]
impl PixQrCodes for AsaasClient {
    async fn get_pix_qr_code(&self, payment_id: &str) -> Result<PixQrCode> {
        self.get(&format!("/payments/{}/pixQrCode", payment_id)).await
    }
}
