use serde::{Deserialize, Serialize};

/// A local account. `asaas_customer_id` links the user to the gateway
/// customer record; it stays NULL until provisioning succeeds and is then
/// never changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub asaas_customer_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    /// Brazilian tax id (CPF/CNPJ) forwarded to the gateway when the
    /// customer record is provisioned. Not stored locally.
    #[serde(default)]
    pub cpf_cnpj: Option<String>,
}
