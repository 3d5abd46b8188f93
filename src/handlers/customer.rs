//! Gateway customer lookup and provisioning.

use axum::extract::State;

use crate::asaas::{AsaasCustomer, CreateCustomerRequest};
use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::SessionUser;
use crate::models::User;

/// Find-or-create the gateway customer for a user and return its id.
///
/// The lookup keys on `externalReference` (our user id), so a retry after
/// a partial failure finds the record a previous attempt created instead
/// of duplicating it.
pub async fn ensure_customer(
    state: &AppState,
    user: &User,
    cpf_cnpj: Option<&str>,
) -> Result<String> {
    if let Some(id) = &user.asaas_customer_id {
        return Ok(id.clone());
    }

    let customer = match state
        .asaas
        .find_customer_by_external_reference(&user.id)
        .await?
    {
        Some(existing) => existing,
        None => {
            state
                .asaas
                .create_customer(&CreateCustomerRequest {
                    name: user.name.clone(),
                    email: user.email.clone(),
                    external_reference: Some(user.id.clone()),
                    cpf_cnpj: cpf_cnpj.map(String::from),
                })
                .await?
        }
    };

    let conn = state.db.get()?;
    queries::set_user_customer_id(&conn, &user.id, &customer.id)?;
    tracing::info!("provisioned gateway customer {} for {}", customer.id, user.id);

    Ok(customer.id)
}

/// GET /billing/customer - the caller's gateway customer record.
pub async fn get_customer(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Json<AsaasCustomer>> {
    let customer_id = ensure_customer(&state, &user, None).await?;
    let customer = state.asaas.get_customer(&customer_id).await?;
    Ok(Json(customer))
}
