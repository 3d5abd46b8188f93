use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::crypto::hash_secret;
use crate::error::Result;
use crate::id::{self, EntityType};
use crate::models::*;

use super::from_row::{query_all, query_one, PAYMENT_COLS, SUBSCRIPTION_COLS, USER_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let user = User {
        id: id::generate(EntityType::User),
        email: input.email.clone(),
        name: input.name.clone(),
        asaas_customer_id: None,
        created_at: now(),
        updated_at: now(),
    };
    conn.execute(
        "INSERT INTO users (id, email, name, asaas_customer_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            user.email,
            user.name,
            user.asaas_customer_id,
            user.created_at,
            user.updated_at
        ],
    )?;
    Ok(user)
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

/// Record the gateway customer id once provisioning succeeded. The id never
/// changes afterwards, so an existing value is left alone.
pub fn set_user_customer_id(conn: &Connection, user_id: &str, customer_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET asaas_customer_id = ?1, updated_at = ?2
         WHERE id = ?3 AND asaas_customer_id IS NULL",
        params![customer_id, now(), user_id],
    )?;
    Ok(affected > 0)
}

// ============ Sessions ============

/// Generate a session token with cb_ prefix. Shown to the caller once;
/// only its hash is stored.
pub fn generate_session_token() -> String {
    format!("cb_{}", Uuid::new_v4().simple())
}

/// Open a session for a user and return the plaintext token.
pub fn create_session(conn: &Connection, user_id: &str, ttl_secs: i64) -> Result<String> {
    let token = generate_session_token();
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![hash_secret(&token), user_id, now(), now() + ttl_secs],
    )?;
    Ok(token)
}

/// Resolve a bearer token to its user. Expired sessions are treated as
/// absent.
pub fn get_user_by_session_token(conn: &Connection, token: &str) -> Result<Option<User>> {
    let hash = hash_secret(token);
    query_one(
        conn,
        "SELECT u.id, u.email, u.name, u.asaas_customer_id, u.created_at, u.updated_at
         FROM users u
         JOIN sessions s ON s.user_id = u.id
         WHERE s.token_hash = ?1 AND s.expires_at > ?2",
        &[&hash, &now()],
    )
}

// ============ Subscription mirrors ============

pub fn create_subscription(
    conn: &Connection,
    user_id: &str,
    input: &NewSubscription,
) -> Result<Subscription> {
    let sub = Subscription {
        id: id::generate(EntityType::Subscription),
        user_id: user_id.to_string(),
        asaas_subscription_id: input.asaas_subscription_id.clone(),
        status: input.status.clone(),
        billing_type: input.billing_type,
        value: input.value,
        cycle: input.cycle,
        next_due_date: input.next_due_date,
        description: input.description.clone(),
        external_reference: input.external_reference.clone(),
        trial_ends_at: input.trial_ends_at,
        created_at: now(),
        updated_at: now(),
    };
    conn.execute(
        "INSERT INTO subscriptions (id, user_id, asaas_subscription_id, status, billing_type,
            value, cycle, next_due_date, description, external_reference, trial_ends_at,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            sub.id,
            sub.user_id,
            sub.asaas_subscription_id,
            sub.status,
            sub.billing_type.as_str(),
            sub.value,
            sub.cycle.as_str(),
            sub.next_due_date.map(|d| d.to_string()),
            sub.description,
            sub.external_reference,
            sub.trial_ends_at.map(|d| d.to_string()),
            sub.created_at,
            sub.updated_at
        ],
    )?;
    Ok(sub)
}

pub fn get_subscription_by_id(conn: &Connection, id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLS),
        &[&id],
    )
}

pub fn get_subscription_by_gateway_id(
    conn: &Connection,
    asaas_subscription_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE asaas_subscription_id = ?1",
            SUBSCRIPTION_COLS
        ),
        &[&asaas_subscription_id],
    )
}

pub fn list_subscriptions_by_user(
    conn: &Connection,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Subscription>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE user_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            SUBSCRIPTION_COLS
        ),
        &[&user_id, &limit, &offset],
    )
}

pub fn count_subscriptions_by_user(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM subscriptions WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Status overwrite by local id (cancel endpoint).
pub fn update_subscription_status(conn: &Connection, id: &str, status: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE subscriptions SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status, now(), id],
    )?;
    Ok(affected > 0)
}

/// Last-write-wins status overwrite keyed by the gateway id. Zero matched
/// rows is not an error.
pub fn update_subscription_status_by_gateway_id(
    conn: &Connection,
    asaas_subscription_id: &str,
    status: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE subscriptions SET status = ?1, updated_at = ?2 WHERE asaas_subscription_id = ?3",
        params![status, now(), asaas_subscription_id],
    )
    .map_err(Into::into)
}

// ============ Payment mirrors ============

pub fn create_payment(conn: &Connection, user_id: &str, input: &NewPayment) -> Result<Payment> {
    let payment = Payment {
        id: id::generate(EntityType::Payment),
        user_id: user_id.to_string(),
        asaas_payment_id: input.asaas_payment_id.clone(),
        status: input.status.clone(),
        billing_type: input.billing_type,
        value: input.value,
        due_date: input.due_date,
        description: input.description.clone(),
        invoice_url: input.invoice_url.clone(),
        bank_slip_url: input.bank_slip_url.clone(),
        pix_qr_code_id: input.pix_qr_code_id.clone(),
        external_reference: input.external_reference.clone(),
        created_at: now(),
        updated_at: now(),
    };
    conn.execute(
        "INSERT INTO payments (id, user_id, asaas_payment_id, status, billing_type, value,
            due_date, description, invoice_url, bank_slip_url, pix_qr_code_id,
            external_reference, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            payment.id,
            payment.user_id,
            payment.asaas_payment_id,
            payment.status,
            payment.billing_type.as_str(),
            payment.value,
            payment.due_date.map(|d| d.to_string()),
            payment.description,
            payment.invoice_url,
            payment.bank_slip_url,
            payment.pix_qr_code_id,
            payment.external_reference,
            payment.created_at,
            payment.updated_at
        ],
    )?;
    Ok(payment)
}

pub fn get_payment_by_id(conn: &Connection, id: &str) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLS),
        &[&id],
    )
}

pub fn get_payment_by_gateway_id(
    conn: &Connection,
    asaas_payment_id: &str,
) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE asaas_payment_id = ?1",
            PAYMENT_COLS
        ),
        &[&asaas_payment_id],
    )
}

pub fn list_payments_by_user(
    conn: &Connection,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Payment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE user_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            PAYMENT_COLS
        ),
        &[&user_id, &limit, &offset],
    )
}

pub fn count_payments_by_user(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Status overwrite by local id (cancel endpoint).
pub fn update_payment_status(conn: &Connection, id: &str, status: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE payments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status, now(), id],
    )?;
    Ok(affected > 0)
}

/// Last-write-wins status overwrite keyed by the gateway id. Zero matched
/// rows is the normal case for gateway-generated cycle charges.
pub fn update_payment_status_by_gateway_id(
    conn: &Connection,
    asaas_payment_id: &str,
    status: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE payments SET status = ?1, updated_at = ?2 WHERE asaas_payment_id = ?3",
        params![status, now(), asaas_payment_id],
    )
    .map_err(Into::into)
}
