//! Row mapping trait and helpers for reducing boilerplate in queries.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Parse a nullable TEXT column holding a `YYYY-MM-DD` date.
fn parse_date(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(col)?
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    col,
                    col_name.to_string(),
                    rusqlite::types::Type::Text,
                )
            })
        })
        .transpose()
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, name, asaas_customer_id, created_at, updated_at";

pub const SUBSCRIPTION_COLS: &str = "id, user_id, asaas_subscription_id, status, billing_type, value, cycle, next_due_date, description, external_reference, trial_ends_at, created_at, updated_at";

pub const PAYMENT_COLS: &str = "id, user_id, asaas_payment_id, status, billing_type, value, due_date, description, invoice_url, bank_slip_url, pix_qr_code_id, external_reference, created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            asaas_customer_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            user_id: row.get(1)?,
            asaas_subscription_id: row.get(2)?,
            status: row.get(3)?,
            billing_type: parse_enum(row, 4, "billing_type")?,
            value: row.get(5)?,
            cycle: parse_enum(row, 6, "cycle")?,
            next_due_date: parse_date(row, 7, "next_due_date")?,
            description: row.get(8)?,
            external_reference: row.get(9)?,
            trial_ends_at: parse_date(row, 10, "trial_ends_at")?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            asaas_payment_id: row.get(2)?,
            status: row.get(3)?,
            billing_type: parse_enum(row, 4, "billing_type")?,
            value: row.get(5)?,
            due_date: parse_date(row, 6, "due_date")?,
            description: row.get(7)?,
            invoice_url: row.get(8)?,
            bank_slip_url: row.get(9)?,
            pix_qr_code_id: row.get(10)?,
            external_reference: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}
