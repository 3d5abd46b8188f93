mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::asaas::AsaasClient;
use crate::webhook::WebhookHandlers;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Mirror store (users, sessions, subscription and payment mirrors)
    pub db: DbPool,
    /// Authenticated Asaas API client
    pub asaas: Arc<AsaasClient>,
    /// Caller-supplied webhook event handlers
    pub hooks: Arc<WebhookHandlers>,
    /// Expected `asaas-access-token` header value; `None` disables the check
    pub webhook_token: Option<String>,
    /// Lifetime of issued session tokens, in seconds
    pub session_ttl_secs: i64,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
