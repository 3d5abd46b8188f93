use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (identity - one row per signed-up account)
        -- asaas_customer_id is NULL until gateway provisioning succeeds
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            asaas_customer_id TEXT UNIQUE,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        -- Sessions (bearer tokens, stored hashed)
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

        -- Subscription mirrors (local projection of gateway subscriptions)
        -- Never deleted: cancellation transitions status to CANCELED
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            asaas_subscription_id TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            billing_type TEXT NOT NULL,
            value REAL NOT NULL,
            cycle TEXT NOT NULL,
            next_due_date TEXT,
            description TEXT,
            external_reference TEXT,
            trial_ends_at TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);
        CREATE INDEX IF NOT EXISTS idx_subscriptions_gateway ON subscriptions(asaas_subscription_id);

        -- Payment mirrors (local projection of gateway charges)
        -- Gateway-generated cycle charges have no row here; webhook
        -- reconciliation tolerates the miss
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            asaas_payment_id TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            billing_type TEXT NOT NULL,
            value REAL NOT NULL,
            due_date TEXT,
            description TEXT,
            invoice_url TEXT,
            bank_slip_url TEXT,
            pix_qr_code_id TEXT,
            external_reference TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id);
        CREATE INDEX IF NOT EXISTS idx_payments_gateway ON payments(asaas_payment_id);
        "#,
    )
}
