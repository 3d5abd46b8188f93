use std::env;

/// Asaas API base URLs. Sandbox is the default so a fresh checkout never
/// talks to the production gateway by accident.
pub const ASAAS_SANDBOX_URL: &str = "https://api-sandbox.asaas.com/v3";
pub const ASAAS_PRODUCTION_URL: &str = "https://api.asaas.com/v3";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub asaas_api_key: String,
    pub asaas_base_url: String,
    /// Shared secret the gateway sends in the `asaas-access-token` header.
    /// When unset, every webhook notification is processed unauthenticated.
    pub asaas_webhook_token: Option<String>,
    /// Lifetime of session tokens issued at sign-up, in seconds.
    pub session_ttl_secs: i64,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("COBRANCA_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let asaas_base_url = match env::var("ASAAS_ENV").as_deref() {
            Ok("production") | Ok("prod") => ASAAS_PRODUCTION_URL.to_string(),
            _ => ASAAS_SANDBOX_URL.to_string(),
        };

        let asaas_webhook_token = env::var("ASAAS_WEBHOOK_TOKEN").ok().filter(|t| !t.is_empty());
        if asaas_webhook_token.is_none() {
            tracing::warn!(
                "ASAAS_WEBHOOK_TOKEN not set - webhook notifications will be accepted without authentication"
            );
        }

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "cobranca.db".to_string()),
            asaas_api_key: env::var("ASAAS_API_KEY").unwrap_or_default(),
            asaas_base_url,
            asaas_webhook_token,
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30 * 86400),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
