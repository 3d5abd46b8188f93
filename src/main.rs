use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cobranca::asaas::AsaasClient;
use cobranca::config::Config;
use cobranca::db::{create_pool, init_db, queries, AppState};
use cobranca::models::CreateUser;
use cobranca::webhook::WebhookHandlers;

#[derive(Parser, Debug)]
#[command(name = "cobranca")]
#[command(about = "Self-hosted billing bridge for the Asaas payment gateway")]
struct Cli {
    /// Seed the database with a dev user and print its session token
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with a dev user for testing. Only runs in dev mode
/// and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    if queries::get_user_by_email(&conn, "dev@example.com")
        .expect("Failed to check for dev user")
        .is_some()
    {
        tracing::info!("Dev user already exists, skipping seed");
        return;
    }

    let user = queries::create_user(
        &conn,
        &CreateUser {
            email: "dev@example.com".to_string(),
            name: "Dev User".to_string(),
            cpf_cnpj: None,
        },
    )
    .expect("Failed to create dev user");

    let token = queries::create_session(&conn, &user.id, state.session_ttl_secs)
        .expect("Failed to create dev session");

    tracing::info!("============================================");
    tracing::info!("DEV USER CREATED");
    tracing::info!("Email: {}", user.email);
    tracing::info!("Token: {}", token);
    tracing::info!("============================================");
    tracing::info!("SAVE THIS TOKEN - IT WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cobranca=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.asaas_api_key.is_empty() {
        tracing::warn!("ASAAS_API_KEY not set - gateway calls will be rejected");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        asaas: Arc::new(AsaasClient::new(&config.asaas_base_url, &config.asaas_api_key)),
        // The binary registers no handlers; mirror sync still runs for
        // every notification. Embedders using the library attach theirs.
        hooks: Arc::new(WebhookHandlers::new()),
        webhook_token: config.asaas_webhook_token.clone(),
        session_ttl_secs: config.session_ttl_secs,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set COBRANCA_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = cobranca::router(state).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Cobranca server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        let db_path = &config.database_path;
        if let Err(e) = std::fs::remove_file(db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
