//! Test utilities and fixtures for Cobranca integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::ServiceExt;

pub use cobranca::asaas::{AsaasClient, PixQrCode, PixQrCodes};
pub use cobranca::db::{init_db, queries, AppState, DbPool};
pub use cobranca::error::AppError;
pub use cobranca::models::*;
pub use cobranca::webhook::{EventPayload, WebhookHandlers, WebhookNotification};

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a pooled in-memory database shared across connections
/// (named shared-cache memory DB, one per call).
pub fn test_pool() -> DbPool {
    let name = format!(
        "file:cobranca_test_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().simple()
    );
    let manager = SqliteConnectionManager::file(name);
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .expect("Failed to build test pool");
    init_db(&pool.get().expect("Failed to get connection")).expect("Failed to initialize schema");
    pool
}

/// Build an AppState over a fresh in-memory database.
pub fn test_state(
    gateway_base_url: &str,
    hooks: WebhookHandlers,
    webhook_token: Option<&str>,
) -> AppState {
    AppState {
        db: test_pool(),
        asaas: Arc::new(AsaasClient::new(gateway_base_url, "test_api_key")),
        hooks: Arc::new(hooks),
        webhook_token: webhook_token.map(String::from),
        session_ttl_secs: 3600,
    }
}

/// Base URL guaranteed to refuse connections, for exercising
/// gateway-failure paths.
pub const UNREACHABLE_GATEWAY: &str = "http://127.0.0.1:1";

// ============ Fixtures ============

pub fn create_test_user(conn: &Connection, email: &str) -> User {
    queries::create_user(
        conn,
        &CreateUser {
            email: email.to_string(),
            name: format!("Test User {}", email),
            cpf_cnpj: None,
        },
    )
    .expect("Failed to create test user")
}

pub fn create_test_subscription(
    conn: &Connection,
    user_id: &str,
    gateway_id: &str,
    status: &str,
) -> Subscription {
    queries::create_subscription(
        conn,
        user_id,
        &NewSubscription {
            asaas_subscription_id: gateway_id.to_string(),
            status: status.to_string(),
            billing_type: BillingType::Pix,
            value: 49.9,
            cycle: BillingCycle::Monthly,
            next_due_date: None,
            description: None,
            external_reference: None,
            trial_ends_at: None,
        },
    )
    .expect("Failed to create test subscription")
}

pub fn create_test_payment(
    conn: &Connection,
    user_id: &str,
    gateway_id: &str,
    status: &str,
    billing_type: BillingType,
) -> Payment {
    queries::create_payment(
        conn,
        user_id,
        &NewPayment {
            asaas_payment_id: gateway_id.to_string(),
            status: status.to_string(),
            billing_type,
            value: 120.0,
            due_date: None,
            description: None,
            invoice_url: None,
            bank_slip_url: None,
            pix_qr_code_id: None,
            external_reference: None,
        },
    )
    .expect("Failed to create test payment")
}

// ============ Recording handlers ============

/// Every category handler registered, each recording which slot fired and
/// with what payload.
pub fn recording_hooks() -> (WebhookHandlers, Arc<Mutex<Vec<(String, EventPayload)>>>) {
    let fired: Arc<Mutex<Vec<(String, EventPayload)>>> = Arc::new(Mutex::new(Vec::new()));

    fn record(
        fired: &Arc<Mutex<Vec<(String, EventPayload)>>>,
        slot: &'static str,
    ) -> impl Fn(EventPayload) -> std::future::Ready<Result<(), cobranca::webhook::HandlerError>>
           + Send
           + Sync
           + 'static {
        let fired = fired.clone();
        move |payload| {
            fired.lock().unwrap().push((slot.to_string(), payload));
            std::future::ready(Ok(()))
        }
    }

    let hooks = WebhookHandlers::new()
        .on_payment_created(record(&fired, "payment_created"))
        .on_payment_due_soon(record(&fired, "payment_due_soon"))
        .on_payment_due_today(record(&fired, "payment_due_today"))
        .on_payment_overdue(record(&fired, "payment_overdue"))
        .on_payment_confirmed(record(&fired, "payment_confirmed"))
        .on_payment_refunded(record(&fired, "payment_refunded"))
        .on_payment_chargeback(record(&fired, "payment_chargeback"))
        .on_subscription_created(record(&fired, "subscription_created"))
        .on_subscription_renewed(record(&fired, "subscription_renewed"))
        .on_subscription_canceled(record(&fired, "subscription_canceled"))
        .on_unhandled(record(&fired, "unhandled"));

    (hooks, fired)
}

// ============ Pix QR stubs ============

/// PixQrCodes implementation that always succeeds.
pub struct StubPixQr;

#[async_trait::async_trait]
impl PixQrCodes for StubPixQr {
    async fn get_pix_qr_code(&self, _payment_id: &str) -> cobranca::error::Result<PixQrCode> {
        Ok(stub_qr_code())
    }
}

/// PixQrCodes implementation that always fails.
pub struct FailingPixQr;

#[async_trait::async_trait]
impl PixQrCodes for FailingPixQr {
    async fn get_pix_qr_code(&self, _payment_id: &str) -> cobranca::error::Result<PixQrCode> {
        Err(AppError::Gateway {
            status: 500,
            body: "stub failure".to_string(),
        })
    }
}

pub fn stub_qr_code() -> PixQrCode {
    PixQrCode {
        success: true,
        encoded_image: "aVFSY29kZQ==".to_string(),
        payload: "00020126580014br.gov.bcb.pix0136stub".to_string(),
        expiration_date: Some("2026-12-31 23:59:59".to_string()),
    }
}

// ============ Gateway stub server ============

/// Call log for the stub gateway.
#[derive(Default)]
pub struct GatewayStub {
    pub create_customer_calls: AtomicUsize,
    /// (customer id, externalReference) pairs created so far
    pub customers: Mutex<Vec<(String, String)>>,
    pub deleted_subscriptions: Mutex<Vec<String>>,
    pub deleted_payments: Mutex<Vec<String>>,
    counter: AtomicUsize,
}

impl GatewayStub {
    fn next(&self) -> usize {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

type Stub = Arc<GatewayStub>;

async fn stub_create_customer(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    stub.create_customer_calls.fetch_add(1, Ordering::SeqCst);
    let id = format!("cus_stub_{}", stub.next());
    let external = body["externalReference"].as_str().unwrap_or_default().to_string();
    stub.customers.lock().unwrap().push((id.clone(), external.clone()));
    Json(json!({
        "id": id,
        "name": body["name"],
        "email": body["email"],
        "externalReference": external,
    }))
}

async fn stub_list_customers(
    State(stub): State<Stub>,
    axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    let wanted = params.get("externalReference").cloned().unwrap_or_default();
    let data: Vec<Value> = stub
        .customers
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, ext)| wanted.is_empty() || *ext == wanted)
        .map(|(id, ext)| {
            json!({
                "id": id,
                "name": "Stub Customer",
                "email": "stub@example.com",
                "externalReference": ext,
            })
        })
        .collect();
    Json(json!({
        "hasMore": false,
        "totalCount": data.len(),
        "limit": 1,
        "offset": 0,
        "data": data,
    }))
}

async fn stub_get_customer(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "id": id,
        "name": "Stub Customer",
        "email": "stub@example.com",
    }))
}

async fn stub_create_subscription(
    State(stub): State<Stub>,
    Json(body): Json<Value>,
) -> Json<Value> {
    Json(json!({
        "id": format!("sub_stub_{}", stub.next()),
        "customer": body["customer"],
        "status": "ACTIVE",
        "billingType": body["billingType"],
        "value": body["value"],
        "nextDueDate": body["nextDueDate"],
        "cycle": body["cycle"],
        "description": body["description"],
        "externalReference": body["externalReference"],
    }))
}

async fn stub_delete_subscription(State(stub): State<Stub>, Path(id): Path<String>) -> Json<Value> {
    stub.deleted_subscriptions.lock().unwrap().push(id.clone());
    Json(json!({ "deleted": true, "id": id }))
}

async fn stub_create_payment(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    let id = format!("pay_stub_{}", stub.next());
    Json(json!({
        "id": id,
        "customer": body["customer"],
        "status": "PENDING",
        "billingType": body["billingType"],
        "value": body["value"],
        "dueDate": body["dueDate"],
        "description": body["description"],
        "invoiceUrl": format!("https://stub.asaas/i/{}", id),
        "bankSlipUrl": if body["billingType"] == "BOLETO" {
            Value::String(format!("https://stub.asaas/b/{}", id))
        } else {
            Value::Null
        },
        "externalReference": body["externalReference"],
    }))
}

async fn stub_delete_payment(State(stub): State<Stub>, Path(id): Path<String>) -> Json<Value> {
    stub.deleted_payments.lock().unwrap().push(id.clone());
    Json(json!({ "deleted": true, "id": id }))
}

async fn stub_pix_qr(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "encodedImage": "aVFSY29kZQ==",
        "payload": "00020126580014br.gov.bcb.pix0136stub",
        "expirationDate": "2026-12-31 23:59:59",
    }))
}

/// Start an in-process gateway stub and return its base URL plus the call
/// log for assertions.
pub async fn spawn_gateway_stub() -> (String, Stub) {
    let stub: Stub = Arc::new(GatewayStub::default());
    let app = Router::new()
        .route("/customers", post(stub_create_customer).get(stub_list_customers))
        .route("/customers/{id}", get(stub_get_customer))
        .route("/subscriptions", post(stub_create_subscription))
        .route("/subscriptions/{id}", delete(stub_delete_subscription))
        .route("/payments", post(stub_create_payment))
        .route("/payments/{id}", delete(stub_delete_payment))
        .route("/payments/{id}/pixQrCode", get(stub_pix_qr))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub gateway");
    let addr = listener.local_addr().expect("Failed to read stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub gateway died");
    });

    (format!("http://{}", addr), stub)
}

// ============ Request helpers ============

/// Send one request through the app router and return status + JSON body.
pub async fn send_request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Sign up a user through the API and return (user id, session token).
pub async fn sign_up(app: &axum::Router, email: &str) -> (String, String) {
    let (status, body) = send_request(
        app,
        "POST",
        "/auth/sign-up",
        None,
        Some(json!({ "email": email, "name": "Test User" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "sign-up failed: {}", body);
    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}
