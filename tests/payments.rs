//! One-time payment endpoint tests against the stub gateway

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_create_boleto_payment_mirrors_gateway_urls() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state.clone());
    let (user_id, token) = sign_up(&app, "ana@example.com").await;

    let (status, body) = send_request(
        &app,
        "POST",
        "/billing/payments",
        Some(&token),
        Some(json!({
            "billing_type": "BOLETO",
            "value": 120.0,
            "due_date": "2026-09-01",
            "description": "Setup fee"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["due_date"], "2026-09-01");
    assert!(body["invoice_url"].as_str().unwrap().contains("stub.asaas"));
    assert!(body["bank_slip_url"].as_str().unwrap().contains("stub.asaas"));

    let conn = state.db.get().unwrap();
    let stored = queries::get_payment_by_id(&conn, body["id"].as_str().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.billing_type, BillingType::Boleto);
}

#[tokio::test]
async fn test_create_payment_rejects_non_positive_value() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state);
    let (_user_id, token) = sign_up(&app, "ana@example.com").await;

    let (status, _) = send_request(
        &app,
        "POST",
        "/billing/payments",
        Some(&token),
        Some(json!({ "billing_type": "PIX", "value": -5.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pix_qr_code_for_own_pix_payment() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state);
    let (_user_id, token) = sign_up(&app, "ana@example.com").await;

    let (_, created) = send_request(
        &app,
        "POST",
        "/billing/payments",
        Some(&token),
        Some(json!({ "billing_type": "PIX", "value": 15.0 })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send_request(
        &app,
        "GET",
        &format!("/billing/payments/{}/pix", id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["payload"].as_str().unwrap().contains("br.gov.bcb.pix"));
}

#[tokio::test]
async fn test_pix_qr_code_rejected_for_boleto_payment() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state);
    let (_user_id, token) = sign_up(&app, "ana@example.com").await;

    let (_, created) = send_request(
        &app,
        "POST",
        "/billing/payments",
        Some(&token),
        Some(json!({ "billing_type": "BOLETO", "value": 15.0 })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send_request(
        &app,
        "GET",
        &format!("/billing/payments/{}/pix", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_payment_transitions_status_and_keeps_row() {
    let (gateway_url, stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state.clone());
    let (_user_id, token) = sign_up(&app, "ana@example.com").await;

    let (_, created) = send_request(
        &app,
        "POST",
        "/billing/payments",
        Some(&token),
        Some(json!({ "billing_type": "PIX", "value": 15.0 })),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    let gateway_id = created["asaas_payment_id"].as_str().unwrap();

    let (status, body) = send_request(
        &app,
        "DELETE",
        &format!("/billing/payments/{}", id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], Payment::DELETED);
    assert_eq!(
        stub.deleted_payments.lock().unwrap().as_slice(),
        &[gateway_id.to_string()]
    );

    let conn = state.db.get().unwrap();
    assert!(queries::get_payment_by_id(&conn, id).unwrap().is_some());
}

#[tokio::test]
async fn test_payments_are_scoped_to_their_owner() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state);
    let (_ana_id, ana_token) = sign_up(&app, "ana@example.com").await;
    let (_bob_id, bob_token) = sign_up(&app, "bob@example.com").await;

    let (_, created) = send_request(
        &app,
        "POST",
        "/billing/payments",
        Some(&ana_token),
        Some(json!({ "billing_type": "PIX", "value": 15.0 })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    for (method, uri) in [
        ("GET", format!("/billing/payments/{}", id)),
        ("GET", format!("/billing/payments/{}/pix", id)),
        ("DELETE", format!("/billing/payments/{}", id)),
    ] {
        let (status, _) = send_request(&app, method, &uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_gateway_rejection_surfaces_as_bad_gateway() {
    // Charge creation against an unreachable gateway must not create a
    // mirror row.
    let state = test_state(UNREACHABLE_GATEWAY, WebhookHandlers::new(), None);
    let app = cobranca::router(state.clone());
    let (user_id, token) = sign_up(&app, "ana@example.com").await;

    // Give the user a customer id so creation reaches the charge call
    {
        let conn = state.db.get().unwrap();
        queries::set_user_customer_id(&conn, &user_id, "cus_existing").unwrap();
    }

    let (status, _) = send_request(
        &app,
        "POST",
        "/billing/payments",
        Some(&token),
        Some(json!({ "billing_type": "PIX", "value": 15.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_payments_by_user(&conn, &user_id).unwrap(), 0);
}
