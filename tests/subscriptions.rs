//! Subscription endpoint tests against the stub gateway

mod common;

use axum::http::StatusCode;
use chrono::{Days, Utc};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_create_subscription_mirrors_gateway_row() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state.clone());
    let (user_id, token) = sign_up(&app, "ana@example.com").await;

    let (status, body) = send_request(
        &app,
        "POST",
        "/billing/subscriptions",
        Some(&token),
        Some(json!({
            "billing_type": "PIX",
            "value": 49.9,
            "cycle": "MONTHLY",
            "description": "Pro plan"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["billing_type"], "PIX");
    assert!(body["asaas_subscription_id"]
        .as_str()
        .unwrap()
        .starts_with("sub_stub_"));

    let conn = state.db.get().unwrap();
    let stored = queries::get_subscription_by_id(&conn, body["id"].as_str().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.value, 49.9);
}

#[tokio::test]
async fn test_trial_subscription_due_dates_and_immediate_active_status() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state.clone());
    let (_user_id, token) = sign_up(&app, "ana@example.com").await;

    let (status, body) = send_request(
        &app,
        "POST",
        "/billing/subscriptions",
        Some(&token),
        Some(json!({
            "billing_type": "CREDIT_CARD",
            "value": 99.0,
            "trial_days": 14
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let expected = (Utc::now().date_naive() + Days::new(14)).to_string();
    assert_eq!(body["next_due_date"], expected);
    assert_eq!(body["trial_ends_at"], expected);
    // Active from the start, not pending-trial
    assert_eq!(body["status"], "ACTIVE");
}

#[tokio::test]
async fn test_create_subscription_rejects_non_positive_value() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state);
    let (_user_id, token) = sign_up(&app, "ana@example.com").await;

    let (status, _) = send_request(
        &app,
        "POST",
        "/billing/subscriptions",
        Some(&token),
        Some(json!({ "billing_type": "PIX", "value": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_subscription_transitions_status_and_keeps_row() {
    let (gateway_url, stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state.clone());
    let (_user_id, token) = sign_up(&app, "ana@example.com").await;

    let (_, created) = send_request(
        &app,
        "POST",
        "/billing/subscriptions",
        Some(&token),
        Some(json!({ "billing_type": "BOLETO", "value": 30.0 })),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    let gateway_id = created["asaas_subscription_id"].as_str().unwrap();

    let (status, body) = send_request(
        &app,
        "DELETE",
        &format!("/billing/subscriptions/{}", id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], Subscription::CANCELED);
    assert_eq!(
        stub.deleted_subscriptions.lock().unwrap().as_slice(),
        &[gateway_id.to_string()]
    );

    // Cancellation is a status transition, never a delete
    let conn = state.db.get().unwrap();
    let row = queries::get_subscription_by_id(&conn, id).unwrap();
    assert!(row.is_some());
}

#[tokio::test]
async fn test_subscriptions_are_scoped_to_their_owner() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state);
    let (_ana_id, ana_token) = sign_up(&app, "ana@example.com").await;
    let (_bob_id, bob_token) = sign_up(&app, "bob@example.com").await;

    let (_, created) = send_request(
        &app,
        "POST",
        "/billing/subscriptions",
        Some(&ana_token),
        Some(json!({ "billing_type": "PIX", "value": 10.0 })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    // Bob cannot read or cancel Ana's subscription
    let (status, _) = send_request(
        &app,
        "GET",
        &format!("/billing/subscriptions/{}", id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_request(
        &app,
        "DELETE",
        &format!("/billing/subscriptions/{}", id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob's list is empty, Ana's has one
    let (_, bob_list) = send_request(&app, "GET", "/billing/subscriptions", Some(&bob_token), None).await;
    assert_eq!(bob_list["total"], 0);
    let (_, ana_list) = send_request(&app, "GET", "/billing/subscriptions", Some(&ana_token), None).await;
    assert_eq!(ana_list["total"], 1);
}

#[tokio::test]
async fn test_list_subscriptions_paginates() {
    let (gateway_url, _stub) = spawn_gateway_stub().await;
    let state = test_state(&gateway_url, WebhookHandlers::new(), None);
    let app = cobranca::router(state.clone());
    let (user_id, token) = sign_up(&app, "ana@example.com").await;

    {
        let conn = state.db.get().unwrap();
        for i in 0..5 {
            create_test_subscription(&conn, &user_id, &format!("sub_{}", i), "ACTIVE");
        }
    }

    let (status, body) = send_request(
        &app,
        "GET",
        "/billing/subscriptions?limit=2&offset=4",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["offset"], 4);
    assert_eq!(body["has_more"], false);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}
