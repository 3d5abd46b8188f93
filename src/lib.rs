//! Cobranca - self-hosted billing bridge for the Asaas payment gateway
//!
//! This library wires a small user/session store to Asaas: signed-up users
//! are provisioned as gateway customers, session-authenticated endpoints
//! create and cancel subscriptions and one-time charges (Pix, Boleto,
//! credit card), and the inbound webhook keeps the local subscription and
//! payment mirrors in sync while dispatching classified events to
//! caller-supplied handlers.

pub mod asaas;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod webhook;

use axum::Router;

use db::AppState;

/// The full application router: account + billing endpoints and the
/// webhook. Embedders attach their own [`webhook::WebhookHandlers`] via
/// [`AppState`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::router())
        .merge(webhook::router())
        .with_state(state)
}
