//! Axum HTTP handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use quote_engine::CHECKOUT_ENDPOINT;
use serde::Serialize;
use serde_json::{json, Value};

use crate::checkout;
use crate::errors::{CheckoutError, Result};
use crate::signature::SIGNATURE_HEADER;
use crate::stripe::PaymentProvider;
use crate::webhook::WebhookProcessor;

pub const WEBHOOK_ENDPOINT: &str = "/api/stripe-webhook";
/// Paths the first site release posted to.
pub const LEGACY_CHECKOUT_ENDPOINT: &str = "/.netlify/functions/create-checkout-session";
pub const LEGACY_WEBHOOK_ENDPOINT: &str = "/.netlify/functions/stripe-webhook";

pub struct AppState {
    pub public_base_url: Option<String>,
    /// `None` when no provider secret key is configured
    pub provider: Option<Arc<dyn PaymentProvider>>,
    pub webhook: WebhookProcessor,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/create-checkout-session`
///
/// Body: an order record. Answers `{url}` or `{error}`.
pub async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckoutResponse>> {
    let provider = state.provider.as_deref().ok_or_else(|| {
        CheckoutError::Config("STRIPE_SECRET_KEY manquant (variable d’environnement).".to_string())
    })?;
    let base_url = public_base_url(state.public_base_url.as_deref(), &headers)?;
    let url = checkout::start_checkout(provider, &body, &base_url).await?;
    Ok(Json(CheckoutResponse { url }))
}

/// `POST /api/stripe-webhook`
///
/// The raw body is verified as received; it is parsed only afterwards.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let outcome = state.webhook.process(signature, &body).await?;
    Ok(Json(outcome.receipt()))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "Method not allowed"})),
    )
}

/// Configured origin, else rebuilt from the proxy headers.
pub fn public_base_url(configured: Option<&str>, headers: &HeaderMap) -> Result<String> {
    if let Some(url) = configured {
        return Ok(url.trim_end_matches('/').to_string());
    }
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or_default().trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let proto = header("x-forwarded-proto").unwrap_or_else(|| "https".to_string());
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .ok_or_else(|| CheckoutError::Config("PUBLIC_BASE_URL manquant.".to_string()))?;
    Ok(format!("{proto}://{host}"))
}

pub fn router(state: Arc<AppState>) -> Router {
    let checkout = post(create_checkout_session).fallback(method_not_allowed);
    let webhook = post(stripe_webhook).fallback(method_not_allowed);
    Router::new()
        .route("/health", get(health))
        .route(CHECKOUT_ENDPOINT, checkout.clone())
        .route(LEGACY_CHECKOUT_ENDPOINT, checkout)
        .route(WEBHOOK_ENDPOINT, webhook.clone())
        .route(LEGACY_WEBHOOK_ENDPOINT, webhook)
        .with_state(state)
}
