//! Payment provider client and the webhook event shapes it sends back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{CheckoutError, Result};

pub const PRODUCT_NAME: &str = "E-Com Shop — Machine d’affiliation (pack configuré)";
pub const METADATA_SOURCE: &str = "online-affiliate.com";
const CURRENCY: &str = "eur";

pub const EVENT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const EVENT_ASYNC_PAYMENT_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";

/// Opens hosted payment sessions.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Returns the redirect URL of the new session.
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String>;
}

// ─────────────────────────────────────────────────────────
// Session request
// ─────────────────────────────────────────────────────────

/// One aggregated line item paid in a single hosted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    /// Public origin, without trailing slash
    pub base_url: String,
    pub customer_email: String,
    pub amount_cents: i64,
    /// Ordered `metadata[...]` entries
    pub metadata: Vec<(String, String)>,
}

impl CheckoutSessionRequest {
    pub fn success_url(&self) -> String {
        format!("{}/merci/?session_id={{CHECKOUT_SESSION_ID}}", self.base_url)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/paiement/annule/", self.base_url)
    }

    /// Form body in the provider's bracketed-key encoding.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url()),
            ("cancel_url".to_string(), self.cancel_url()),
            ("customer_email".to_string(), self.customer_email.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                CURRENCY.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                PRODUCT_NAME.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                self.amount_cents.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];
        form.extend(
            self.metadata
                .iter()
                .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
        );
        form
    }
}

// ─────────────────────────────────────────────────────────
// HTTP client
// ─────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct SessionResponse {
    url: Option<String>,
    error: Option<ProviderError>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProviderError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(client: Client, secret_key: String) -> Self {
        Self {
            client,
            api_base: "https://api.stripe.com".to_string(),
            secret_key,
        }
    }

    pub fn with_base_url(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&request.to_form())
            .send()
            .await
            .map_err(|e| CheckoutError::Provider(format!("Stripe: {e}")))?;

        let status = resp.status();
        let body: SessionResponse = resp.json().await.unwrap_or_default();

        if !status.is_success() {
            let message = body
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Erreur Stripe.".to_string());
            warn!(%status, "checkout session refused: {message}");
            return Err(CheckoutError::Provider(message));
        }

        match body.url.filter(|u| !u.is_empty()) {
            Some(url) => {
                debug!("checkout session created");
                Ok(url)
            }
            None => Err(CheckoutError::Provider(
                "Stripe: URL de checkout manquante.".to_string(),
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Webhook event shapes
// ─────────────────────────────────────────────────────────

/// Inbound event. Every field defaults so partial payloads still parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookEvent {
    #[serde(rename = "type", deserialize_with = "string_or_empty")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventData {
    pub object: CheckoutSession,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutSession {
    #[serde(deserialize_with = "string_or_empty")]
    pub id: String,
    /// Id of the payment intent, also when the provider expanded it.
    #[serde(deserialize_with = "string_or_empty")]
    pub payment_intent: String,
    #[serde(deserialize_with = "bool_or_false")]
    pub livemode: bool,
    #[serde(deserialize_with = "string_or_empty")]
    pub payment_status: String,
    #[serde(deserialize_with = "int_or_none")]
    pub amount_total: Option<i64>,
    #[serde(deserialize_with = "string_or_empty")]
    pub currency: String,
    #[serde(deserialize_with = "string_map")]
    pub metadata: BTreeMap<String, String>,
}

impl WebhookEvent {
    pub fn is_payment_confirmation(&self) -> bool {
        self.kind == EVENT_SESSION_COMPLETED || self.kind == EVENT_ASYNC_PAYMENT_SUCCEEDED
    }
}

/// Provider dashboard page for the payment, or for the session when no
/// payment intent is known.
pub fn dashboard_url(livemode: bool, session_id: &str, payment_intent: &str) -> String {
    let base = if livemode {
        "https://dashboard.stripe.com"
    } else {
        "https://dashboard.stripe.com/test"
    };
    if payment_intent.is_empty() {
        format!("{base}/checkout/sessions/{session_id}")
    } else {
        format!("{base}/payments/{payment_intent}")
    }
}

fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    })
}

fn bool_or_false<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    Ok(Value::deserialize(d)?.as_bool().unwrap_or(false))
}

fn int_or_none<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn string_map<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error> {
    let Value::Object(map) = Value::deserialize(d)? else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            Value::Number(n) => Some((k, n.to_string())),
            _ => None,
        })
        .collect())
}
