//! Checkout session initiator.
//!
//! Prices the posted order again from its `config` alone, then asks the
//! provider for a hosted session charging exactly that amount. Client totals
//! are never read; the embedded copy of the order carries the recomputed ones.

use quote_engine::assembler::is_valid_email;
use quote_engine::format::{build_recap, delivery_text};
use quote_engine::order::Totals;
use quote_engine::{authoritative_quote, OrderRecord, PRICING_VERSION};
use serde_json::Value;
use tracing::info;

use crate::errors::{CheckoutError, Result};
use crate::metadata::{self, ChunkError};
use crate::stripe::{CheckoutSessionRequest, PaymentProvider, METADATA_SOURCE};

const DELIVERY_METADATA_MAX: usize = 200;

/// Parse an untrusted request body into an order. Requires a `customer` object.
pub fn parse_order(body: &[u8]) -> Result<OrderRecord> {
    let invalid = || CheckoutError::Validation("Commande invalide.".to_string());
    let value: Value = serde_json::from_slice(body).map_err(|_| invalid())?;
    if !value.get("customer").is_some_and(Value::is_object) {
        return Err(invalid());
    }
    serde_json::from_value(value).map_err(|_| invalid())
}

/// Validate and price `order`, producing the provider request.
pub fn build_session_request(mut order: OrderRecord, base_url: &str) -> Result<CheckoutSessionRequest> {
    let email = order.customer.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(CheckoutError::Validation("Email invalide.".to_string()));
    }

    let quote = authoritative_quote(&order.config)?;
    let amount_cents = i64::from(quote.one_shot_total) * 100;
    if amount_cents <= 0 {
        return Err(CheckoutError::Validation("Montant invalide.".to_string()));
    }

    order.totals = Totals {
        one_shot: quote.one_shot_total.into(),
        monthly: quote.monthly_total.into(),
    };
    order.recap = build_recap(&quote);
    if order.project.estimated_delivery.trim().is_empty() {
        order.project.estimated_delivery = delivery_text(quote.delivery);
    }

    let langs: Vec<&str> = order
        .config
        .langs
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();

    let mut meta = vec![("source".to_string(), METADATA_SOURCE.to_string())];
    let name = order.customer.display_name();
    if !name.is_empty() {
        meta.push(("customer_name".to_string(), name));
    }
    let niche = order.project.niche.trim();
    if !niche.is_empty() {
        meta.push(("niche".to_string(), niche.to_string()));
    }
    let delay = order.project.estimated_delivery.trim();
    if !delay.is_empty() {
        let delay: String = delay.chars().take(DELIVERY_METADATA_MAX).collect();
        meta.push(("delai_estime".to_string(), delay));
    }
    meta.push(("langues".to_string(), langs.join(",")));
    meta.push(("nombre_langues".to_string(), langs.len().to_string()));
    meta.push(("mensuel_selectionne".to_string(), quote.monthly_total.to_string()));
    meta.push(("pricing_version".to_string(), PRICING_VERSION.to_string()));

    let chunks = metadata::encode_order(&order).map_err(|e| match e {
        ChunkError::TooLarge(_) => CheckoutError::Validation("Commande trop volumineuse.".to_string()),
        other => CheckoutError::Upstream(other.to_string()),
    })?;
    meta.extend(chunks);

    Ok(CheckoutSessionRequest {
        base_url: base_url.trim_end_matches('/').to_string(),
        customer_email: email,
        amount_cents,
        metadata: meta,
    })
}

/// Full initiator: parse, price, open the session. Returns the redirect URL.
pub async fn start_checkout(
    provider: &dyn PaymentProvider,
    body: &[u8],
    base_url: &str,
) -> Result<String> {
    let order = parse_order(body)?;
    let request = build_session_request(order, base_url)?;
    let url = provider.create_checkout_session(&request).await?;
    info!(amount_cents = request.amount_cents, "checkout session opened");
    Ok(url)
}
