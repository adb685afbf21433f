//! Checkout service — entry point.
//!
//! Serves two endpoints for the site configurator: one opens a hosted payment
//! session for a re-priced order, the other receives the provider's signed
//! payment webhook and records paid orders in the spreadsheet ledger.

mod api;
mod checkout;
mod clock;
mod config;
mod errors;
mod ledger;
mod metadata;
mod notify;
mod row;
mod signature;
mod stripe;
mod token;
mod webhook;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clock::{Clock, SystemClock};
use config::{Config, SheetsSetup};
use ledger::GoogleSheetsLedger;
use notify::{Notifier, WebhookNotifier};
use stripe::{PaymentProvider, StripeClient};
use token::{ServiceAccount, TokenCache};
use webhook::{LedgerSetup, WebhookProcessor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // HTTP client shared by every outbound call.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let provider = match &config.stripe_secret_key {
        Some(key) => Some(Arc::new(
            StripeClient::new(client.clone(), key.clone()).with_base_url(config.stripe_api_base.clone()),
        ) as Arc<dyn PaymentProvider>),
        None => {
            warn!("STRIPE_SECRET_KEY not set; checkout endpoint will fail");
            None
        }
    };
    if config.stripe_webhook_secret.is_none() {
        warn!("STRIPE_WEBHOOK_SECRET not set; webhook endpoint will fail");
    }

    let notifier = config
        .notification_webhook_url
        .clone()
        .map(|url| Arc::new(WebhookNotifier::new(client.clone(), url)) as Arc<dyn Notifier>);

    let state = Arc::new(api::AppState {
        public_base_url: config.public_base_url.clone(),
        provider,
        webhook: WebhookProcessor {
            secret: config.stripe_webhook_secret.clone(),
            tolerance_secs: config.webhook_tolerance_secs,
            clock: clock.clone(),
            ledger: ledger_setup(&config.sheets, &client, clock),
            notifier,
        },
    });

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // ─── Shutdown ─────────────────────────────────────────
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl+C received, shutting down");
        trigger.cancel();
    });

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

fn ledger_setup(sheets: &SheetsSetup, client: &Client, clock: Arc<dyn Clock>) -> LedgerSetup {
    match sheets {
        SheetsSetup::Disabled => {
            info!("spreadsheet ledger disabled");
            LedgerSetup::Disabled
        }
        SheetsSetup::Incomplete => {
            warn!("spreadsheet settings incomplete; paid webhooks will fail until fixed");
            LedgerSetup::Incomplete
        }
        SheetsSetup::Ready(cfg) => {
            match ServiceAccount::new(client.clone(), cfg.client_email.clone(), &cfg.private_key) {
                Ok(account) => {
                    let tokens = Arc::new(TokenCache::new(Arc::new(account), clock));
                    let ledger =
                        GoogleSheetsLedger::new(client.clone(), tokens, cfg.sheet_id.clone(), cfg.tab.clone());
                    info!(tab = %cfg.tab, dedupe = cfg.dedupe, "spreadsheet ledger enabled");
                    LedgerSetup::Ready {
                        ledger: Arc::new(ledger),
                        auto_header: cfg.auto_header,
                        dedupe: cfg.dedupe,
                    }
                }
                Err(e) => {
                    error!("{e}");
                    LedgerSetup::Incomplete
                }
            }
        }
    }
}
