//! Payment webhook processing.
//!
//! verify signature → filter event → extract order → persist (idempotent by
//! session id) → notify (at most once when the ledger records the stamp).
//!
//! Ledger failures propagate so the provider retries the delivery; the
//! notification side channel only logs.

use std::sync::Arc;

use quote_engine::OrderRecord;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::errors::{CheckoutError, Result};
use crate::ledger::OrderLedger;
use crate::metadata;
use crate::notify::{Notification, Notifier};
use crate::row::{build_row, iso_timestamp, operator_message, HEADER, NOTIFICATION_COLUMN};
use crate::signature;
use crate::stripe::{dashboard_url, CheckoutSession, WebhookEvent};

pub enum LedgerSetup {
    Disabled,
    /// Partially configured; every paid event fails until fixed.
    Incomplete,
    Ready {
        ledger: Arc<dyn OrderLedger>,
        auto_header: bool,
        dedupe: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    IgnoredType(String),
    IgnoredPaymentStatus(String),
    MissingSessionId,
    Processed {
        session_id: String,
        /// Ledger row holding the order, when the ledger is enabled
        row: Option<usize>,
        /// True when an existing row was found and nothing was appended
        duplicate: bool,
        notified: bool,
    },
}

impl WebhookOutcome {
    /// Acknowledgement body returned to the provider.
    pub fn receipt(&self) -> Value {
        match self {
            Self::IgnoredType(kind) => json!({"received": true, "ignored": true, "type": kind}),
            Self::IgnoredPaymentStatus(status) => {
                json!({"received": true, "ignored": true, "payment_status": status})
            }
            Self::MissingSessionId => {
                json!({"received": true, "ignored": true, "reason": "missing_session_id"})
            }
            Self::Processed { session_id, .. } => {
                json!({"received": true, "ok": true, "session_id": session_id})
            }
        }
    }
}

pub struct WebhookProcessor {
    pub secret: Option<String>,
    pub tolerance_secs: i64,
    pub clock: Arc<dyn Clock>,
    pub ledger: LedgerSetup,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl WebhookProcessor {
    pub async fn process(&self, signature_header: &str, payload: &[u8]) -> Result<WebhookOutcome> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| CheckoutError::Config("STRIPE_WEBHOOK_SECRET manquant.".to_string()))?;

        let now = self.clock.now();
        signature::verify(secret, signature_header, payload, now.timestamp(), self.tolerance_secs)
            .map_err(|e| {
                warn!(reason = e.reason(), "webhook signature rejected");
                CheckoutError::Signature(e)
            })?;

        let event: WebhookEvent =
            serde_json::from_slice(payload).map_err(|_| CheckoutError::InvalidPayload)?;

        if !event.is_payment_confirmation() {
            info!(kind = %event.kind, "webhook event ignored");
            return Ok(WebhookOutcome::IgnoredType(event.kind));
        }

        let session = event.data.object;
        if session.payment_status != "paid" {
            info!(status = %session.payment_status, "unpaid session ignored");
            return Ok(WebhookOutcome::IgnoredPaymentStatus(session.payment_status));
        }
        if session.id.is_empty() {
            return Ok(WebhookOutcome::MissingSessionId);
        }

        let order = match metadata::decode_order(&session.metadata) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(session_id = %session.id, "order not recoverable from metadata: {e}");
                None
            }
        };

        if matches!(self.ledger, LedgerSetup::Incomplete) {
            return Err(CheckoutError::Config(
                "Google Sheets: variables d’environnement incomplètes (GOOGLE_SHEETS_ID/TAB + GOOGLE_SERVICE_ACCOUNT_EMAIL/PRIVATE_KEY)."
                    .to_string(),
            ));
        }

        let dashboard = dashboard_url(session.livemode, &session.id, &session.payment_intent);
        let (row, duplicate) = self.persist(&session, order.as_ref(), &dashboard).await?;
        let notified = self.notify(&session, order.as_ref(), &dashboard, row).await?;

        info!(session_id = %session.id, ?row, duplicate, notified, "paid order processed");
        Ok(WebhookOutcome::Processed {
            session_id: session.id,
            row,
            duplicate,
            notified,
        })
    }

    async fn persist(
        &self,
        session: &CheckoutSession,
        order: Option<&OrderRecord>,
        dashboard: &str,
    ) -> Result<(Option<usize>, bool)> {
        let LedgerSetup::Ready {
            ledger,
            auto_header,
            dedupe,
        } = &self.ledger
        else {
            return Ok((None, false));
        };

        if *auto_header {
            ledger.ensure_header(&HEADER).await?;
        }

        if *dedupe {
            if let Some(existing) = ledger.find_session_row(&session.id).await? {
                info!(session_id = %session.id, row = existing, "session already recorded");
                return Ok((Some(existing), true));
            }
        }

        let values = build_row(session, order, dashboard, self.clock.now());
        let row = ledger.append_row(&values).await?;
        Ok((row, false))
    }

    async fn notify(
        &self,
        session: &CheckoutSession,
        order: Option<&OrderRecord>,
        dashboard: &str,
        row: Option<usize>,
    ) -> Result<bool> {
        let Some(notifier) = &self.notifier else {
            return Ok(false);
        };

        let stamp_target = match (&self.ledger, row) {
            (LedgerSetup::Ready { ledger, .. }, Some(row)) => Some((ledger, row)),
            _ => None,
        };

        if let Some((ledger, row)) = stamp_target {
            let stamp = ledger.read_cell(NOTIFICATION_COLUMN, row).await?;
            if !stamp.trim().is_empty() {
                info!(session_id = %session.id, "operator already notified");
                return Ok(false);
            }
        }

        let notification = Notification::new(
            operator_message(session, order, dashboard),
            session.id.clone(),
            session.payment_intent.clone(),
            session.livemode,
            order.map(|o| o.customer.email.clone()).unwrap_or_default(),
        );

        let sent = async {
            notifier.send(&notification).await?;
            if let Some((ledger, row)) = stamp_target {
                ledger
                    .write_cell(NOTIFICATION_COLUMN, row, &iso_timestamp(self.clock.now()))
                    .await?;
            }
            Ok::<_, CheckoutError>(())
        }
        .await;

        match sent {
            Ok(()) => Ok(true),
            Err(e) => {
                error!(session_id = %session.id, "operator notification failed: {e}");
                Ok(false)
            }
        }
    }
}
