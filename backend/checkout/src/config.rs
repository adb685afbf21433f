//! Application configuration loaded from environment variables.
//!
//! Only the listening port must parse. Every secret is optional at startup:
//! the endpoint that needs a missing secret answers 500 instead.

use crate::errors::{CheckoutError, Result};
use crate::signature::DEFAULT_TOLERANCE_SECS;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the HTTP server
    pub api_port: u16,
    /// Public origin used for the payment success/cancel URLs. When unset the
    /// origin is rebuilt from the forwarded proto/host request headers.
    pub public_base_url: Option<String>,
    /// Payment provider secret key (required by the checkout endpoint)
    pub stripe_secret_key: Option<String>,
    /// Payment provider API origin
    pub stripe_api_base: String,
    /// Webhook signing secret (required by the webhook endpoint)
    pub stripe_webhook_secret: Option<String>,
    /// Accepted clock skew for signed webhook timestamps
    pub webhook_tolerance_secs: i64,
    pub sheets: SheetsSetup,
    /// Generic JSON webhook receiving operator notifications
    pub notification_webhook_url: Option<String>,
}

/// Spreadsheet ledger settings, resolved from four related variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetsSetup {
    /// None of the sheet variables is set.
    Disabled,
    /// Some but not all are set; the webhook refuses to run half-configured.
    Incomplete,
    Ready(SheetsConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub sheet_id: String,
    pub tab: String,
    pub client_email: String,
    pub private_key: String,
    /// Write the header row when the first row is blank
    pub auto_header: bool,
    /// Look the session id up before appending
    pub dedupe: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            api_port: env_var("API_PORT")
                .or_else(|_| env_var("PORT"))
                .unwrap_or_else(|_| "8888".to_string())
                .parse()
                .map_err(|_| CheckoutError::Config("Invalid API_PORT".to_string()))?,
            public_base_url: optional("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_api_base: optional("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_string()),
            stripe_webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
            webhook_tolerance_secs: match optional("STRIPE_WEBHOOK_TOLERANCE_SECS") {
                Some(v) => v.parse().map_err(|_| {
                    CheckoutError::Config("Invalid STRIPE_WEBHOOK_TOLERANCE_SECS".to_string())
                })?,
                None => DEFAULT_TOLERANCE_SECS,
            },
            sheets: SheetsSetup::resolve(
                optional("GOOGLE_SHEETS_ID").or_else(|| optional("GOOGLE_SHEET_ID")),
                optional("GOOGLE_SHEETS_TAB").unwrap_or_else(|| "Orders".to_string()),
                optional("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
                optional("GOOGLE_SERVICE_ACCOUNT_PRIVATE_KEY"),
                flag("GOOGLE_SHEETS_AUTO_HEADER"),
                flag("GOOGLE_SHEETS_DEDUP"),
            ),
            notification_webhook_url: optional("ORDER_NOTIFICATION_WEBHOOK_URL"),
        })
    }
}

impl SheetsSetup {
    pub fn resolve(
        sheet_id: Option<String>,
        tab: String,
        client_email: Option<String>,
        private_key: Option<String>,
        auto_header: bool,
        dedupe: bool,
    ) -> Self {
        match (sheet_id, client_email, private_key) {
            (None, None, None) => Self::Disabled,
            (Some(sheet_id), Some(client_email), Some(private_key)) if !tab.is_empty() => {
                Self::Ready(SheetsConfig {
                    sheet_id,
                    tab,
                    client_email,
                    private_key,
                    auto_header,
                    dedupe,
                })
            }
            _ => Self::Incomplete,
        }
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| CheckoutError::Config(format!("Missing env var: {key}")))
}

/// Trimmed value, `None` when unset or blank.
fn optional(key: &str) -> Option<String> {
    env_var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Boolean switch that defaults to on; only `false` turns it off.
fn flag(key: &str) -> bool {
    optional(key).map_or(true, |v| !v.eq_ignore_ascii_case("false"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn sheets_disabled_when_nothing_set() {
        let setup = SheetsSetup::resolve(None, "Orders".into(), None, None, true, true);
        assert_eq!(setup, SheetsSetup::Disabled);
    }

    #[test]
    fn sheets_incomplete_when_partially_set() {
        let setup = SheetsSetup::resolve(some("sheet"), "Orders".into(), None, None, true, true);
        assert_eq!(setup, SheetsSetup::Incomplete);
        let setup = SheetsSetup::resolve(None, "Orders".into(), some("svc@x"), None, true, true);
        assert_eq!(setup, SheetsSetup::Incomplete);
    }

    #[test]
    fn sheets_ready_with_all_parts() {
        let setup = SheetsSetup::resolve(
            some("sheet"),
            "Orders".into(),
            some("svc@x"),
            some("key"),
            true,
            false,
        );
        match setup {
            SheetsSetup::Ready(cfg) => {
                assert_eq!(cfg.tab, "Orders");
                assert!(!cfg.dedupe);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
