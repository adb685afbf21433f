//! OAuth2 access tokens for the spreadsheet API.
//!
//! A service account signs a short-lived RS256 assertion and trades it for a
//! bearer token (JWT-bearer grant). [`TokenCache`] keeps the token until
//! [`REFRESH_MARGIN_SECS`] before it expires; a cold cache just exchanges again.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::Clock;
use crate::errors::{CheckoutError, Result};

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: i64 = 3600;
const DEFAULT_EXPIRES_IN: i64 = 3600;
pub const REFRESH_MARGIN_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

/// Something that can mint a fresh access token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, now: DateTime<Utc>) -> Result<IssuedToken>;
}

/// Hands out bearer tokens for outbound API calls.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

// ─────────────────────────────────────────────────────────
// Service-account exchange
// ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct ServiceAccount {
    client: Client,
    client_email: String,
    key: EncodingKey,
    token_url: String,
}

impl ServiceAccount {
    /// `private_key` may carry literal `\n` sequences, as environment
    /// variables usually do.
    pub fn new(client: Client, client_email: String, private_key: &str) -> Result<Self> {
        let pem = normalize_private_key(private_key);
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            CheckoutError::Config(format!("GOOGLE_SERVICE_ACCOUNT_PRIVATE_KEY invalide: {e}"))
        })?;
        Ok(Self {
            client,
            client_email,
            key,
            token_url: TOKEN_URL.to_string(),
        })
    }

    pub fn with_token_url(mut self, token_url: String) -> Self {
        self.token_url = token_url;
        self
    }

    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.client_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URL,
            iat,
            exp: iat + ASSERTION_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| CheckoutError::Upstream(format!("Google OAuth: {e}")))
    }
}

#[async_trait]
impl TokenExchange for ServiceAccount {
    async fn exchange(&self, now: DateTime<Utc>) -> Result<IssuedToken> {
        let assertion = self.assertion(now)?;
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body: TokenResponse = resp.json().await.unwrap_or_default();
        if !status.is_success() {
            let msg = body
                .error_description
                .or(body.error)
                .unwrap_or_else(|| "Google OAuth error".to_string());
            return Err(CheckoutError::Upstream(format!("Google OAuth: {msg}")));
        }

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CheckoutError::Upstream("Google OAuth: access_token manquant".to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_in: body.expires_in.filter(|s| *s > 0).unwrap_or(DEFAULT_EXPIRES_IN),
        })
    }
}

pub fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}

// ─────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Process-scoped token cache. The lock is held across a refresh so
/// concurrent callers share one exchange.
pub struct TokenCache {
    exchange: Arc<dyn TokenExchange>,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>, clock: Arc<dyn Clock>) -> Self {
        Self {
            exchange,
            clock,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AccessTokenSource for TokenCache {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = self.clock.now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at > now + Duration::seconds(REFRESH_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let issued = self.exchange.exchange(now).await?;
        debug!(expires_in = issued.expires_in, "access token refreshed");
        *cached = Some(CachedToken {
            access_token: issued.access_token.clone(),
            expires_at: now + Duration::seconds(issued.expires_in),
        });
        Ok(issued.access_token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use jsonwebtoken::decode_header;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing::FixedClock;

    const TEST_KEY: &str = include_str!("../testdata/service_account_key.pem");

    struct CountingExchange {
        calls: AtomicUsize,
        expires_in: i64,
    }

    #[async_trait]
    impl TokenExchange for CountingExchange {
        async fn exchange(&self, _now: DateTime<Utc>) -> Result<IssuedToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(IssuedToken {
                access_token: format!("token-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn reuses_token_until_refresh_margin() {
        let exchange = Arc::new(CountingExchange {
            calls: AtomicUsize::new(0),
            expires_in: 3600,
        });
        let clock = Arc::new(FixedClock::new(start()));
        let cache = TokenCache::new(exchange.clone(), clock.clone());

        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        clock.advance(Duration::seconds(3500));
        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        // 30 s before expiry the token is considered stale
        clock.advance(Duration::seconds(70));
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
        assert_eq!(exchange.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn escaped_newlines_are_restored() {
        let escaped = TEST_KEY.replace('\n', "\\n");
        assert_eq!(normalize_private_key(&escaped), TEST_KEY);
        assert!(ServiceAccount::new(Client::new(), "svc@x".into(), &escaped).is_ok());
        assert!(ServiceAccount::new(Client::new(), "svc@x".into(), "not a key").is_err());
    }

    #[test]
    fn assertion_is_rs256() {
        let account = ServiceAccount::new(Client::new(), "svc@x".into(), TEST_KEY).unwrap();
        let jwt = account.assertion(start()).unwrap();
        assert_eq!(decode_header(&jwt).unwrap().alg, Algorithm::RS256);
        assert_eq!(jwt.split('.').count(), 3);
    }

    #[tokio::test]
    async fn exchanges_assertion_for_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "ya29.x"})),
            )
            .mount(&server)
            .await;

        let account = ServiceAccount::new(Client::new(), "svc@x".into(), TEST_KEY)
            .unwrap()
            .with_token_url(format!("{}/token", server.uri()));
        let issued = account.exchange(start()).await.unwrap();
        assert_eq!(issued.access_token, "ya29.x");
        assert_eq!(issued.expires_in, 3600);
    }

    #[tokio::test]
    async fn oauth_error_is_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"error": "invalid_grant", "error_description": "Invalid JWT"}),
            ))
            .mount(&server)
            .await;

        let account = ServiceAccount::new(Client::new(), "svc@x".into(), TEST_KEY)
            .unwrap()
            .with_token_url(server.uri());
        let err = account.exchange(start()).await.unwrap_err();
        assert_eq!(err.to_string(), "Google OAuth: Invalid JWT");
    }
}
