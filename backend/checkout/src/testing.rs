//! In-memory fakes shared by the handler tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use quote_engine::OrderRecord;
use serde_json::{json, Value};

use crate::clock::Clock;
use crate::errors::{CheckoutError, Result};
use crate::ledger::OrderLedger;
use crate::metadata;
use crate::notify::{Notification, Notifier};
use crate::stripe::{CheckoutSessionRequest, PaymentProvider};

pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn advance(&self, by: Duration) {
        let mut at = self.0.lock().unwrap();
        *at += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<Vec<Value>>>,
    fail: bool,
}

impl MemoryLedger {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn header(&self) -> Vec<Value> {
        self.rows.lock().unwrap().first().cloned().unwrap_or_default()
    }

    pub fn data_rows(&self) -> Vec<Vec<Value>> {
        self.rows.lock().unwrap().iter().skip(1).cloned().collect()
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(CheckoutError::Upstream("Google Sheets API (500) GET Orders!A:A: backend error".into()))
        } else {
            Ok(())
        }
    }
}

fn text(v: &Value) -> String {
    v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())
}

#[async_trait]
impl OrderLedger for MemoryLedger {
    async fn ensure_header(&self, header: &[&str]) -> Result<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.is_empty() {
            rows.push(header.iter().map(|h| json!(h)).collect());
        }
        Ok(())
    }

    async fn find_session_row(&self, session_id: &str) -> Result<Option<usize>> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .position(|r| r.first().map(text).as_deref() == Some(session_id))
            .map(|i| i + 1))
    }

    async fn append_row(&self, row: &[Value]) -> Result<Option<usize>> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        rows.push(row.to_vec());
        Ok(Some(rows.len()))
    }

    async fn read_cell(&self, column: usize, row: usize) -> Result<String> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(row - 1)
            .and_then(|r| r.get(column - 1))
            .map(text)
            .unwrap_or_default())
    }

    async fn write_cell(&self, column: usize, row: usize, value: &str) -> Result<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let target = &mut rows[row - 1];
        if target.len() < column {
            target.resize(column, json!(""));
        }
        target[column - 1] = json!(value);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        if self.fail {
            return Err(CheckoutError::Upstream("Notification webhook failed (503): ".into()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Records session requests and answers with a fixed URL or error.
#[derive(Default)]
pub struct FakeProvider {
    requests: Mutex<Vec<CheckoutSessionRequest>>,
    error: Option<String>,
}

impl FakeProvider {
    pub fn refusing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.error {
            Some(message) => Err(CheckoutError::Provider(message.clone())),
            None => Ok("https://checkout.stripe.test/c/pay/cs_test_1".to_string()),
        }
    }
}

pub fn sample_order() -> OrderRecord {
    let mut order = OrderRecord::default();
    order.created_at = "2024-05-01T09:58:00.000Z".into();
    order.customer.first_name = "Ada".into();
    order.customer.last_name = "Lovelace".into();
    order.customer.email = "ada@example.com".into();
    order.project.niche = "jardin".into();
    order.config.langs = vec!["fr".into()];
    order.config.checks.insert("performance".into(), true);
    order.totals.one_shot = 1050;
    order
}

/// Serialized `checkout.session.completed` event for a paid session with the
/// sample order embedded in its metadata.
pub fn paid_event(session_id: &str) -> Vec<u8> {
    let metadata: BTreeMap<String, String> = metadata::encode_order(&sample_order())
        .unwrap()
        .into_iter()
        .collect();
    let event = json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": session_id,
            "object": "checkout.session",
            "payment_intent": "pi_1",
            "livemode": false,
            "payment_status": "paid",
            "amount_total": 105000,
            "currency": "eur",
            "metadata": metadata
        }}
    });
    serde_json::to_vec(&event).unwrap()
}
