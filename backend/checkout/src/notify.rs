//! Operator notifications for paid orders.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::errors::{CheckoutError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub text: String,
    /// Same as `text`, for receivers that read `content`
    pub content: String,
    pub session_id: String,
    pub payment_intent: String,
    pub livemode: bool,
    pub customer_email: String,
}

impl Notification {
    pub fn new(
        message: String,
        session_id: String,
        payment_intent: String,
        livemode: bool,
        customer_email: String,
    ) -> Self {
        Self {
            content: message.clone(),
            text: message,
            session_id,
            payment_intent,
            livemode,
            customer_email,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Posts the notification as JSON to a generic webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let resp = self.client.post(&self.url).json(notification).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(300).collect();
            return Err(CheckoutError::Upstream(format!(
                "Notification webhook failed ({}): {excerpt}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn notification() -> Notification {
        Notification::new(
            "Nouvelle commande".into(),
            "cs_1".into(),
            "pi_1".into(),
            true,
            "ada@example.com".into(),
        )
    }

    #[tokio::test]
    async fn posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "text": "Nouvelle commande",
                "content": "Nouvelle commande",
                "session_id": "cs_1",
                "payment_intent": "pi_1",
                "livemode": true,
                "customer_email": "ada@example.com"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        WebhookNotifier::new(Client::new(), server.uri())
            .send(&notification())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let err = WebhookNotifier::new(Client::new(), server.uri())
            .send(&notification())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Notification webhook failed (500): down");
    }
}
