//! Application-wide error types and their HTTP mapping.
//!
//! | Variant          | Status | Meaning                                         |
//! |------------------|--------|-------------------------------------------------|
//! | `Validation`     | 400    | caller input rejected, no side effects          |
//! | `InvalidPayload` | 400    | webhook body is not JSON                        |
//! | `Signature`      | 400    | webhook authenticity check failed               |
//! | `Provider`       | 502    | payment provider refused or answered badly      |
//! | everything else  | 500    | config or upstream failure; webhooks get retried |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quote_engine::QuoteError;
use serde::Serialize;
use thiserror::Error;

use crate::signature::SignatureError;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid JSON payload")]
    InvalidPayload,

    #[error("Invalid Stripe signature")]
    Signature(SignatureError),

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<QuoteError> for CheckoutError {
    fn from(e: QuoteError) -> Self {
        Self::Validation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl CheckoutError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidPayload | Self::Signature(_) => StatusCode::BAD_REQUEST,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Upstream(_) | Self::Config(_) | Self::Http(_) | Self::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let reason = match &self {
            Self::Signature(e) => Some(e.reason()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            reason,
        };
        (self.status(), Json(body)).into_response()
    }
}
