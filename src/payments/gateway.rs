use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

/// Confirmation triple as received from the checkout redirect.
/// `amount` is forwarded untouched, string or number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayment {
    pub amount: Value,
    pub order_id: String,
    pub payment_key: String,
}

/// Gateway reply. `raw` is the body text exactly as returned, `body` its
/// parsed form.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Value,
    pub raw: String,
}

impl GatewayResponse {
    pub fn new(status: u16, raw: String) -> Result<Self, PaymentError> {
        let body = serde_json::from_str(&raw).map_err(|e| {
            error!(status, error = %e, "payment gateway body is not JSON");
            PaymentError::InvalidGatewayBody(e.to_string())
        })?;
        Ok(Self { status, body, raw })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment gateway secret key is not configured")]
    Configuration,
    #[error("payment gateway unreachable: {0}")]
    Transport(String),
    #[error("payment gateway returned a non-JSON body: {0}")]
    InvalidGatewayBody(String),
}

impl PaymentError {
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentError::Configuration => "configuration",
            PaymentError::Transport(_) => "transport",
            PaymentError::InvalidGatewayBody(_) => "invalid_gateway_body",
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Server-to-server confirmation. Declines are `Ok` with their status;
    /// only failures of the relay itself are `Err`.
    async fn confirm(&self, req: &ConfirmPayment) -> Result<GatewayResponse, PaymentError>;
}

/// `Basic base64("<secret>:")`
pub fn basic_authorization(secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:", secret)))
}

#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    confirm_url: String,
    secret_key: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(confirm_url: String, secret_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build payment gateway http client")?;
        Ok(Self {
            client,
            confirm_url,
            secret_key,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn confirm(&self, req: &ConfirmPayment) -> Result<GatewayResponse, PaymentError> {
        let secret = self.secret_key.as_deref().ok_or(PaymentError::Configuration)?;

        let response = self
            .client
            .post(&self.confirm_url)
            .header(header::AUTHORIZATION, basic_authorization(secret))
            .json(req)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %req.order_id, "payment confirmation request failed");
                PaymentError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        let res = GatewayResponse::new(status, text)?;

        info!(order_id = %req.order_id, status, "payment gateway responded");
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server};
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    #[test]
    fn authorization_is_secret_with_trailing_colon() {
        // "test_sk_123:" in base64
        assert_eq!(basic_authorization("test_sk_123"), "Basic dGVzdF9za18xMjM6");
    }

    #[test]
    fn confirm_body_keeps_amount_as_received() {
        let req = ConfirmPayment {
            amount: json!("15000"),
            order_id: "ord_1".into(),
            payment_key: "pk_1".into(),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"amount":"15000","orderId":"ord_1","paymentKey":"pk_1"}"#
        );
    }

    async fn fake_gateway(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Basic dGVzdF9za18xMjM6" {
            return (StatusCode::UNAUTHORIZED, Json(json!({"code": "UNAUTHORIZED_KEY"})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "orderId": body["orderId"],
                "totalAmount": 15000,
                "method": "CARD",
                "echoAmount": body["amount"],
            })),
        )
    }

    #[tokio::test]
    async fn confirm_sends_credentials_and_returns_body() {
        let base = spawn_server(Router::new().route("/confirm", post(fake_gateway))).await;
        let gateway = HttpPaymentGateway::new(
            format!("{}/confirm", base),
            Some("test_sk_123".into()),
            Duration::from_secs(5),
        )
        .unwrap();

        let res = gateway
            .confirm(&ConfirmPayment {
                amount: json!(15000),
                order_id: "ord_1".into(),
                payment_key: "pk_1".into(),
            })
            .await
            .unwrap();
        assert!(res.is_success());
        assert_eq!(res.body["orderId"], "ord_1");
        assert_eq!(res.body["echoAmount"], 15000);
    }

    #[test]
    fn response_keeps_raw_text_and_rejects_non_json() {
        let res = GatewayResponse::new(400, r#"{"code":"X","message":"m"}"#.into()).unwrap();
        assert_eq!(res.raw, r#"{"code":"X","message":"m"}"#);
        assert_eq!(res.body["code"], "X");

        let err = GatewayResponse::new(502, "<html>bad gateway</html>".into()).unwrap_err();
        assert_eq!(err.kind(), "invalid_gateway_body");
    }

    #[tokio::test]
    async fn missing_secret_fails_before_network() {
        let gateway = HttpPaymentGateway::new(closed_port_url().await, None, Duration::from_secs(1)).unwrap();
        let err = gateway
            .confirm(&ConfirmPayment {
                amount: json!(1),
                order_id: "o".into(),
                payment_key: "k".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Configuration));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_error() {
        let gateway = HttpPaymentGateway::new(
            closed_port_url().await,
            Some("sk".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = gateway
            .confirm(&ConfirmPayment {
                amount: json!(1),
                order_id: "o".into(),
                payment_key: "k".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
