use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub client_key: String,
    pub method: &'static str,
    pub amount: Amount,
    pub order_id: String,
    pub order_name: &'static str,
    pub customer_name: &'static str,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub fail_url: String,
}

#[derive(Debug, Serialize)]
pub struct Amount {
    pub currency: &'static str,
    pub value: u64,
}

/// Query of the gateway's success redirect. Values are kept as strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRedirect {
    pub payment_key: Option<String>,
    pub order_id: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailRedirect {
    pub code: Option<String>,
    pub message: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

/// Exactly one of the two is produced per confirmation attempt.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentConfirmationResult {
    Success {
        order_id: String,
        total_amount: Option<Value>,
        method: Option<String>,
        details: Value,
    },
    Failure {
        message: String,
        code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        order_id: Option<String>,
    },
}

impl PaymentConfirmationResult {
    pub fn failure(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Failure {
            message: message.into(),
            code,
            order_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
