use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{Amount, CheckoutResponse, FailRedirect, PaymentConfirmationResult, SuccessRedirect},
    gateway::{ConfirmPayment, GatewayResponse, PaymentGateway},
};
use crate::config::PaymentsConfig;

pub const CHECKOUT_AMOUNT: u64 = 15_000;
pub const ORDER_NAME: &str = "PlateLens premium (1 month)";
pub const CUSTOMER_NAME: &str = "PlateLens member";

pub const MISSING_PARAMS: &str = "Missing required payment information";
pub const CONFIRMATION_FAILED: &str = "Payment confirmation failed";
pub const DEFAULT_FAIL_MESSAGE: &str = "Payment failed. Please try again.";

/// Parameters the hosted checkout widget is opened with.
/// `None` when no client key is configured.
pub fn checkout_params(cfg: &PaymentsConfig, customer_email: Option<String>) -> Option<CheckoutResponse> {
    let client_key = cfg.client_key.clone()?;
    let order_id = Uuid::new_v4().simple().to_string();
    Some(CheckoutResponse {
        client_key,
        method: "CARD",
        amount: Amount {
            currency: "KRW",
            value: CHECKOUT_AMOUNT,
        },
        order_id,
        order_name: ORDER_NAME,
        customer_name: CUSTOMER_NAME,
        customer_email,
        success_url: format!("{}/api/v1/payments/success", cfg.public_base_url),
        fail_url: format!("{}/api/v1/payments/fail", cfg.public_base_url),
    })
}

impl SuccessRedirect {
    /// All three values present and non-empty, amount passed as received.
    pub fn into_request(self) -> Option<ConfirmPayment> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(ConfirmPayment {
            payment_key: present(self.payment_key)?,
            order_id: present(self.order_id)?,
            amount: Value::String(present(self.amount)?),
        })
    }
}

// TODO: compare `amount` with a server-side order total once orders are persisted.
#[instrument(skip(gateway))]
pub async fn confirm_redirect(gateway: &dyn PaymentGateway, redirect: SuccessRedirect) -> PaymentConfirmationResult {
    let Some(req) = redirect.into_request() else {
        warn!("success redirect without payment parameters");
        return PaymentConfirmationResult::failure(MISSING_PARAMS, None);
    };

    match gateway.confirm(&req).await {
        Ok(res) => materialize(&req.order_id, res),
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "payment confirmation failed");
            PaymentConfirmationResult::failure(CONFIRMATION_FAILED, None)
        }
    }
}

/// Turns a gateway reply into a success or failure record.
pub fn materialize(order_id: &str, res: GatewayResponse) -> PaymentConfirmationResult {
    if !res.is_success() {
        let message = res
            .body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(CONFIRMATION_FAILED)
            .to_string();
        let code = res.body.get("code").and_then(Value::as_str).map(str::to_string);
        return PaymentConfirmationResult::Failure {
            message,
            code,
            order_id: Some(order_id.to_string()),
        };
    }

    let order_id = res
        .body
        .get("orderId")
        .and_then(Value::as_str)
        .unwrap_or(order_id)
        .to_string();
    info!(%order_id, "payment confirmed");
    PaymentConfirmationResult::Success {
        order_id,
        total_amount: res.body.get("totalAmount").cloned(),
        method: res.body.get("method").and_then(Value::as_str).map(str::to_string),
        details: res.body,
    }
}

pub fn failure_from_redirect(redirect: FailRedirect) -> PaymentConfirmationResult {
    PaymentConfirmationResult::Failure {
        message: redirect
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_FAIL_MESSAGE.to_string()),
        code: redirect.code.filter(|c| !c.is_empty()),
        order_id: redirect.order_id,
    }
}
