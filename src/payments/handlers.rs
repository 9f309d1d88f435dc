use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use super::{
    dto::{CheckoutResponse, FailRedirect, MessageBody, PaymentConfirmationResult, SuccessRedirect},
    gateway::{ConfirmPayment, PaymentError},
    services::{self, CONFIRMATION_FAILED},
};
use crate::{auth::extractors::AuthUser, state::AppState};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/checkout", get(checkout))
        .route("/payments/confirm", post(confirm))
        .route("/payments/success", get(success))
        .route("/payments/fail", get(fail))
}

/// GET /payments/checkout
pub async fn checkout(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> Result<Json<CheckoutResponse>, (StatusCode, String)> {
    let email = user.and_then(|AuthUser(u)| u.email);
    services::checkout_params(&state.config.payments, email)
        .map(Json)
        .ok_or((
            StatusCode::SERVICE_UNAVAILABLE,
            "payment client key is not configured".into(),
        ))
}

/// POST /payments/confirm
/// Relays the triple to the gateway; its status and body come back unchanged.
#[instrument(skip_all, fields(order_id = %req.order_id))]
pub async fn confirm(State(state): State<AppState>, Json(req): Json<ConfirmPayment>) -> Response {
    match state.payments.confirm(&req).await {
        Ok(res) => {
            let status = StatusCode::from_u16(res.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, [(header::CONTENT_TYPE, "application/json")], res.raw).into_response()
        }
        Err(PaymentError::Configuration) => {
            error!("confirmation attempted without a gateway secret");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageBody {
                    message: "Payment gateway is not configured",
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "payment relay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageBody {
                    message: CONFIRMATION_FAILED,
                }),
            )
                .into_response()
        }
    }
}

/// GET /payments/success?paymentKey&orderId&amount
pub async fn success(
    State(state): State<AppState>,
    Query(redirect): Query<SuccessRedirect>,
) -> Json<PaymentConfirmationResult> {
    Json(services::confirm_redirect(state.payments.as_ref(), redirect).await)
}

/// GET /payments/fail?code&message&orderId
pub async fn fail(Query(redirect): Query<FailRedirect>) -> Json<PaymentConfirmationResult> {
    Json(services::failure_from_redirect(redirect))
}
