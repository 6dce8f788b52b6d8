//! HTTP Handlers
//!
//! The two entry points the host platform exposes: checkout
//! submission (JSON in, redirect URL out) and the processor callback
//! (redirect out, no body).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};

use paygate::{CheckoutOutcome, CommerceHost, Currency};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: u64,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub order: Option<u64>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Currencies the processor currently accepts (static fallback when
/// the processor is unreachable).
pub async fn list_currencies(State(state): State<AppState>) -> Json<Vec<Currency>> {
    Json(state.gateway.api().active_currencies().await)
}

/// Submit a checkout: initiate the hosted transaction and hand back
/// the processor redirect.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.gateway.initiate_payment_for_order(payload.order_id).await {
        Ok(CheckoutOutcome::Redirect(redirect_url)) => {
            Ok(Json(CheckoutResponse { redirect_url }))
        }
        Ok(CheckoutOutcome::Declined(message)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: message,
                code: "PAYMENT_DECLINED".into(),
            }),
        )),
        Err(e) => {
            tracing::error!(order_id = payload.order_id, error = %e, "checkout failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Checkout could not be processed".into(),
                    code: "CHECKOUT_ERROR".into(),
                }),
            ))
        }
    }
}

/// Processor callback: reconcile the transaction status and redirect
/// the shopper. Never returns a body; an unknown or missing order
/// lands on the store page.
pub async fn gateway_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let Some(order_id) = params.order else {
        tracing::warn!("callback without an order parameter");
        return Redirect::to(&state.host.store_url());
    };

    let target = state.gateway.handle_callback(order_id).await;
    Redirect::to(&target)
}
