//! Subscription handlers
//!
//! Products listing, checkout-session creation, status, restore, and the
//! webhook endpoint (raw body, signature verified before parsing).

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use redbutton_providers::WEBHOOK_SIGNATURE_HEADER;
use redbutton_service::{
    CheckoutOutcome, CreateSessionRequest, ProductsResponse, RestoreOutcome,
    SubscriptionService, SubscriptionStatusResponse,
};

use redbutton_common::AppError;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// List the configured subscription products
///
/// GET /api/subscription/products
pub async fn products(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<ProductsResponse>> {
    let service = SubscriptionService::new(state.service_context());
    Ok(Json(service.products()))
}

/// Create a checkout session (or report an existing subscription)
///
/// POST /api/subscription/create-session
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateSessionRequest>,
) -> ApiResult<Json<Value>> {
    let service = SubscriptionService::new(state.service_context());
    let outcome = service.create_session(&auth.user, &request.product_id).await?;

    let body = match outcome {
        CheckoutOutcome::SessionCreated { session_id, url } => json!({
            "success": true,
            "data": { "sessionId": session_id, "url": url }
        }),
        CheckoutOutcome::AlreadySubscribed {
            subscription_id,
            status,
        } => json!({
            "success": true,
            "message": "You already have an active subscription.",
            "data": {
                "alreadySubscribed": true,
                "subscriptionId": subscription_id,
                "status": status
            }
        }),
    };

    Ok(Json(body))
}

/// Get the cached subscription status
///
/// GET /api/subscription/status
pub async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SubscriptionStatusResponse>> {
    let service = SubscriptionService::new(state.service_context());
    let data = service.status(auth.user.id).await?;
    Ok(Json(SubscriptionStatusResponse {
        success: true,
        data,
    }))
}

/// Re-derive the subscription fields from the billing provider
///
/// POST /api/subscription/restore
pub async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Value>> {
    let service = SubscriptionService::new(state.service_context());
    let outcome = service.restore(auth.user.id).await?;

    let body = match outcome {
        RestoreOutcome::Restored(fields) => json!({
            "success": true,
            "message": "Subscription restored.",
            "data": fields
        }),
        RestoreOutcome::NothingToRestore => json!({
            "success": false,
            "message": "No active subscription found to restore."
        }),
    };

    Ok(Json(body))
}

/// Billing provider webhook; the raw body is verified against the
/// signature header before any parsing
///
/// POST /api/subscription/webhook
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let service = SubscriptionService::new(state.service_context());

    // Any failure here answers 400: the provider retries on 5xx, and a
    // retry storm must never be driven by our own errors
    if let Err(e) = service.handle_webhook(&body, signature).await {
        tracing::warn!(error = %e, "Webhook handling failed");
        return Err(ApiError::App(AppError::WebhookRejected(
            "Webhook error".to_string(),
        )));
    }

    Ok(Json(json!({ "received": true })))
}
