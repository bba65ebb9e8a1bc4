//! Route definitions
//!
//! All API routes organized by domain. The paid AI endpoints sit behind
//! the per-kind entitlement gate; the onboarding chat deliberately does
//! not.

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{from_fn_with_state, Next},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::services::ServeFile;

use redbutton_service::EndpointKind;

use crate::handlers::{ai, auth, health, subscription, userdata};
use crate::middleware::entitlement_gate;
use crate::state::AppState;

/// Create the main API router with all routes (excluding health, which is
/// mounted separately to bypass rate limiting)
pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/userdata", userdata_routes())
        .nest("/api/ai", ai_routes(state))
        .nest("/api/subscription", subscription_routes())
        .route_service(
            "/download",
            ServeFile::new(state.config().storage.download_file.clone()),
        )
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health_check))
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/verify-invite", post(auth::verify_invite))
        .route("/me", get(auth::current_user))
        .route("/invite", post(auth::create_invite))
        .route("/admin/generate-invite", post(auth::generate_invite_link))
        .route("/oauth", post(auth::oauth_login))
        .route("/google", get(auth::google_redirect))
        .route("/google/callback", get(auth::google_callback))
}

/// User data routes
fn userdata_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(userdata::get_user_data))
        .route("/settings", patch(userdata::update_settings))
        .route("/emotions", post(userdata::add_emotion))
        .route("/emotions/:emotion_id", delete(userdata::remove_emotion))
        .route("/journal", post(userdata::add_journal_entry))
        .route("/goals", post(userdata::add_goal))
        .route("/initiatives", post(userdata::add_initiative))
        .route("/checkins", post(userdata::add_check_in))
}

/// AI routes; paid endpoints are gated by kind
fn ai_routes(state: &AppState) -> Router<AppState> {
    let max_upload_bytes = state.config().storage.max_upload_mb as usize * 1024 * 1024;

    Router::new()
        .route(
            "/suggestions",
            post(ai::suggestions).route_layer(from_fn_with_state(
                state.clone(),
                |State(state): State<AppState>, request: Request, next: Next| {
                    entitlement_gate(state, EndpointKind::Suggestions, request, next)
                },
            )),
        )
        .route(
            "/journal-template",
            post(ai::journal_template).route_layer(from_fn_with_state(
                state.clone(),
                |State(state): State<AppState>, request: Request, next: Next| {
                    entitlement_gate(state, EndpointKind::Journal, request, next)
                },
            )),
        )
        .route(
            "/polish-entry",
            post(ai::polish_entry).route_layer(from_fn_with_state(
                state.clone(),
                |State(state): State<AppState>, request: Request, next: Next| {
                    entitlement_gate(state, EndpointKind::Polish, request, next)
                },
            )),
        )
        .route(
            "/initiative-chat",
            post(ai::initiative_chat).route_layer(from_fn_with_state(
                state.clone(),
                |State(state): State<AppState>, request: Request, next: Next| {
                    entitlement_gate(state, EndpointKind::Chat, request, next)
                },
            )),
        )
        .route("/onboarding-chat", post(ai::onboarding_chat))
        .route(
            "/upload-file",
            post(ai::upload_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// Subscription routes
fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(subscription::products))
        .route("/create-session", post(subscription::create_session))
        .route("/status", get(subscription::status))
        .route("/restore", post(subscription::restore))
        .route("/webhook", post(subscription::webhook))
}
