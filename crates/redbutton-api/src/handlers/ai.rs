//! AI handlers
//!
//! Non-streaming completions, the two SSE relay endpoints, and the file
//! upload passthrough.

use std::convert::Infallible;
use std::io::Write;

use axum::{
    extract::{Multipart, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use tokio_stream::StreamExt;

use redbutton_service::{
    AiService, ChatService, InitiativeChatRequest, JournalTemplateRequest, OnboardingChatRequest,
    PolishEntryRequest, PolishResponse, SuggestionsRequest, SuggestionsResponse, TemplateResponse,
    UploadResponse,
};

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// Generate suggestions for an emotion
///
/// POST /api/ai/suggestions
pub async fn suggestions(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<SuggestionsRequest>,
) -> ApiResult<Json<SuggestionsResponse>> {
    let service = AiService::new(state.service_context());
    let suggestions = service.suggestions(&auth.user, request).await?;
    Ok(Json(SuggestionsResponse {
        success: true,
        suggestions,
    }))
}

/// Generate a journal template
///
/// POST /api/ai/journal-template
pub async fn journal_template(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<JournalTemplateRequest>,
) -> ApiResult<Json<TemplateResponse>> {
    let service = AiService::new(state.service_context());
    let template = service.journal_template(&auth.user, request).await?;
    Ok(Json(TemplateResponse {
        success: true,
        template,
    }))
}

/// Polish a journal entry
///
/// POST /api/ai/polish-entry
pub async fn polish_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<PolishEntryRequest>,
) -> ApiResult<Json<PolishResponse>> {
    let service = AiService::new(state.service_context());
    let polished_content = service.polish_entry(&auth.user, request).await?;
    Ok(Json(PolishResponse {
        success: true,
        polished_content,
    }))
}

fn sse_event<T: serde::Serialize>(payload: &T) -> Result<Event, Infallible> {
    match serde_json::to_string(payload) {
        Ok(data) => Ok(Event::default().data(data)),
        // Serialization of these payloads cannot fail in practice; fall
        // back to an in-band error event rather than dropping the stream
        Err(e) => Ok(Event::default().data(format!("{{\"error\":\"{e}\"}}"))),
    }
}

/// Initiative coaching chat over server-sent events
///
/// POST /api/ai/initiative-chat
pub async fn initiative_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<InitiativeChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let service = ChatService::new(state.service_context());
    let stream = service
        .initiative_stream(auth.user.api_key.as_deref(), request)
        .map(|event| sse_event(&event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Onboarding chat over server-sent events (not subscription-gated)
///
/// POST /api/ai/onboarding-chat
pub async fn onboarding_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<OnboardingChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let service = ChatService::new(state.service_context());
    let stream = service
        .onboarding_stream(auth.user.api_key.as_deref(), request)
        .map(|event| sse_event(&event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Forward a multipart upload to the completion provider's file storage
///
/// POST /api/ai/upload-file
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    // The temp file is dropped (and deleted) on every exit path
    let mut spooled: Option<(tempfile::NamedTempFile, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_body(format!("Error parsing file upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or("uploaded-file")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid_body(format!("Error reading file upload: {e}")))?;

        let mut file = tempfile::NamedTempFile::new().map_err(ApiError::internal)?;
        file.write_all(&bytes).map_err(ApiError::internal)?;
        file.flush().map_err(ApiError::internal)?;

        spooled = Some((file, filename));
        break;
    }

    let (file, filename) =
        spooled.ok_or_else(|| ApiError::invalid_body("No file uploaded"))?;

    let service = AiService::new(state.service_context());
    let uploaded = service
        .upload_file(&auth.user, file.path(), &filename)
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        file_id: uploaded.id,
        filename: uploaded.filename,
    }))
}
