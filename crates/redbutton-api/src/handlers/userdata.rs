//! User-data handlers
//!
//! The document read (seeding defaults when absent) and all sub-record
//! mutations.

use axum::{
    extract::{Path, State},
    Json,
};

use redbutton_service::{
    AddCheckInRequest, AddEmotionRequest, AddGoalRequest, AddInitiativeRequest,
    AddJournalEntryRequest, CheckInResponse, EmotionResponse, EmotionsResponse, GoalResponse,
    InitiativeResponse, JournalEntryResponse, SettingsResponse, UpdateSettingsRequest,
    UserDataResponse, UserDataService,
};

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Get the full document, creating defaults when absent
///
/// GET /api/userdata
pub async fn get_user_data(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UserDataResponse>> {
    let service = UserDataService::new(state.service_context());
    let data = service.get_or_create(auth.user.id).await?;
    Ok(Json(UserDataResponse {
        success: true,
        data,
    }))
}

/// Replace the user's settings
///
/// PATCH /api/userdata/settings
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    let service = UserDataService::new(state.service_context());
    let settings = service.update_settings(auth.user.id, request.settings).await?;
    Ok(Json(SettingsResponse {
        success: true,
        settings,
    }))
}

/// Add an emotion
///
/// POST /api/userdata/emotions
pub async fn add_emotion(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AddEmotionRequest>,
) -> ApiResult<Created<Json<EmotionResponse>>> {
    let service = UserDataService::new(state.service_context());
    let (emotion, emotions) = service.add_emotion(auth.user.id, request).await?;
    Ok(Created(Json(EmotionResponse {
        success: true,
        emotion,
        emotions,
    })))
}

/// Remove an emotion by id
///
/// DELETE /api/userdata/emotions/:emotion_id
pub async fn remove_emotion(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(emotion_id): Path<String>,
) -> ApiResult<Json<EmotionsResponse>> {
    let service = UserDataService::new(state.service_context());
    let emotions = service.remove_emotion(auth.user.id, &emotion_id).await?;
    Ok(Json(EmotionsResponse {
        success: true,
        emotions,
    }))
}

/// Create or update the journal entry for a date
///
/// POST /api/userdata/journal
pub async fn add_journal_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AddJournalEntryRequest>,
) -> ApiResult<Json<JournalEntryResponse>> {
    let service = UserDataService::new(state.service_context());
    let (entry, created) = service.upsert_journal_entry(auth.user.id, request).await?;

    let message = if created {
        "Journal entry created"
    } else {
        "Journal entry updated"
    };
    Ok(Json(JournalEntryResponse {
        success: true,
        entry,
        message: message.to_string(),
    }))
}

/// Add a goal
///
/// POST /api/userdata/goals
pub async fn add_goal(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AddGoalRequest>,
) -> ApiResult<Created<Json<GoalResponse>>> {
    let service = UserDataService::new(state.service_context());
    let (goal, goals) = service.add_goal(auth.user.id, request).await?;
    Ok(Created(Json(GoalResponse {
        success: true,
        goal,
        goals,
    })))
}

/// Add an initiative under a goal
///
/// POST /api/userdata/initiatives
pub async fn add_initiative(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AddInitiativeRequest>,
) -> ApiResult<Created<Json<InitiativeResponse>>> {
    let service = UserDataService::new(state.service_context());
    let (initiative, initiatives) = service.add_initiative(auth.user.id, request).await?;
    Ok(Created(Json(InitiativeResponse {
        success: true,
        initiative,
        initiatives,
    })))
}

/// Add a check-in against a goal or initiative
///
/// POST /api/userdata/checkins
pub async fn add_check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AddCheckInRequest>,
) -> ApiResult<Created<Json<CheckInResponse>>> {
    let service = UserDataService::new(state.service_context());
    let (check_in, check_ins) = service.add_check_in(auth.user.id, request).await?;
    Ok(Created(Json(CheckInResponse {
        success: true,
        check_in,
        check_ins,
    })))
}
