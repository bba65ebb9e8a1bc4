//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize`; those with field constraints
//! also implement `Validate`. Wire field names are camelCase.

use redbutton_core::{EmotionRecord, EntityKind, Settings};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

/// User login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// User registration request.
///
/// With `invite_token` the pre-created invited account is redeemed; without
/// it this is an open registration and `email` is required.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub invite_token: Option<String>,
}

/// Invite token verification request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyInviteRequest {
    #[validate(length(min = 1, message = "Invite token is required"))]
    pub token: String,
}

/// Admin invitation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Shared-secret invite-link generation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInviteLinkRequest {
    pub email: String,
    pub admin_secret: String,
}

/// OAuth login with a provider-issued id token
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OAuthLoginRequest {
    #[validate(length(min = 1, message = "Provider is required"))]
    pub provider: String,

    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

// ============================================================================
// User Data Requests
// ============================================================================

/// Settings replacement request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingsRequest {
    pub settings: Settings,
}

/// Add emotion request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddEmotionRequest {
    #[validate(length(min = 1, message = "Emotion name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Emotion emoji is required"))]
    pub emoji: String,

    pub is_positive: bool,
}

/// Journal upsert request, keyed by date
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddJournalEntryRequest {
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub emotion_records: Vec<EmotionRecord>,

    #[serde(default)]
    pub actions: Vec<String>,
}

/// Add goal request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddGoalRequest {
    #[validate(length(min = 1, message = "Goal text is required"))]
    pub text: String,

    #[serde(default)]
    pub description: String,
}

/// Add initiative request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddInitiativeRequest {
    #[validate(length(min = 1, message = "Initiative text is required"))]
    pub text: String,

    #[validate(length(min = 1, message = "Goal ID is required"))]
    pub goal_id: String,
}

/// Add check-in request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCheckInRequest {
    #[validate(length(min = 1, message = "Check-in content is required"))]
    pub content: String,

    #[validate(length(min = 1, message = "Entity ID is required"))]
    pub entity_id: String,

    pub entity_type: EntityKind,
}

// ============================================================================
// AI Requests
// ============================================================================

fn default_available_minutes() -> u32 {
    10
}

/// Suggestion generation request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsRequest {
    #[validate(length(min = 1, message = "Emotion ID is required"))]
    pub emotion_id: String,

    #[validate(length(min = 1, message = "Emotion name is required"))]
    pub emotion_name: String,

    pub is_positive: bool,

    #[serde(default = "default_available_minutes")]
    pub available_minutes: u32,

    /// Optional hint for positive emotions: "celebrate" or "plan"
    pub action: Option<String>,
}

/// One emotion felt today, for template generation
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionDescriptor {
    pub name: String,
    pub is_positive: bool,
}

/// Journal template generation request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JournalTemplateRequest {
    #[validate(length(min = 1, message = "Missing or invalid emotions data"))]
    pub emotions: Vec<EmotionDescriptor>,

    #[serde(default)]
    pub previous_entries: Vec<String>,
}

/// Entry polishing request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PolishEntryRequest {
    #[validate(length(min = 1, message = "Missing entry content"))]
    pub entry_content: String,
}

/// Goal portion of the chat context
#[derive(Debug, Clone, Deserialize)]
pub struct ChatContextGoal {
    pub text: String,
    #[serde(default)]
    pub description: String,
}

/// Initiative portion of the chat context
#[derive(Debug, Clone, Deserialize)]
pub struct ChatContextInitiative {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// A prior check-in supplied as chat context
#[derive(Debug, Clone, Deserialize)]
pub struct ContextCheckIn {
    pub content: String,
    pub timestamp: String,
}

/// The target of an initiative coaching chat
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub goal: ChatContextGoal,
    pub initiative: ChatContextInitiative,
    #[serde(default)]
    pub check_ins: Vec<ContextCheckIn>,
}

/// Role of a history message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatHistoryRole {
    User,
    Assistant,
}

/// One prior message in a chat session
#[derive(Debug, Clone, Deserialize)]
pub struct ChatHistoryMessage {
    pub role: ChatHistoryRole,
    pub content: String,
}

/// Initiative coaching chat request (streaming)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitiativeChatRequest {
    pub context: ChatContext,

    #[serde(default)]
    pub history: Vec<ChatHistoryMessage>,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// Onboarding chat request (streaming)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OnboardingChatRequest {
    #[serde(default)]
    pub history: Vec<ChatHistoryMessage>,
}

// ============================================================================
// Subscription Requests
// ============================================================================

/// Checkout session creation request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, message = "Product ID is required"))]
    pub product_id: String,
}
