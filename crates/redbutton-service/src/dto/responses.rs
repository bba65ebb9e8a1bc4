//! Response DTOs for API endpoints
//!
//! Every success body carries a `success: true` envelope flag; errors are
//! shaped by the API layer's error translation. Wire field names are
//! camelCase.

use chrono::{DateTime, Utc};
use redbutton_core::{
    CheckIn, Emotion, Goal, Initiative, JournalEntry, Settings, SubscriptionType, User, UserData,
    UserRole,
};
use serde::Serialize;
use uuid::Uuid;

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub role: UserRole,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            role: user.role,
        }
    }
}

/// Login / registration / OAuth response
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserView,
}

impl AuthResponse {
    pub fn new(token: String, user: &User) -> Self {
        Self {
            success: true,
            token,
            user: UserView::from(user),
        }
    }
}

/// Generic success acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Payload of a successful invite verification
#[derive(Debug, Clone, Serialize)]
pub struct VerifyInviteData {
    pub email: String,
}

/// Invite verification response
#[derive(Debug, Clone, Serialize)]
pub struct VerifyInviteResponse {
    pub success: bool,
    pub message: String,
    pub data: VerifyInviteData,
}

/// Invite-link generation response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteLinkResponse {
    pub success: bool,
    pub message: String,
    pub web_invite_url: String,
    pub desktop_invite_url: String,
    pub invite_token: String,
    pub user_id: Uuid,
}

// ============================================================================
// User data responses
// ============================================================================

/// Full user-data document response
#[derive(Debug, Clone, Serialize)]
pub struct UserDataResponse {
    pub success: bool,
    pub data: UserData,
}

/// Settings update response
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub success: bool,
    pub settings: Settings,
}

/// Emotion creation response
#[derive(Debug, Clone, Serialize)]
pub struct EmotionResponse {
    pub success: bool,
    pub emotion: Emotion,
    pub emotions: Vec<Emotion>,
}

/// Emotion list response (after removal)
#[derive(Debug, Clone, Serialize)]
pub struct EmotionsResponse {
    pub success: bool,
    pub emotions: Vec<Emotion>,
}

/// Journal upsert response
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntryResponse {
    pub success: bool,
    pub entry: JournalEntry,
    pub message: String,
}

/// Goal creation response
#[derive(Debug, Clone, Serialize)]
pub struct GoalResponse {
    pub success: bool,
    pub goal: Goal,
    pub goals: Vec<Goal>,
}

/// Initiative creation response; `initiatives` holds the siblings under the
/// same goal
#[derive(Debug, Clone, Serialize)]
pub struct InitiativeResponse {
    pub success: bool,
    pub initiative: Initiative,
    pub initiatives: Vec<Initiative>,
}

/// Check-in creation response; `check_ins` holds the notes for the same
/// target entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub success: bool,
    pub check_in: CheckIn,
    pub check_ins: Vec<CheckIn>,
}

// ============================================================================
// AI responses
// ============================================================================

/// Kind of item a suggestion resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedKind {
    Goal,
    Initiative,
}

/// The goal or initiative a suggestion was linked to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RelatedKind,
    pub name: String,
}

/// One parsed suggestion line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_item: Option<RelatedItem>,
}

impl Suggestion {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            related_item: None,
        }
    }
}

/// Suggestion generation response
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub suggestions: Vec<Suggestion>,
}

/// Journal template response
#[derive(Debug, Clone, Serialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub template: String,
}

/// Entry polishing response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolishResponse {
    pub success: bool,
    pub polished_content: String,
}

/// File upload passthrough response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub filename: String,
}

// ============================================================================
// Subscription responses
// ============================================================================

/// One plan in the products listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub trial_days: u32,
}

/// Products listing response
#[derive(Debug, Clone, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub data: ProductsData,
}

/// Both configured plans
#[derive(Debug, Clone, Serialize)]
pub struct ProductsData {
    pub monthly: ProductView,
    pub yearly: ProductView,
}

/// The cached subscription fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFields {
    pub is_subscribed: bool,
    pub subscription_type: Option<SubscriptionType>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub active_price_id: Option<String>,
}

impl From<&UserData> for SubscriptionFields {
    fn from(data: &UserData) -> Self {
        Self {
            is_subscribed: data.is_subscribed,
            subscription_type: data.subscription_type,
            subscription_end: data.subscription_end,
            active_price_id: data.billing_price_id.clone(),
        }
    }
}

/// Subscription status response
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusResponse {
    pub success: bool,
    pub data: SubscriptionFields,
}

// ============================================================================
// Health
// ============================================================================

/// Liveness response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    pub environment: String,
}

impl HealthResponse {
    pub fn healthy(environment: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: "RedButton server is running".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: environment.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_without_related_item_omits_field() {
        let suggestion = Suggestion::plain("Take a break");
        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["text"], "Take a break");
        assert!(json.get("relatedItem").is_none());
    }

    #[test]
    fn test_related_item_wire_shape() {
        let suggestion = Suggestion {
            text: "Go for a walk".to_string(),
            related_item: Some(RelatedItem {
                id: "g1".to_string(),
                kind: RelatedKind::Goal,
                name: "Personal Well-being".to_string(),
            }),
        };

        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["relatedItem"]["type"], "goal");
        assert_eq!(json["relatedItem"]["id"], "g1");
    }

    #[test]
    fn test_user_view_from_user() {
        let user = User::new("a@b.com".to_string());
        let view = UserView::from(&user);
        assert_eq!(view.email, "a@b.com");
        assert_eq!(view.id, user.id);
    }

    #[test]
    fn test_subscription_fields_from_document() {
        let mut data = UserData::with_defaults();
        data.is_subscribed = true;
        data.subscription_type = Some(SubscriptionType::Yearly);
        data.billing_price_id = Some("price_y".to_string());

        let fields = SubscriptionFields::from(&data);
        assert!(fields.is_subscribed);
        assert_eq!(fields.subscription_type, Some(SubscriptionType::Yearly));
        assert_eq!(fields.active_price_id.as_deref(), Some("price_y"));
    }
}
