//! Request and response DTOs

mod requests;
mod responses;

pub use requests::{
    AddCheckInRequest, AddEmotionRequest, AddGoalRequest, AddInitiativeRequest,
    AddJournalEntryRequest, ChatContext, ChatContextGoal, ChatContextInitiative,
    ChatHistoryMessage, ChatHistoryRole, ContextCheckIn, CreateInviteRequest,
    CreateSessionRequest, EmotionDescriptor, GenerateInviteLinkRequest, InitiativeChatRequest,
    JournalTemplateRequest, LoginRequest, OAuthLoginRequest, OnboardingChatRequest,
    PolishEntryRequest, RegisterRequest, SuggestionsRequest, UpdateSettingsRequest,
    VerifyInviteRequest,
};
pub use responses::{
    AuthResponse, CheckInResponse, EmotionResponse, EmotionsResponse, GoalResponse,
    HealthResponse, InitiativeResponse, InviteLinkResponse, JournalEntryResponse, MessageResponse,
    PolishResponse, ProductView, ProductsData, ProductsResponse, RelatedItem, RelatedKind,
    SettingsResponse, SubscriptionFields, SubscriptionStatusResponse, Suggestion,
    SuggestionsResponse, TemplateResponse, UploadResponse, UserDataResponse, UserView,
    VerifyInviteData, VerifyInviteResponse,
};
