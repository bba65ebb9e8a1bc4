//! # redbutton-service
//!
//! Application layer containing business logic, services, and DTOs.

pub mod dto;
pub mod services;

pub use dto::{
    AddCheckInRequest, AddEmotionRequest, AddGoalRequest, AddInitiativeRequest,
    AddJournalEntryRequest, AuthResponse, ChatContext, ChatHistoryMessage, CheckInResponse,
    CreateInviteRequest, CreateSessionRequest, EmotionDescriptor, EmotionResponse,
    EmotionsResponse, GenerateInviteLinkRequest, GoalResponse, HealthResponse,
    InitiativeChatRequest, InitiativeResponse, InviteLinkResponse, JournalEntryResponse,
    JournalTemplateRequest, LoginRequest, MessageResponse, OAuthLoginRequest,
    OnboardingChatRequest, PolishEntryRequest, PolishResponse, ProductView, ProductsResponse,
    RegisterRequest, RelatedItem, RelatedKind, SettingsResponse, SubscriptionFields,
    SubscriptionStatusResponse, Suggestion, SuggestionsRequest, SuggestionsResponse,
    TemplateResponse, UpdateSettingsRequest, UploadResponse, UserDataResponse, UserView,
    VerifyInviteRequest, VerifyInviteResponse,
};
pub use services::{
    reconcile_subscription, AiService, AuthService, ChatService, ChatStreamEvent, CheckoutOutcome,
    EndpointKind, Extractable, InviteOutcome, InviteService, OnboardingStreamEvent,
    RestoreOutcome, ServiceContext, ServiceError, ServiceResult, SubscriptionService,
    UserDataService,
};
