//! # redbutton-core
//!
//! Domain layer containing entities, domain errors, repository traits, and
//! traits for the external collaborators (billing, completions, OAuth, mail).
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{
    default_emotions, default_goals, default_settings, new_record_id, ActionItem, CheckIn,
    Emotion, EmotionRecord, EntityKind, Goal, Initiative, Invite, InviteStatus, JournalEntry,
    Settings, SubscriptionType, Theme, User, UserData, UserRole, UserStatus, INVITE_EXPIRY_DAYS,
};
pub use error::DomainError;
pub use traits::{
    BillingProvider, CheckoutParams, CheckoutSession, ChatMessage, ChatRole, CompletionFactory,
    CompletionProvider, CompletionRequest, InviteRepository, Mailer, OAuthProfile, OAuthProvider,
    Price, ProductCatalog, ProductConfig, ProviderError, ProviderResult, ProviderSubscription,
    RepoResult, SubscriptionStatus, TokenStream, UploadedFile, UserDataRepository, UserRepository,
};
