//! Traits (ports) for data access and external collaborators

mod providers;
mod repositories;

pub use providers::{
    BillingProvider, CheckoutParams, CheckoutSession, ChatMessage, ChatRole, CompletionFactory,
    CompletionProvider, CompletionRequest, Mailer, OAuthProfile, OAuthProvider, Price,
    ProductCatalog, ProductConfig, ProviderError, ProviderResult, ProviderSubscription,
    SubscriptionStatus, TokenStream, UploadedFile,
};
pub use repositories::{InviteRepository, RepoResult, UserDataRepository, UserRepository};
