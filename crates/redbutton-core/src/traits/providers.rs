//! Collaborator traits (ports) for the external services the app orchestrates:
//! the billing provider, the completion provider, OAuth verification, and mail.
//!
//! Like the repository traits, these let the application layer stay free of
//! HTTP-client details and let tests substitute in-memory fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors from an external collaborator
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider returned an error response
    #[error("Provider API error: {0}")]
    Api(String),

    /// The request never completed (network, timeout)
    #[error("Provider transport error: {0}")]
    Transport(String),

    /// The provider responded with something we could not interpret
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Result type for collaborator operations
pub type ProviderResult<T> = Result<T, ProviderError>;

// ============================================================================
// Billing provider
// ============================================================================

/// Provider-side subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    Canceled,
    Incomplete,
    IncompleteExpired,
    PastDue,
    Paused,
    Unpaid,
    /// Any status this build does not know about; never entitled
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// The two statuses that count as entitled
    #[inline]
    pub fn is_entitled(self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

/// A subscription object as reported by the billing provider.
///
/// This is the single source of truth the local subscription fields are
/// reconciled from, regardless of which entry point observed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    /// Price id of the first line item
    pub price_id: String,
    /// Unix seconds; absent on degraded provider data
    pub current_period_start: Option<i64>,
    /// Unix seconds; absent on degraded provider data
    pub current_period_end: Option<i64>,
    /// Owning user id carried in subscription metadata
    pub metadata_user_id: Option<Uuid>,
}

/// A recurring price attached to a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub id: String,
    pub product_id: String,
}

/// Parameters for creating a hosted checkout session
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    pub customer_id: String,
    pub price_id: String,
    pub trial_days: u32,
    pub success_url: String,
    pub cancel_url: String,
    pub user_id: Uuid,
}

/// A created checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a billing customer for a user, tagging it with the user id
    async fn create_customer(&self, email: &str, user_id: Uuid) -> ProviderResult<String>;

    /// List a customer's subscriptions (any status)
    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> ProviderResult<Vec<ProviderSubscription>>;

    /// Create a hosted checkout session
    async fn create_checkout_session(
        &self,
        params: CheckoutParams,
    ) -> ProviderResult<CheckoutSession>;

    /// List active recurring prices for a product
    async fn list_recurring_prices(&self, product_id: &str) -> ProviderResult<Vec<Price>>;
}

/// One configured subscription plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductConfig {
    pub product_id: String,
    pub price_id: String,
    pub name: String,
    pub description: String,
    pub trial_days: u32,
}

/// Both plans, with price ids resolved from the provider at startup.
/// The process must fail fast if resolution is impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCatalog {
    pub monthly: ProductConfig,
    pub yearly: ProductConfig,
}

impl ProductCatalog {
    /// Whether a product id matches one of the configured plans
    pub fn knows_product(&self, product_id: &str) -> bool {
        product_id == self.monthly.product_id || product_id == self.yearly.product_id
    }
}

// ============================================================================
// Completion provider
// ============================================================================

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// In-order stream of content increments from the provider
pub type TokenStream = BoxStream<'static, ProviderResult<String>>;

/// A file accepted by the provider's file-storage endpoint
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: String,
    pub filename: String,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a full completion and return the message content
    /// (empty string when the model returned no content)
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<String>;

    /// Request a streaming completion; increments arrive in source order
    async fn stream(&self, request: CompletionRequest) -> ProviderResult<TokenStream>;

    /// Upload a local file to the provider's file storage
    async fn upload_file(
        &self,
        path: &std::path::Path,
        filename: &str,
        purpose: &str,
    ) -> ProviderResult<UploadedFile>;
}

/// Factory producing completion clients.
///
/// A caller-supplied API key yields a dedicated client rather than mutating
/// any shared one, so concurrent requests with different keys cannot
/// interfere.
pub trait CompletionFactory: Send + Sync {
    fn client(&self, api_key_override: Option<&str>) -> Arc<dyn CompletionProvider>;
}

// ============================================================================
// OAuth provider
// ============================================================================

/// Profile extracted from a verified provider token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    /// Provider-side subject id
    pub subject: String,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// The consent-screen URL to redirect a browser to
    fn authorize_url(&self) -> String;

    /// Exchange an authorization code for a verified profile
    async fn exchange_code(&self, code: &str) -> ProviderResult<OAuthProfile>;

    /// Verify an id token presented by a client and extract the profile
    async fn verify_id_token(&self, id_token: &str) -> ProviderResult<OAuthProfile>;
}

// ============================================================================
// Mailer
// ============================================================================

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an invitation email with an accept link
    async fn send_invite(&self, to: &str, invite_url: &str) -> ProviderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entitled_statuses() {
        assert!(SubscriptionStatus::Active.is_entitled());
        assert!(SubscriptionStatus::Trialing.is_entitled());
        assert!(!SubscriptionStatus::Canceled.is_entitled());
        assert!(!SubscriptionStatus::PastDue.is_entitled());
    }

    #[test]
    fn test_status_wire_format() {
        let status: SubscriptionStatus = serde_json::from_str("\"trialing\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Trialing);

        let status: SubscriptionStatus = serde_json::from_str("\"incomplete_expired\"").unwrap();
        assert_eq!(status, SubscriptionStatus::IncompleteExpired);
    }

    #[test]
    fn test_catalog_knows_product() {
        let catalog = ProductCatalog {
            monthly: ProductConfig {
                product_id: "prod_m".to_string(),
                price_id: "price_m".to_string(),
                name: "Monthly".to_string(),
                description: String::new(),
                trial_days: 7,
            },
            yearly: ProductConfig {
                product_id: "prod_y".to_string(),
                price_id: "price_y".to_string(),
                name: "Yearly".to_string(),
                description: String::new(),
                trial_days: 7,
            },
        };

        assert!(catalog.knows_product("prod_m"));
        assert!(catalog.knows_product("prod_y"));
        assert!(!catalog.knows_product("prod_x"));
    }
}
