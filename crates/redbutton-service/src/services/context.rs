//! Service context - dependency container for services
//!
//! Holds the repositories, collaborator clients, and shared configuration
//! every service needs.

use std::sync::Arc;

use redbutton_common::{AppConfig, JwtService};
use redbutton_core::traits::{
    BillingProvider, CompletionFactory, CompletionProvider, InviteRepository, Mailer,
    OAuthProvider, ProductCatalog, UserDataRepository, UserRepository,
};

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Database repositories
/// - The billing, completion, OAuth, and mail collaborators
/// - JWT service for session tokens
/// - The billing product catalog resolved at startup
/// - Application configuration
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    invite_repo: Arc<dyn InviteRepository>,
    user_data_repo: Arc<dyn UserDataRepository>,

    // External collaborators
    billing: Arc<dyn BillingProvider>,
    completions: Arc<dyn CompletionFactory>,
    oauth: Arc<dyn OAuthProvider>,
    mailer: Arc<dyn Mailer>,

    // Services
    jwt_service: Arc<JwtService>,

    // Startup-resolved billing catalog
    catalog: Arc<ProductCatalog>,

    // Configuration
    config: Arc<AppConfig>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        invite_repo: Arc<dyn InviteRepository>,
        user_data_repo: Arc<dyn UserDataRepository>,
        billing: Arc<dyn BillingProvider>,
        completions: Arc<dyn CompletionFactory>,
        oauth: Arc<dyn OAuthProvider>,
        mailer: Arc<dyn Mailer>,
        jwt_service: Arc<JwtService>,
        catalog: Arc<ProductCatalog>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            user_repo,
            invite_repo,
            user_data_repo,
            billing,
            completions,
            oauth,
            mailer,
            jwt_service,
            catalog,
            config,
        }
    }

    // === Repositories ===

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get the invite repository
    pub fn invite_repo(&self) -> &dyn InviteRepository {
        self.invite_repo.as_ref()
    }

    /// Get the user-data repository
    pub fn user_data_repo(&self) -> &dyn UserDataRepository {
        self.user_data_repo.as_ref()
    }

    // === External collaborators ===

    /// Get the billing provider
    pub fn billing(&self) -> &dyn BillingProvider {
        self.billing.as_ref()
    }

    /// Get a completion client, honoring a caller-supplied API key.
    ///
    /// The override flows through explicitly; no shared client is mutated.
    pub fn completion_client(&self, api_key_override: Option<&str>) -> Arc<dyn CompletionProvider> {
        self.completions.client(api_key_override)
    }

    /// Get the OAuth provider
    pub fn oauth(&self) -> &dyn OAuthProvider {
        self.oauth.as_ref()
    }

    /// Get the mailer
    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    // === Services ===

    /// Get the JWT service
    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Get the billing product catalog
    pub fn catalog(&self) -> &ProductCatalog {
        self.catalog.as_ref()
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("collaborators", &"...")
            .field("catalog", &self.catalog)
            .finish()
    }
}
