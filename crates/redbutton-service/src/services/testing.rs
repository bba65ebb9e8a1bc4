//! In-memory fakes for service tests

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use redbutton_common::{
    AiConfig, AiLimits, AppConfig, AppSettings, AuthConfig, BillingConfig, ClientConfig,
    CorsConfig, DatabaseConfig, EmailConfig, Environment, JwtService, OAuthConfig, PerEndpoint,
    RateLimitConfig, ServerConfig, StorageConfig,
};
use redbutton_core::traits::{
    BillingProvider, CheckoutParams, CheckoutSession, CompletionFactory, CompletionProvider,
    CompletionRequest, InviteRepository, Mailer, OAuthProfile, OAuthProvider, Price,
    ProductCatalog, ProductConfig, ProviderError, ProviderResult, ProviderSubscription,
    RepoResult, TokenStream, UploadedFile, UserDataRepository, UserRepository,
};
use redbutton_core::{Invite, User, UserData};

use super::context::ServiceContext;

// ============================================================================
// Repositories
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_invited_by_token(&self, token: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| {
                u.status == redbutton_core::UserStatus::Invited
                    && u.invite_token.as_deref() == Some(token)
            })
            .cloned())
    }

    async fn create(&self, user: &User) -> RepoResult<()> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryInviteRepo {
    pub invites: Mutex<HashMap<Uuid, Invite>>,
}

#[async_trait]
impl InviteRepository for InMemoryInviteRepo {
    async fn find_pending_by_email(&self, email: &str) -> RepoResult<Option<Invite>> {
        Ok(self
            .invites
            .lock()
            .unwrap()
            .values()
            .find(|i| {
                i.email.eq_ignore_ascii_case(email)
                    && i.status == redbutton_core::InviteStatus::Pending
            })
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> RepoResult<Option<Invite>> {
        Ok(self
            .invites
            .lock()
            .unwrap()
            .values()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn create(&self, invite: &Invite) -> RepoResult<()> {
        self.invites.lock().unwrap().insert(invite.id, invite.clone());
        Ok(())
    }

    async fn update(&self, invite: &Invite) -> RepoResult<()> {
        self.invites.lock().unwrap().insert(invite.id, invite.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserDataRepo {
    pub documents: Mutex<HashMap<Uuid, UserData>>,
}

#[async_trait]
impl UserDataRepository for InMemoryUserDataRepo {
    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Option<UserData>> {
        Ok(self.documents.lock().unwrap().get(&user_id).cloned())
    }

    async fn find_by_billing_customer(
        &self,
        customer_id: &str,
    ) -> RepoResult<Option<(Uuid, UserData)>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|(_, d)| d.billing_customer_id.as_deref() == Some(customer_id))
            .map(|(id, d)| (*id, d.clone())))
    }

    async fn create_if_absent(&self, user_id: Uuid, data: &UserData) -> RepoResult<()> {
        self.documents
            .lock()
            .unwrap()
            .entry(user_id)
            .or_insert_with(|| data.clone());
        Ok(())
    }

    async fn update(&self, user_id: Uuid, data: &UserData) -> RepoResult<()> {
        self.documents.lock().unwrap().insert(user_id, data.clone());
        Ok(())
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Scripted billing fake; records created checkout sessions
#[derive(Default)]
pub struct FakeBilling {
    pub subscriptions: Mutex<Vec<ProviderSubscription>>,
    pub created_sessions: Mutex<Vec<CheckoutParams>>,
    pub created_customers: Mutex<Vec<String>>,
}

#[async_trait]
impl BillingProvider for FakeBilling {
    async fn create_customer(&self, email: &str, _user_id: Uuid) -> ProviderResult<String> {
        let id = format!("cus_{email}");
        self.created_customers.lock().unwrap().push(id.clone());
        Ok(id)
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> ProviderResult<Vec<ProviderSubscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn create_checkout_session(
        &self,
        params: CheckoutParams,
    ) -> ProviderResult<CheckoutSession> {
        self.created_sessions.lock().unwrap().push(params);
        Ok(CheckoutSession {
            id: "cs_test".to_string(),
            url: Some("https://checkout.test/cs_test".to_string()),
        })
    }

    async fn list_recurring_prices(&self, product_id: &str) -> ProviderResult<Vec<Price>> {
        Ok(vec![Price {
            id: format!("price_{product_id}"),
            product_id: product_id.to_string(),
        }])
    }
}

/// Scripted completion fake: a fixed reply, streamed in fixed chunks, or a
/// scripted failure
pub struct FakeCompletion {
    pub reply: Result<String, String>,
    pub chunks: Vec<Result<String, String>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            chunks: reply
                .split_inclusive(' ')
                .map(|s| Ok(s.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            chunks: vec![Err(message.to_string())],
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionProvider for FakeCompletion {
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<String> {
        self.requests.lock().unwrap().push(request);
        self.reply
            .clone()
            .map_err(ProviderError::Api)
    }

    async fn stream(&self, request: CompletionRequest) -> ProviderResult<TokenStream> {
        self.requests.lock().unwrap().push(request);
        let chunks = self.chunks.clone();
        Ok(stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map_err(ProviderError::Api))
                .collect::<Vec<_>>(),
        )
        .boxed())
    }

    async fn upload_file(
        &self,
        _path: &Path,
        filename: &str,
        _purpose: &str,
    ) -> ProviderResult<UploadedFile> {
        Ok(UploadedFile {
            id: "file-test".to_string(),
            filename: filename.to_string(),
        })
    }
}

pub struct FakeCompletionFactory {
    pub client: Arc<FakeCompletion>,
    pub override_keys: Mutex<Vec<Option<String>>>,
}

impl FakeCompletionFactory {
    pub fn new(client: FakeCompletion) -> Self {
        Self {
            client: Arc::new(client),
            override_keys: Mutex::new(Vec::new()),
        }
    }
}

impl CompletionFactory for FakeCompletionFactory {
    fn client(&self, api_key_override: Option<&str>) -> Arc<dyn CompletionProvider> {
        self.override_keys
            .lock()
            .unwrap()
            .push(api_key_override.map(String::from));
        self.client.clone()
    }
}

pub struct FakeOAuth {
    pub profile: Option<OAuthProfile>,
}

#[async_trait]
impl OAuthProvider for FakeOAuth {
    fn authorize_url(&self) -> String {
        "https://oauth.test/authorize".to_string()
    }

    async fn exchange_code(&self, _code: &str) -> ProviderResult<OAuthProfile> {
        self.profile
            .clone()
            .ok_or_else(|| ProviderError::Api("invalid code".to_string()))
    }

    async fn verify_id_token(&self, _id_token: &str) -> ProviderResult<OAuthProfile> {
        self.profile
            .clone()
            .ok_or_else(|| ProviderError::Api("invalid token".to_string()))
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_invite(&self, to: &str, invite_url: &str) -> ProviderResult<()> {
        if self.fail {
            return Err(ProviderError::Transport("SMTP down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), invite_url.to_string()));
        Ok(())
    }
}

// ============================================================================
// Context assembly
// ============================================================================

pub fn test_catalog() -> ProductCatalog {
    ProductCatalog {
        monthly: ProductConfig {
            product_id: "prod_m".to_string(),
            price_id: "price_m".to_string(),
            name: "RedButton Monthly".to_string(),
            description: "Monthly subscription to RedButton".to_string(),
            trial_days: 7,
        },
        yearly: ProductConfig {
            product_id: "prod_y".to_string(),
            price_id: "price_y".to_string(),
            name: "RedButton Yearly".to_string(),
            description: "Yearly subscription to RedButton".to_string(),
            trial_days: 7,
        },
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "redbutton-server".to_string(),
            env: Environment::Development,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 4000,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: "test-secret-key-that-is-long-enough".to_string(),
            token_expiry_secs: 604_800,
            admin_secret: "test-admin-secret".to_string(),
        },
        oauth: OAuthConfig {
            google_client_id: "client-id".to_string(),
            google_client_secret: "client-secret".to_string(),
            google_callback_url: "http://localhost:4000/api/auth/google/callback".to_string(),
        },
        client: ClientConfig {
            url: "http://localhost:3000".to_string(),
        },
        ai: AiConfig {
            api_key: "sk-test".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            chat_model: "gpt-4o".to_string(),
            limits: AiLimits {
                max_tokens: PerEndpoint {
                    chat: 1000,
                    suggestions: 600,
                    journal: 750,
                    polish: 1000,
                },
                temperature: PerEndpoint {
                    chat: 0.7,
                    suggestions: 0.7,
                    journal: 0.7,
                    polish: 0.4,
                },
            },
        },
        billing: BillingConfig {
            secret_key: "sk_test".to_string(),
            monthly_product_id: "prod_m".to_string(),
            yearly_product_id: "prod_y".to_string(),
            webhook_secret: "whsec_test".to_string(),
            success_url: "http://localhost:3000/subscription/success".to_string(),
            cancel_url: "http://localhost:3000/subscription/cancel".to_string(),
            enforce_entitlement: false,
        },
        email: EmailConfig {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "support@redbutton.app".to_string(),
        },
        cors: CorsConfig::default(),
        rate_limit: RateLimitConfig {
            window_ms: 900_000,
            max_requests: 100,
        },
        storage: StorageConfig {
            max_upload_mb: 10,
            download_file: "./public/RedButton-Setup.exe".to_string(),
        },
    }
}

/// Everything a service test needs, with handles to the fakes
pub struct TestHarness {
    pub ctx: ServiceContext,
    pub users: Arc<InMemoryUserRepo>,
    pub invites: Arc<InMemoryInviteRepo>,
    pub documents: Arc<InMemoryUserDataRepo>,
    pub billing: Arc<FakeBilling>,
    pub completions: Arc<FakeCompletionFactory>,
    pub mailer: Arc<FakeMailer>,
}

pub fn harness_with(completion: FakeCompletion, oauth_profile: Option<OAuthProfile>) -> TestHarness {
    let users = Arc::new(InMemoryUserRepo::default());
    let invites = Arc::new(InMemoryInviteRepo::default());
    let documents = Arc::new(InMemoryUserDataRepo::default());
    let billing = Arc::new(FakeBilling::default());
    let completions = Arc::new(FakeCompletionFactory::new(completion));
    let mailer = Arc::new(FakeMailer::default());
    let config = test_config();
    let jwt = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_secs,
    ));

    let ctx = ServiceContext::new(
        users.clone(),
        invites.clone(),
        documents.clone(),
        billing.clone(),
        completions.clone(),
        Arc::new(FakeOAuth {
            profile: oauth_profile,
        }),
        mailer.clone(),
        jwt,
        Arc::new(test_catalog()),
        Arc::new(config),
    );

    TestHarness {
        ctx,
        users,
        invites,
        documents,
        billing,
        completions,
        mailer,
    }
}

pub fn harness() -> TestHarness {
    harness_with(FakeCompletion::replying("ok"), None)
}
