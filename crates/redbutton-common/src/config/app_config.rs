//! Application configuration structs
//!
//! Loads configuration from environment variables and a .env file.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub oauth: OAuthConfig,
    pub client: ClientConfig,
    pub ai: AiConfig,
    pub billing: BillingConfig,
    pub email: EmailConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Session-token configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    pub token_expiry_secs: i64,
    /// Shared secret guarding the no-session admin invite-link endpoint
    pub admin_secret: String,
}

/// Google OAuth configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_callback_url: String,
}

/// Web client configuration (redirect targets, invite links)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
}

/// Per-endpoint-kind values (chat / suggestions / journal / polish)
#[derive(Debug, Clone, Copy)]
pub struct PerEndpoint<T> {
    pub chat: T,
    pub suggestions: T,
    pub journal: T,
    pub polish: T,
}

/// Completion-request limits
#[derive(Debug, Clone, Copy)]
pub struct AiLimits {
    pub max_tokens: PerEndpoint<u32>,
    pub temperature: PerEndpoint<f32>,
}

/// Completion-provider configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub default_model: String,
    pub chat_model: String,
    pub limits: AiLimits,
}

/// Billing-provider configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub secret_key: String,
    pub monthly_product_id: String,
    pub yearly_product_id: String,
    pub webhook_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    /// When false (the shipped default) the entitlement gate lets every
    /// request through; the fallback branch stays reachable for when the
    /// paywall is turned on.
    pub enforce_entitlement: bool,
}

/// SMTP configuration for invite mail
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// CORS configuration
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Global windowed rate limit
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

/// Upload cap and static download file
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub max_upload_mb: u32,
    pub download_file: String,
}

// Default value functions
fn default_app_name() -> String {
    "redbutton-server".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_token_expiry() -> i64 {
    604_800 // 7 days
}

fn default_default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_email_from() -> String {
    "support@redbutton.app".to_string()
}

fn default_rate_limit_window_ms() -> u64 {
    900_000 // 15 minutes
}

fn default_rate_limit_max() -> u32 {
    100
}

fn default_max_upload_mb() -> u32 {
    10
}

fn default_download_file() -> String {
    "./public/RedButton-Setup.exe".to_string()
}

fn var_or(key: &str, fallback: impl Fn() -> String) -> String {
    env::var(key).unwrap_or_else(|_| fallback())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key))
}

fn parsed_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: var_or("APP_NAME", default_app_name),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                host: var_or("HOST", default_host),
                port: parsed_or("PORT", default_port()),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", default_max_connections()),
                min_connections: parsed_or("DATABASE_MIN_CONNECTIONS", default_min_connections()),
            },
            auth: AuthConfig {
                jwt_secret: required("JWT_SECRET")?,
                token_expiry_secs: parsed_or("JWT_EXPIRES_IN_SECS", default_token_expiry()),
                admin_secret: required("ADMIN_SECRET_KEY")?,
            },
            oauth: OAuthConfig {
                google_client_id: required("GOOGLE_CLIENT_ID")?,
                google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
                google_callback_url: required("GOOGLE_CALLBACK_URL")?,
            },
            client: ClientConfig {
                url: var_or("CLIENT_URL", || "http://localhost:3000".to_string()),
            },
            ai: AiConfig {
                api_key: required("OPENAI_API_KEY")?,
                default_model: var_or("OPENAI_DEFAULT_MODEL", default_default_model),
                chat_model: var_or("OPENAI_CHAT_MODEL", default_chat_model),
                limits: AiLimits {
                    max_tokens: PerEndpoint {
                        chat: parsed_or("MAX_TOKENS_CHAT", 1000),
                        suggestions: parsed_or("MAX_TOKENS_SUGGESTIONS", 600),
                        journal: parsed_or("MAX_TOKENS_JOURNAL", 750),
                        polish: parsed_or("MAX_TOKENS_POLISH", 1000),
                    },
                    temperature: PerEndpoint {
                        chat: parsed_or("TEMPERATURE_CHAT", 0.7),
                        suggestions: parsed_or("TEMPERATURE_SUGGESTIONS", 0.7),
                        journal: parsed_or("TEMPERATURE_JOURNAL", 0.7),
                        polish: parsed_or("TEMPERATURE_POLISH", 0.4),
                    },
                },
            },
            billing: BillingConfig {
                secret_key: required("STRIPE_SECRET_KEY")?,
                monthly_product_id: required("STRIPE_MONTHLY_PRODUCT_ID")?,
                yearly_product_id: required("STRIPE_YEARLY_PRODUCT_ID")?,
                webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
                success_url: var_or("STRIPE_SUCCESS_URL", || {
                    "http://localhost:3000/subscription/success".to_string()
                }),
                cancel_url: var_or("STRIPE_CANCEL_URL", || {
                    "http://localhost:3000/subscription/cancel".to_string()
                }),
                enforce_entitlement: parsed_or("SUBSCRIPTION_GATE_ENFORCED", false),
            },
            email: EmailConfig {
                host: var_or("EMAIL_HOST", String::new),
                port: parsed_or("EMAIL_PORT", 587),
                username: var_or("EMAIL_USER", String::new),
                password: var_or("EMAIL_PASSWORD", String::new),
                from: var_or("EMAIL_FROM", default_email_from),
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ORIGIN")
                    .ok()
                    .map(|s| s.split(',').map(str::trim).map(String::from).collect())
                    .unwrap_or_default(),
            },
            rate_limit: RateLimitConfig {
                window_ms: parsed_or("RATE_LIMIT_WINDOW_MS", default_rate_limit_window_ms()),
                max_requests: parsed_or("RATE_LIMIT_MAX", default_rate_limit_max()),
            },
            storage: StorageConfig {
                max_upload_mb: parsed_or("MAX_FILE_SIZE_MB", default_max_upload_mb()),
                download_file: var_or("DOWNLOAD_FILE", default_download_file),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_environment_is_development() {
        assert!(Environment::Development.is_development());
        assert!(!Environment::Production.is_development());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 4000,
        };
        assert_eq!(config.address(), "0.0.0.0:4000");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_app_name(), "redbutton-server");
        assert_eq!(default_port(), 4000);
        assert_eq!(default_token_expiry(), 604_800);
        assert_eq!(default_rate_limit_window_ms(), 900_000);
        assert_eq!(default_rate_limit_max(), 100);
        assert_eq!(default_max_upload_mb(), 10);
    }
}
