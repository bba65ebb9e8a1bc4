//! Configuration loading

mod app_config;

pub use app_config::{
    AiConfig, AiLimits, AppConfig, AppSettings, AuthConfig, BillingConfig, ClientConfig,
    ConfigError, CorsConfig, DatabaseConfig, EmailConfig, Environment, OAuthConfig, PerEndpoint,
    RateLimitConfig, ServerConfig, StorageConfig,
};
