//! # redbutton-common
//!
//! Shared utilities including configuration, error handling, authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{hash_password, verify_password, Claims, JwtService};
pub use config::{
    AiConfig, AiLimits, AppConfig, AppSettings, AuthConfig, BillingConfig, ClientConfig,
    ConfigError, CorsConfig, DatabaseConfig, EmailConfig, Environment, OAuthConfig,
    PerEndpoint, RateLimitConfig, ServerConfig, StorageConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
