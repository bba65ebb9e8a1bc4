//! # redbutton-providers
//!
//! Reqwest-backed implementations of the outbound collaborator traits:
//! the billing provider, the completion provider, Google OAuth, and SMTP mail.

pub mod billing;
pub mod completion;
pub mod email;
pub mod oauth;

pub use billing::{
    parse_webhook_event, resolve_catalog, verify_webhook_signature, BillingEvent,
    BillingEventKind, StripeClient, WEBHOOK_SIGNATURE_HEADER,
};
pub use completion::{OpenAiClient, OpenAiClientFactory};
pub use email::SmtpMailer;
pub use oauth::GoogleOAuthClient;
