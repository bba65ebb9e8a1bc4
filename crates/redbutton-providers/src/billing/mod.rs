//! Billing provider client, webhook verification, and catalog resolution

mod catalog;
mod client;
mod webhook;

pub use catalog::resolve_catalog;
pub use client::StripeClient;
pub use webhook::{
    parse_webhook_event, verify_webhook_signature, BillingEvent, BillingEventKind,
    WEBHOOK_SIGNATURE_HEADER,
};
