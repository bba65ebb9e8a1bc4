//! OAuth providers

mod google;

pub use google::GoogleOAuthClient;
