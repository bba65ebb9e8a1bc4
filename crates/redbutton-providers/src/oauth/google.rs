//! Google OAuth: consent URL, authorization-code exchange, and id-token
//! verification
//!
//! Id tokens are verified server-side through Google's tokeninfo endpoint,
//! which validates the signature and expiry for us; we still check that the
//! audience matches our client id before trusting the claims.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use redbutton_common::OAuthConfig;
use redbutton_core::{OAuthProfile, OAuthProvider, ProviderError, ProviderResult};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Google OAuth client
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    token_url: String,
    tokeninfo_url: String,
}

impl GoogleOAuthClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &OAuthConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed building OAuth client: {e}")))?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            callback_url: config.google_callback_url.clone(),
            token_url: TOKEN_URL.to_string(),
            tokeninfo_url: TOKENINFO_URL.to_string(),
        })
    }

    /// Point the token endpoints at a custom base (tests)
    #[doc(hidden)]
    pub fn with_endpoints(mut self, token_url: String, tokeninfo_url: String) -> Self {
        self.token_url = token_url;
        self.tokeninfo_url = tokeninfo_url;
        self
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfoClaims {
    aud: String,
    sub: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorize_url(&self) -> String {
        format!(
            "{AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=online",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode("openid email profile"),
        )
    }

    async fn exchange_code(&self, code: &str) -> ProviderResult<OAuthProfile> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", &self.callback_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "code exchange failed: {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        self.verify_id_token(&token.id_token).await
    }

    async fn verify_id_token(&self, id_token: &str) -> ProviderResult<OAuthProfile> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(format!("invalid id token: {status}")));
        }

        let claims: TokenInfoClaims = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if claims.aud != self.client_id {
            return Err(ProviderError::Api(format!(
                "id token audience mismatch: {}",
                claims.aud
            )));
        }

        if claims.email_verified.as_deref() != Some("true") {
            return Err(ProviderError::Api("email not verified".to_string()));
        }

        let email = claims
            .email
            .ok_or_else(|| ProviderError::InvalidResponse("missing email claim".to_string()))?;

        Ok(OAuthProfile {
            email,
            name: claims.name,
            picture: claims.picture,
            subject: claims.sub,
        })
    }
}

impl std::fmt::Debug for GoogleOAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthClient")
            .field("client_id", &self.client_id)
            .field("callback_url", &self.callback_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(&OAuthConfig {
            google_client_id: "client-123.apps.googleusercontent.com".to_string(),
            google_client_secret: "secret".to_string(),
            google_callback_url: "http://localhost:4000/api/auth/google/callback".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_authorize_url_carries_params() {
        let url = test_client().authorize_url();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains(&urlencoding::encode(
            "http://localhost:4000/api/auth/google/callback"
        ).into_owned()));
    }
}
