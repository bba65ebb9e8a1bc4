//! Billing provider REST client
//!
//! Talks to the provider's form-encoded REST API with the secret key as a
//! bearer token. Only the handful of endpoints the app orchestrates are
//! wrapped: customers, subscriptions, checkout sessions, and prices.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use redbutton_core::{
    BillingProvider, CheckoutParams, CheckoutSession, Price, ProviderError, ProviderResult,
    ProviderSubscription, SubscriptionStatus,
};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Billing provider client
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    /// Create a client against the production API
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(secret_key: impl Into<String>) -> ProviderResult<Self> {
        Self::with_base_url(secret_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (tests, mock servers)
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn with_base_url(
        secret_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed building billing client: {e}")))?;

        Ok(Self {
            http,
            secret_key: secret_key.into(),
            base_url: base_url.into(),
        })
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> ProviderResult<T> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        decode_response(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        decode_response(response).await
    }
}

async fn decode_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> ProviderResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(ProviderError::Api(format!("{status}: {detail}")));
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

// === Wire types ===

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CustomerObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListObject<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PriceObject {
    id: String,
    product: String,
}

#[derive(Debug, Deserialize)]
struct PriceRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    price: PriceRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    pub items: SubscriptionItems,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionItems {
    #[serde(default = "Vec::new")]
    data: Vec<SubscriptionItem>,
}

impl TryFrom<SubscriptionObject> for ProviderSubscription {
    type Error = ProviderError;

    fn try_from(object: SubscriptionObject) -> Result<Self, Self::Error> {
        let price_id = object
            .items
            .data
            .first()
            .map(|item| item.price.id.clone())
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "subscription {} has no line items",
                    object.id
                ))
            })?;

        let metadata_user_id = object
            .metadata
            .get("userId")
            .and_then(|s| s.parse::<Uuid>().ok());

        Ok(Self {
            id: object.id,
            customer_id: object.customer,
            status: object.status,
            price_id,
            current_period_start: object.current_period_start,
            current_period_end: object.current_period_end,
            metadata_user_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> ProviderResult<String> {
        let form = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[userId]".to_string(), user_id.to_string()),
        ];

        let customer: CustomerObject = self.post_form("/customers", &form).await?;
        Ok(customer.id)
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> ProviderResult<Vec<ProviderSubscription>> {
        let list: ListObject<SubscriptionObject> = self
            .get(
                "/subscriptions",
                &[("customer", customer_id), ("status", "all"), ("limit", "10")],
            )
            .await?;

        list.data
            .into_iter()
            .map(ProviderSubscription::try_from)
            .collect()
    }

    async fn create_checkout_session(
        &self,
        params: CheckoutParams,
    ) -> ProviderResult<CheckoutSession> {
        let form = vec![
            ("customer".to_string(), params.customer_id),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][price]".to_string(), params.price_id),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("mode".to_string(), "subscription".to_string()),
            (
                "subscription_data[trial_period_days]".to_string(),
                params.trial_days.to_string(),
            ),
            (
                "success_url".to_string(),
                format!("{}?session_id={{CHECKOUT_SESSION_ID}}", params.success_url),
            ),
            ("cancel_url".to_string(), params.cancel_url),
            ("metadata[userId]".to_string(), params.user_id.to_string()),
            (
                "subscription_data[metadata][userId]".to_string(),
                params.user_id.to_string(),
            ),
        ];

        let session: CheckoutSessionObject = self.post_form("/checkout/sessions", &form).await?;
        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    async fn list_recurring_prices(&self, product_id: &str) -> ProviderResult<Vec<Price>> {
        let list: ListObject<PriceObject> = self
            .get(
                "/prices",
                &[
                    ("product", product_id),
                    ("active", "true"),
                    ("type", "recurring"),
                    ("limit", "1"),
                ],
            )
            .await?;

        Ok(list
            .data
            .into_iter()
            .map(|p| Price {
                id: p.id,
                product_id: p.product,
            })
            .collect())
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_object_conversion() {
        let json = serde_json::json!({
            "id": "sub_123",
            "customer": "cus_456",
            "status": "trialing",
            "items": { "data": [ { "price": { "id": "price_m" } } ] },
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000,
            "metadata": { "userId": "4f5b8a50-0000-0000-0000-000000000001" }
        });

        let object: SubscriptionObject = serde_json::from_value(json).unwrap();
        let sub = ProviderSubscription::try_from(object).unwrap();

        assert_eq!(sub.id, "sub_123");
        assert_eq!(sub.customer_id, "cus_456");
        assert_eq!(sub.status, SubscriptionStatus::Trialing);
        assert_eq!(sub.price_id, "price_m");
        assert_eq!(sub.current_period_end, Some(1_702_592_000));
        assert!(sub.metadata_user_id.is_some());
    }

    #[test]
    fn test_subscription_without_items_is_invalid() {
        let json = serde_json::json!({
            "id": "sub_123",
            "customer": "cus_456",
            "status": "active",
            "items": { "data": [] }
        });

        let object: SubscriptionObject = serde_json::from_value(json).unwrap();
        let result = ProviderSubscription::try_from(object);
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_unknown_status_deserializes() {
        let json = serde_json::json!({
            "id": "sub_123",
            "customer": "cus_456",
            "status": "some_future_status",
            "items": { "data": [ { "price": { "id": "price_m" } } ] }
        });

        let object: SubscriptionObject = serde_json::from_value(json).unwrap();
        assert_eq!(object.status, SubscriptionStatus::Unknown);
        assert!(!object.status.is_entitled());
    }

    #[test]
    fn test_missing_metadata_user_id_is_none() {
        let json = serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "items": { "data": [ { "price": { "id": "price_y" } } ] },
            "metadata": { "userId": "not-a-uuid" }
        });

        let object: SubscriptionObject = serde_json::from_value(json).unwrap();
        let sub = ProviderSubscription::try_from(object).unwrap();
        assert!(sub.metadata_user_id.is_none());
    }
}
