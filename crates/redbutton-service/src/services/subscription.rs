//! Subscription service
//!
//! Three entry points observe the billing provider's subscription state:
//! checkout-session creation, webhook delivery, and manual restore. All of
//! them funnel through one reconciliation routine so the cached fields
//! converge to the same values no matter which path saw the provider
//! object first.

use chrono::{DateTime, Utc};
use redbutton_common::AppError;
use redbutton_core::{
    CheckoutParams, ProductCatalog, ProviderSubscription, SubscriptionType, User, UserData,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{ProductView, ProductsData, ProductsResponse, SubscriptionFields};

use redbutton_providers::{
    parse_webhook_event, verify_webhook_signature, BillingEvent, BillingEventKind,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

const DAY_SECS: i64 = 24 * 60 * 60;
const MONTHLY_FALLBACK_SECS: i64 = 30 * DAY_SECS;
const YEARLY_FALLBACK_SECS: i64 = 365 * DAY_SECS;

/// Write the provider's subscription state into the cached document fields.
///
/// Idempotent: applying the same provider object any number of times, from
/// any entry point, produces identical fields.
pub fn reconcile_subscription(
    data: &mut UserData,
    subscription: &ProviderSubscription,
    catalog: &ProductCatalog,
) {
    data.is_subscribed = subscription.status.is_entitled();

    let subscription_type = if subscription.price_id == catalog.monthly.price_id {
        SubscriptionType::Monthly
    } else {
        SubscriptionType::Yearly
    };
    data.subscription_type = Some(subscription_type);

    let period_end = subscription.current_period_end.or_else(|| {
        // Degraded provider data: derive the end from the start plus the
        // plan interval when possible
        let interval = match subscription_type {
            SubscriptionType::Monthly => MONTHLY_FALLBACK_SECS,
            SubscriptionType::Yearly => YEARLY_FALLBACK_SECS,
        };
        subscription.current_period_start.map(|start| start + interval)
    });

    if period_end.is_none() {
        warn!(
            subscription_id = %subscription.id,
            "No valid current_period_end or fallback for subscription"
        );
    }

    data.subscription_end = period_end.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    data.billing_subscription_id = Some(subscription.id.clone());
    data.billing_price_id = Some(subscription.price_id.clone());
    if data.billing_customer_id.is_none() {
        data.billing_customer_id = Some(subscription.customer_id.clone());
    }
}

/// Result of a checkout-session request
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// A new hosted session was created
    SessionCreated { session_id: String, url: Option<String> },
    /// The customer already holds an entitled subscription; state was
    /// reconciled instead of creating a duplicate session
    AlreadySubscribed { subscription_id: String, status: String },
}

/// Result of a manual restore
#[derive(Debug, Clone)]
pub enum RestoreOutcome {
    Restored(SubscriptionFields),
    NothingToRestore,
}

/// Subscription service
pub struct SubscriptionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SubscriptionService<'a> {
    /// Create a new SubscriptionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The configured plans
    pub fn products(&self) -> ProductsResponse {
        let catalog = self.ctx.catalog();
        ProductsResponse {
            success: true,
            data: ProductsData {
                monthly: ProductView {
                    id: catalog.monthly.product_id.clone(),
                    name: catalog.monthly.name.clone(),
                    description: catalog.monthly.description.clone(),
                    trial_days: catalog.monthly.trial_days,
                },
                yearly: ProductView {
                    id: catalog.yearly.product_id.clone(),
                    name: catalog.yearly.name.clone(),
                    description: catalog.yearly.description.clone(),
                    trial_days: catalog.yearly.trial_days,
                },
            },
        }
    }

    /// The cached subscription fields for a user
    #[instrument(skip(self))]
    pub async fn status(&self, user_id: Uuid) -> ServiceResult<SubscriptionFields> {
        let data = self
            .ctx
            .user_data_repo()
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User data", user_id.to_string()))?;

        Ok(SubscriptionFields::from(&data))
    }

    /// Create a checkout session, short-circuiting when the customer is
    /// already entitled
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_session(
        &self,
        user: &User,
        product_id: &str,
    ) -> ServiceResult<CheckoutOutcome> {
        let catalog = self.ctx.catalog();
        if !catalog.knows_product(product_id) {
            return Err(ServiceError::validation("Invalid product ID"));
        }

        let mut data = self
            .ctx
            .user_data_repo()
            .find_by_user(user.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User data", user.id.to_string()))?;

        let customer_id = match data.billing_customer_id.clone() {
            Some(id) => id,
            None => {
                let id = self.ctx.billing().create_customer(&user.email, user.id).await?;
                data.billing_customer_id = Some(id.clone());
                self.ctx.user_data_repo().update(user.id, &data).await?;
                id
            }
        };

        // An already-entitled customer gets reconciled state back instead
        // of a duplicate session
        let subscriptions = self.ctx.billing().list_subscriptions(&customer_id).await?;
        if let Some(active) = subscriptions.iter().find(|s| s.status.is_entitled()) {
            reconcile_subscription(&mut data, active, catalog);
            self.ctx.user_data_repo().update(user.id, &data).await?;

            info!(subscription_id = %active.id, "Checkout skipped: already subscribed");

            return Ok(CheckoutOutcome::AlreadySubscribed {
                subscription_id: active.id.clone(),
                status: format!("{:?}", active.status).to_lowercase(),
            });
        }

        let plan = if product_id == catalog.monthly.product_id {
            &catalog.monthly
        } else {
            &catalog.yearly
        };

        let billing_config = &self.ctx.config().billing;
        let session = self
            .ctx
            .billing()
            .create_checkout_session(CheckoutParams {
                customer_id,
                price_id: plan.price_id.clone(),
                trial_days: plan.trial_days,
                success_url: billing_config.success_url.clone(),
                cancel_url: billing_config.cancel_url.clone(),
                user_id: user.id,
            })
            .await?;

        info!(session_id = %session.id, "Checkout session created");

        Ok(CheckoutOutcome::SessionCreated {
            session_id: session.id,
            url: session.url,
        })
    }

    /// Handle a webhook delivery: verify the signature over the raw body,
    /// then apply the event.
    ///
    /// Every failure surfaces as `WebhookRejected` (a 400) so the provider's
    /// retry machinery is never driven by our own 5xx responses.
    #[instrument(skip(self, payload, signature_header))]
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> ServiceResult<()> {
        let signature = signature_header.ok_or_else(|| {
            ServiceError::App(AppError::WebhookRejected("No signature found".to_string()))
        })?;

        verify_webhook_signature(payload, signature, &self.ctx.config().billing.webhook_secret)
            .map_err(|e| {
                warn!(error = %e, "Webhook signature rejected");
                ServiceError::App(AppError::WebhookRejected("Invalid signature".to_string()))
            })?;

        let event = parse_webhook_event(payload).map_err(|e| {
            warn!(error = %e, "Webhook payload rejected");
            ServiceError::App(AppError::WebhookRejected("Malformed event".to_string()))
        })?;

        self.apply_event(event).await
    }

    async fn apply_event(&self, event: BillingEvent) -> ServiceResult<()> {
        let subscription = match (&event.kind, event.subscription) {
            (BillingEventKind::Other(event_type), _) => {
                info!(event_id = %event.id, event_type = %event_type, "Webhook event ignored");
                return Ok(());
            }
            (_, Some(subscription)) => subscription,
            (_, None) => {
                return Err(ServiceError::App(AppError::WebhookRejected(
                    "Event carries no subscription".to_string(),
                )));
            }
        };

        let (user_id, mut data) = self.resolve_owner(&subscription).await?;

        match event.kind {
            BillingEventKind::SubscriptionDeleted => {
                data.reset_subscription_fields();
                info!(user_id = %user_id, "Subscription deleted; fields reset");
            }
            _ => {
                reconcile_subscription(&mut data, &subscription, self.ctx.catalog());
                info!(
                    user_id = %user_id,
                    subscription_id = %subscription.id,
                    is_subscribed = data.is_subscribed,
                    "Subscription reconciled from webhook"
                );
            }
        }

        self.ctx.user_data_repo().update(user_id, &data).await?;
        Ok(())
    }

    /// Resolve the owning user: metadata userId first, billing customer id
    /// as the fallback
    async fn resolve_owner(
        &self,
        subscription: &ProviderSubscription,
    ) -> ServiceResult<(Uuid, UserData)> {
        if let Some(user_id) = subscription.metadata_user_id {
            if let Some(data) = self.ctx.user_data_repo().find_by_user(user_id).await? {
                return Ok((user_id, data));
            }
        }

        if let Some(found) = self
            .ctx
            .user_data_repo()
            .find_by_billing_customer(&subscription.customer_id)
            .await?
        {
            return Ok(found);
        }

        warn!(
            subscription_id = %subscription.id,
            customer_id = %subscription.customer_id,
            "Webhook could not resolve the owning user"
        );
        Err(ServiceError::App(AppError::WebhookRejected(
            "No user found for subscription".to_string(),
        )))
    }

    /// Re-query the provider and reconcile, or clear the fields when no
    /// entitled subscription exists
    #[instrument(skip(self))]
    pub async fn restore(&self, user_id: Uuid) -> ServiceResult<RestoreOutcome> {
        let mut data = self
            .ctx
            .user_data_repo()
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User data", user_id.to_string()))?;

        let customer_id = data
            .billing_customer_id
            .clone()
            .ok_or_else(|| ServiceError::not_found("Billing customer", user_id.to_string()))?;

        let subscriptions = self.ctx.billing().list_subscriptions(&customer_id).await?;

        if let Some(active) = subscriptions.iter().find(|s| s.status.is_entitled()) {
            reconcile_subscription(&mut data, active, self.ctx.catalog());
            self.ctx.user_data_repo().update(user_id, &data).await?;

            info!(subscription_id = %active.id, "Subscription restored");

            Ok(RestoreOutcome::Restored(SubscriptionFields::from(&data)))
        } else {
            data.reset_subscription_fields();
            self.ctx.user_data_repo().update(user_id, &data).await?;

            info!(user_id = %user_id, "No active subscription found to restore");

            Ok(RestoreOutcome::NothingToRestore)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{harness, test_catalog};
    use hmac::{Hmac, Mac};
    use redbutton_core::SubscriptionStatus;
    use sha2::Sha256;

    fn provider_subscription(status: SubscriptionStatus) -> ProviderSubscription {
        ProviderSubscription {
            id: "sub_1".to_string(),
            customer_id: "cus_1".to_string(),
            status,
            price_id: "price_m".to_string(),
            current_period_start: Some(1_700_000_000),
            current_period_end: Some(1_702_592_000),
            metadata_user_id: None,
        }
    }

    #[test]
    fn test_reconcile_trialing_is_subscribed() {
        let mut data = UserData::with_defaults();
        reconcile_subscription(
            &mut data,
            &provider_subscription(SubscriptionStatus::Trialing),
            &test_catalog(),
        );

        assert!(data.is_subscribed);
        assert_eq!(data.subscription_type, Some(SubscriptionType::Monthly));
        assert_eq!(
            data.subscription_end,
            DateTime::<Utc>::from_timestamp(1_702_592_000, 0)
        );
        assert_eq!(data.billing_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(data.billing_customer_id.as_deref(), Some("cus_1"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let subscription = provider_subscription(SubscriptionStatus::Active);
        let catalog = test_catalog();

        let mut first = UserData::with_defaults();
        reconcile_subscription(&mut first, &subscription, &catalog);

        let mut second = first.clone();
        reconcile_subscription(&mut second, &subscription, &catalog);
        reconcile_subscription(&mut second, &subscription, &catalog);

        assert_eq!(first.is_subscribed, second.is_subscribed);
        assert_eq!(first.subscription_type, second.subscription_type);
        assert_eq!(first.subscription_end, second.subscription_end);
        assert_eq!(first.billing_subscription_id, second.billing_subscription_id);
        assert_eq!(first.billing_price_id, second.billing_price_id);
    }

    #[test]
    fn test_reconcile_period_end_fallback_monthly() {
        let mut subscription = provider_subscription(SubscriptionStatus::Active);
        subscription.current_period_end = None;

        let mut data = UserData::with_defaults();
        reconcile_subscription(&mut data, &subscription, &test_catalog());

        let expected = 1_700_000_000 + 30 * 24 * 60 * 60;
        assert_eq!(
            data.subscription_end,
            DateTime::<Utc>::from_timestamp(expected, 0)
        );
    }

    #[test]
    fn test_reconcile_period_end_fallback_yearly() {
        let mut subscription = provider_subscription(SubscriptionStatus::Active);
        subscription.price_id = "price_y".to_string();
        subscription.current_period_end = None;

        let mut data = UserData::with_defaults();
        reconcile_subscription(&mut data, &subscription, &test_catalog());

        let expected = 1_700_000_000 + 365 * 24 * 60 * 60;
        assert_eq!(data.subscription_type, Some(SubscriptionType::Yearly));
        assert_eq!(
            data.subscription_end,
            DateTime::<Utc>::from_timestamp(expected, 0)
        );
    }

    #[test]
    fn test_reconcile_degraded_data_leaves_end_null() {
        let mut subscription = provider_subscription(SubscriptionStatus::Active);
        subscription.current_period_end = None;
        subscription.current_period_start = None;

        let mut data = UserData::with_defaults();
        reconcile_subscription(&mut data, &subscription, &test_catalog());

        assert!(data.is_subscribed);
        assert!(data.subscription_end.is_none());
    }

    #[test]
    fn test_reconcile_canceled_clears_entitlement_only() {
        let mut data = UserData::with_defaults();
        reconcile_subscription(
            &mut data,
            &provider_subscription(SubscriptionStatus::Canceled),
            &test_catalog(),
        );

        assert!(!data.is_subscribed);
        // The historical fields remain until a deletion event resets them
        assert!(data.billing_subscription_id.is_some());
    }

    fn sign_payload(payload: &[u8], secret: &str) -> String {
        let timestamp = Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!(
            "t={timestamp},v1={}",
            hex::encode(mac.finalize().into_bytes())
        )
    }

    fn subscription_event_payload(event_type: &str, user_id: Uuid, status: &str) -> Vec<u8> {
        serde_json::json!({
            "id": "evt_1",
            "type": event_type,
            "data": { "object": {
                "id": "sub_1",
                "customer": "cus_1",
                "status": status,
                "items": { "data": [ { "price": { "id": "price_m" } } ] },
                "current_period_start": 1_700_000_000i64,
                "current_period_end": 1_702_592_000i64,
                "metadata": { "userId": user_id.to_string() }
            } }
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_webhook_missing_signature_rejected_without_mutation() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        h.documents
            .documents
            .lock()
            .unwrap()
            .insert(user_id, UserData::with_defaults());

        let payload = subscription_event_payload(
            "customer.subscription.created",
            user_id,
            "active",
        );
        let result = service.handle_webhook(&payload, None).await;
        assert!(matches!(
            result,
            Err(ServiceError::App(AppError::WebhookRejected(_)))
        ));

        let data = h.documents.documents.lock().unwrap().get(&user_id).cloned().unwrap();
        assert!(!data.is_subscribed);
    }

    #[tokio::test]
    async fn test_webhook_bad_signature_rejected() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);

        let payload = subscription_event_payload(
            "customer.subscription.created",
            Uuid::new_v4(),
            "active",
        );
        let header = sign_payload(&payload, "wrong-secret");
        let result = service.handle_webhook(&payload, Some(&header)).await;
        assert!(matches!(
            result,
            Err(ServiceError::App(AppError::WebhookRejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_webhook_created_reconciles_by_metadata() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        h.documents
            .documents
            .lock()
            .unwrap()
            .insert(user_id, UserData::with_defaults());

        let payload = subscription_event_payload(
            "customer.subscription.created",
            user_id,
            "trialing",
        );
        let header = sign_payload(&payload, "whsec_test");
        service.handle_webhook(&payload, Some(&header)).await.unwrap();

        let data = h.documents.documents.lock().unwrap().get(&user_id).cloned().unwrap();
        assert!(data.is_subscribed);
        assert_eq!(data.subscription_type, Some(SubscriptionType::Monthly));
    }

    #[tokio::test]
    async fn test_webhook_falls_back_to_customer_lookup() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        let mut data = UserData::with_defaults();
        data.billing_customer_id = Some("cus_1".to_string());
        h.documents.documents.lock().unwrap().insert(user_id, data);

        // Metadata names a user we do not know; the customer id resolves it
        let payload = subscription_event_payload(
            "customer.subscription.updated",
            Uuid::new_v4(),
            "active",
        );
        let header = sign_payload(&payload, "whsec_test");
        service.handle_webhook(&payload, Some(&header)).await.unwrap();

        let data = h.documents.documents.lock().unwrap().get(&user_id).cloned().unwrap();
        assert!(data.is_subscribed);
    }

    #[tokio::test]
    async fn test_webhook_unresolvable_user_rejected() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);

        let payload = subscription_event_payload(
            "customer.subscription.updated",
            Uuid::new_v4(),
            "active",
        );
        let header = sign_payload(&payload, "whsec_test");
        let result = service.handle_webhook(&payload, Some(&header)).await;
        assert!(matches!(
            result,
            Err(ServiceError::App(AppError::WebhookRejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_webhook_deleted_resets_fields() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user_id = Uuid::new_v4();

        let mut data = UserData::with_defaults();
        data.is_subscribed = true;
        data.subscription_type = Some(SubscriptionType::Monthly);
        data.billing_customer_id = Some("cus_1".to_string());
        data.billing_subscription_id = Some("sub_1".to_string());
        data.billing_price_id = Some("price_m".to_string());
        h.documents.documents.lock().unwrap().insert(user_id, data);

        let payload = subscription_event_payload(
            "customer.subscription.deleted",
            user_id,
            "canceled",
        );
        let header = sign_payload(&payload, "whsec_test");
        service.handle_webhook(&payload, Some(&header)).await.unwrap();

        let data = h.documents.documents.lock().unwrap().get(&user_id).cloned().unwrap();
        assert!(!data.is_subscribed);
        assert!(data.subscription_type.is_none());
        assert!(data.subscription_end.is_none());
        assert!(data.billing_subscription_id.is_none());
        assert!(data.billing_price_id.is_none());
    }

    #[tokio::test]
    async fn test_webhook_unhandled_event_acknowledged() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);

        let payload = serde_json::json!({
            "id": "evt_9",
            "type": "invoice.paid",
            "data": { "object": {} }
        })
        .to_string()
        .into_bytes();
        let header = sign_payload(&payload, "whsec_test");
        assert!(service.handle_webhook(&payload, Some(&header)).await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_then_restore_converge() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        let mut data = UserData::with_defaults();
        data.billing_customer_id = Some("cus_1".to_string());
        h.documents.documents.lock().unwrap().insert(user_id, data);

        // The provider holds one trialing subscription for this customer
        let subscription = provider_subscription(SubscriptionStatus::Trialing);
        h.billing
            .subscriptions
            .lock()
            .unwrap()
            .push(subscription.clone());

        // Webhook applies the subscription
        let payload = subscription_event_payload(
            "customer.subscription.created",
            user_id,
            "trialing",
        );
        let header = sign_payload(&payload, "whsec_test");
        service.handle_webhook(&payload, Some(&header)).await.unwrap();
        let after_webhook = h.documents.documents.lock().unwrap().get(&user_id).cloned().unwrap();

        // Manual restore re-derives from the same provider state
        service.restore(user_id).await.unwrap();
        let after_restore = h.documents.documents.lock().unwrap().get(&user_id).cloned().unwrap();

        assert_eq!(after_webhook.is_subscribed, after_restore.is_subscribed);
        assert_eq!(after_webhook.subscription_type, after_restore.subscription_type);
        assert_eq!(after_webhook.subscription_end, after_restore.subscription_end);
        assert_eq!(
            after_webhook.billing_subscription_id,
            after_restore.billing_subscription_id
        );
        assert_eq!(
            after_webhook.billing_price_id,
            after_restore.billing_price_id
        );
    }

    #[tokio::test]
    async fn test_restore_without_active_subscription_clears_fields() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        let mut data = UserData::with_defaults();
        data.is_subscribed = true;
        data.billing_customer_id = Some("cus_1".to_string());
        h.documents.documents.lock().unwrap().insert(user_id, data);

        let outcome = service.restore(user_id).await.unwrap();
        assert!(matches!(outcome, RestoreOutcome::NothingToRestore));

        let data = h.documents.documents.lock().unwrap().get(&user_id).cloned().unwrap();
        assert!(!data.is_subscribed);
        assert_eq!(data.billing_customer_id.as_deref(), Some("cus_1"));
    }

    #[tokio::test]
    async fn test_restore_without_customer_is_not_found() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        h.documents
            .documents
            .lock()
            .unwrap()
            .insert(user_id, UserData::with_defaults());

        let result = service.restore(user_id).await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_session_invalid_product() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user = User::new("a@b.com".to_string());

        let result = service.create_session(&user, "prod_unknown").await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_session_creates_customer_and_session() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user = User::new("a@b.com".to_string());
        h.documents
            .documents
            .lock()
            .unwrap()
            .insert(user.id, UserData::with_defaults());

        let outcome = service.create_session(&user, "prod_m").await.unwrap();
        let CheckoutOutcome::SessionCreated { session_id, url } = outcome else {
            panic!("expected a created session");
        };
        assert_eq!(session_id, "cs_test");
        assert!(url.is_some());

        // The customer id was persisted and the session used the monthly price
        let data = h.documents.documents.lock().unwrap().get(&user.id).cloned().unwrap();
        assert_eq!(data.billing_customer_id.as_deref(), Some("cus_a@b.com"));

        let sessions = h.billing.created_sessions.lock().unwrap();
        assert_eq!(sessions[0].price_id, "price_m");
        assert_eq!(sessions[0].trial_days, 7);
    }

    #[tokio::test]
    async fn test_create_session_short_circuits_when_subscribed() {
        let h = harness();
        let service = SubscriptionService::new(&h.ctx);
        let user = User::new("a@b.com".to_string());
        let mut data = UserData::with_defaults();
        data.billing_customer_id = Some("cus_1".to_string());
        h.documents.documents.lock().unwrap().insert(user.id, data);

        h.billing
            .subscriptions
            .lock()
            .unwrap()
            .push(provider_subscription(SubscriptionStatus::Active));

        let outcome = service.create_session(&user, "prod_m").await.unwrap();
        assert!(matches!(outcome, CheckoutOutcome::AlreadySubscribed { .. }));

        // No duplicate session was created, and state was reconciled
        assert!(h.billing.created_sessions.lock().unwrap().is_empty());
        let data = h.documents.documents.lock().unwrap().get(&user.id).cloned().unwrap();
        assert!(data.is_subscribed);
    }
}
