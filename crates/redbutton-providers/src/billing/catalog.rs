//! Product catalog resolution
//!
//! The configured products only carry product ids; the price ids the
//! checkout flow needs are looked up from the provider once at startup.
//! A catalog that cannot be resolved is a startup failure, not a deferred
//! error.

use tracing::info;

use redbutton_common::BillingConfig;
use redbutton_core::{BillingProvider, ProductCatalog, ProductConfig, ProviderError, ProviderResult};

/// Resolve the price ids for both configured products.
///
/// # Errors
/// Returns an error if either product has no active recurring price.
pub async fn resolve_catalog(
    billing: &dyn BillingProvider,
    config: &BillingConfig,
) -> ProviderResult<ProductCatalog> {
    let monthly_price = first_price(billing, &config.monthly_product_id).await?;
    let yearly_price = first_price(billing, &config.yearly_product_id).await?;

    info!(
        monthly_price_id = %monthly_price,
        yearly_price_id = %yearly_price,
        "Billing catalog resolved"
    );

    Ok(ProductCatalog {
        monthly: ProductConfig {
            product_id: config.monthly_product_id.clone(),
            price_id: monthly_price,
            name: "RedButton Monthly".to_string(),
            description: "Monthly subscription to RedButton".to_string(),
            trial_days: 7,
        },
        yearly: ProductConfig {
            product_id: config.yearly_product_id.clone(),
            price_id: yearly_price,
            name: "RedButton Yearly".to_string(),
            description: "Yearly subscription to RedButton".to_string(),
            trial_days: 7,
        },
    })
}

async fn first_price(billing: &dyn BillingProvider, product_id: &str) -> ProviderResult<String> {
    let prices = billing.list_recurring_prices(product_id).await?;
    prices
        .into_iter()
        .next()
        .map(|p| p.id)
        .ok_or_else(|| {
            ProviderError::Api(format!("no active recurring price for product {product_id}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use redbutton_core::{
        CheckoutParams, CheckoutSession, Price, ProviderSubscription,
    };
    use uuid::Uuid;

    struct FakeBilling {
        prices: Vec<Price>,
    }

    #[async_trait]
    impl BillingProvider for FakeBilling {
        async fn create_customer(&self, _email: &str, _user_id: Uuid) -> ProviderResult<String> {
            unreachable!()
        }

        async fn list_subscriptions(
            &self,
            _customer_id: &str,
        ) -> ProviderResult<Vec<ProviderSubscription>> {
            unreachable!()
        }

        async fn create_checkout_session(
            &self,
            _params: CheckoutParams,
        ) -> ProviderResult<CheckoutSession> {
            unreachable!()
        }

        async fn list_recurring_prices(&self, product_id: &str) -> ProviderResult<Vec<Price>> {
            Ok(self
                .prices
                .iter()
                .filter(|p| p.product_id == product_id)
                .cloned()
                .collect())
        }
    }

    fn test_config() -> BillingConfig {
        BillingConfig {
            secret_key: "sk_test".to_string(),
            monthly_product_id: "prod_m".to_string(),
            yearly_product_id: "prod_y".to_string(),
            webhook_secret: "whsec".to_string(),
            success_url: String::new(),
            cancel_url: String::new(),
            enforce_entitlement: false,
        }
    }

    #[tokio::test]
    async fn test_resolves_both_prices() {
        let billing = FakeBilling {
            prices: vec![
                Price {
                    id: "price_m".to_string(),
                    product_id: "prod_m".to_string(),
                },
                Price {
                    id: "price_y".to_string(),
                    product_id: "prod_y".to_string(),
                },
            ],
        };

        let catalog = resolve_catalog(&billing, &test_config()).await.unwrap();
        assert_eq!(catalog.monthly.price_id, "price_m");
        assert_eq!(catalog.yearly.price_id, "price_y");
        assert_eq!(catalog.monthly.trial_days, 7);
    }

    #[tokio::test]
    async fn test_missing_price_fails() {
        let billing = FakeBilling {
            prices: vec![Price {
                id: "price_m".to_string(),
                product_id: "prod_m".to_string(),
            }],
        };

        let result = resolve_catalog(&billing, &test_config()).await;
        assert!(result.is_err());
    }
}
