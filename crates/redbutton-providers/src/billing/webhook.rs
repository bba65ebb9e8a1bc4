//! Webhook signature verification and event parsing
//!
//! The provider signs each delivery with an HMAC-SHA256 over
//! `"{timestamp}.{raw body}"`, carried in the signature header as
//! `t=<unix>,v1=<hex>[,v1=...]`. Verification must happen on the raw body
//! before anything is parsed or any state is touched.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use redbutton_core::{ProviderError, ProviderResult, ProviderSubscription};

use super::client::SubscriptionObject;

/// Header carrying the webhook signature
pub const WEBHOOK_SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted age of a signed delivery, in seconds
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook signature header against the raw payload.
///
/// # Errors
/// Returns an error when the header is malformed, the timestamp is outside
/// the tolerance window, or no candidate signature matches.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> ProviderResult<()> {
    verify_at(payload, signature_header, secret, Utc::now().timestamp())
}

fn verify_at(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
) -> ProviderResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(value)) => {
                timestamp = value.parse().ok();
            }
            (Some("v1"), Some(value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    candidates.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| ProviderError::Api("signature header missing timestamp".to_string()))?;

    if candidates.is_empty() {
        return Err(ProviderError::Api(
            "signature header missing v1 signature".to_string(),
        ));
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(ProviderError::Api(
            "signature timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ProviderError::Api(format!("invalid webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    let matched = candidates
        .iter()
        .any(|candidate| candidate.ct_eq(expected.as_slice()).into());

    if matched {
        Ok(())
    } else {
        Err(ProviderError::Api("signature mismatch".to_string()))
    }
}

/// What a webhook delivery reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEventKind {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    /// Any event type the app does not handle; acknowledged and ignored
    Other(String),
}

/// A parsed webhook event
#[derive(Debug, Clone)]
pub struct BillingEvent {
    pub id: String,
    pub kind: BillingEventKind,
    pub subscription: Option<ProviderSubscription>,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

/// Parse a verified webhook payload into a billing event.
///
/// # Errors
/// Returns an error when the payload is not a valid event envelope, or when
/// a subscription event carries an uninterpretable subscription object.
pub fn parse_webhook_event(payload: &[u8]) -> ProviderResult<BillingEvent> {
    let envelope: EventEnvelope = serde_json::from_slice(payload)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed event payload: {e}")))?;

    let kind = match envelope.event_type.as_str() {
        "customer.subscription.created" => BillingEventKind::SubscriptionCreated,
        "customer.subscription.updated" => BillingEventKind::SubscriptionUpdated,
        "customer.subscription.deleted" => BillingEventKind::SubscriptionDeleted,
        other => BillingEventKind::Other(other.to_string()),
    };

    let subscription = if matches!(kind, BillingEventKind::Other(_)) {
        None
    } else {
        let object: SubscriptionObject = serde_json::from_value(envelope.data.object)
            .map_err(|e| {
                ProviderError::InvalidResponse(format!("malformed subscription object: {e}"))
            })?;
        Some(ProviderSubscription::try_from(object)?)
    };

    Ok(BillingEvent {
        id: envelope.id,
        kind,
        subscription,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, 1_700_000_000, SECRET);
        assert!(verify_at(payload, &header, SECRET, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, 1_700_000_000, "whsec_other");
        assert!(verify_at(payload, &header, SECRET, 1_700_000_000).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign(br#"{"id":"evt_1"}"#, 1_700_000_000, SECRET);
        let result = verify_at(br#"{"id":"evt_2"}"#, &header, SECRET, 1_700_000_000);
        assert!(result.is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, 1_700_000_000, SECRET);
        let result = verify_at(payload, &header, SECRET, 1_700_000_000 + 301);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_parts_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        assert!(verify_at(payload, "v1=deadbeef", SECRET, 0).is_err());
        assert!(verify_at(payload, "t=1700000000", SECRET, 1_700_000_000).is_err());
        assert!(verify_at(payload, "", SECRET, 0).is_err());
    }

    #[test]
    fn test_second_candidate_signature_accepted() {
        let payload = br#"{"id":"evt_1"}"#;
        let good = sign(payload, 1_700_000_000, SECRET);
        let header = format!("t=1700000000,v1=00ff,{}", &good["t=1700000000,".len()..]);
        assert!(verify_at(payload, &header, SECRET, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_parse_subscription_event() {
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "customer.subscription.updated",
            "data": { "object": {
                "id": "sub_1",
                "customer": "cus_1",
                "status": "active",
                "items": { "data": [ { "price": { "id": "price_m" } } ] },
                "current_period_end": 1_702_592_000i64
            } }
        });

        let event = parse_webhook_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(event.kind, BillingEventKind::SubscriptionUpdated);
        let sub = event.subscription.unwrap();
        assert_eq!(sub.id, "sub_1");
        assert_eq!(sub.price_id, "price_m");
    }

    #[test]
    fn test_parse_unhandled_event() {
        let payload = serde_json::json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": { "object": {} }
        });

        let event = parse_webhook_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(
            event.kind,
            BillingEventKind::Other("invoice.paid".to_string())
        );
        assert!(event.subscription.is_none());
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_webhook_event(b"not json").is_err());
    }
}
