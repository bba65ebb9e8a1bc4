//! UserData document - the per-user store of app data
//!
//! One document exists per user. Embedded sub-records carry opaque string
//! ids generated at insert time; the store does not enforce uniqueness.
//! Field names serialize in camelCase, matching the document shape the
//! clients consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A selectable emotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emotion {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub is_positive: bool,
}

/// A recorded occurrence of an emotion, embedded in journal entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRecord {
    pub emotion_id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<serde_json::Value>,
}

/// A short action recorded against an emotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub timestamp: String,
    pub emotion_id: String,
}

/// A journal entry, unique per (user, date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub emotion_records: Vec<EmotionRecord>,
    /// References to action ids
    #[serde(default)]
    pub actions: Vec<String>,
}

/// A goal; the three defaults seeded at account creation are fixed
/// (non-removable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub is_fixed: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// An initiative under a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Initiative {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub goal_id: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Which entity a check-in references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Goal,
    Initiative,
}

/// A progress note against a goal or initiative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: String,
    pub content: String,
    pub timestamp: String,
    pub entity_id: String,
    pub entity_type: EntityKind,
}

/// UI theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// Per-user settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub custom_emotions: bool,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub ai_enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Billing plan kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Monthly,
    Yearly,
}

/// The per-user document
///
/// Subscription fields are a cache of the billing provider's truth and are
/// written only by the subscription subsystem; they must stay idempotently
/// reconcilable from the provider state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub emotions: Vec<Emotion>,
    #[serde(default)]
    pub actions: Vec<ActionItem>,
    #[serde(default)]
    pub journal_entries: Vec<JournalEntry>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub initiatives: Vec<Initiative>,
    #[serde(default)]
    pub check_ins: Vec<CheckIn>,
    pub settings: Settings,
    #[serde(default)]
    pub is_subscribed: bool,
    #[serde(default)]
    pub subscription_type: Option<SubscriptionType>,
    #[serde(default)]
    pub subscription_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub billing_customer_id: Option<String>,
    #[serde(default)]
    pub billing_subscription_id: Option<String>,
    #[serde(default)]
    pub billing_price_id: Option<String>,
}

impl UserData {
    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn initiative(&self, id: &str) -> Option<&Initiative> {
        self.initiatives.iter().find(|i| i.id == id)
    }

    pub fn journal_entry_by_date(&self, date: &str) -> Option<&JournalEntry> {
        self.journal_entries.iter().find(|e| e.date == date)
    }

    /// Whether a check-in target exists, by kind
    pub fn entity_exists(&self, entity_id: &str, entity_type: EntityKind) -> bool {
        match entity_type {
            EntityKind::Goal => self.goal(entity_id).is_some(),
            EntityKind::Initiative => self.initiative(entity_id).is_some(),
        }
    }

    /// Clear every subscription field (provider subscription deleted or absent)
    pub fn reset_subscription_fields(&mut self) {
        self.is_subscribed = false;
        self.subscription_type = None;
        self.subscription_end = None;
        self.billing_subscription_id = None;
        self.billing_price_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::defaults::{default_emotions, default_goals, default_settings};

    fn sample_data() -> UserData {
        UserData {
            emotions: default_emotions(),
            actions: Vec::new(),
            journal_entries: Vec::new(),
            goals: default_goals(),
            initiatives: Vec::new(),
            check_ins: Vec::new(),
            settings: default_settings(),
            is_subscribed: false,
            subscription_type: None,
            subscription_end: None,
            billing_customer_id: None,
            billing_subscription_id: None,
            billing_price_id: None,
        }
    }

    #[test]
    fn test_entity_exists_by_kind() {
        let mut data = sample_data();
        let goal_id = data.goals[0].id.clone();
        data.initiatives.push(Initiative {
            id: "i1".to_string(),
            text: "Run weekly".to_string(),
            completed: false,
            goal_id: goal_id.clone(),
            created_at: Utc::now().to_rfc3339(),
            completed_at: None,
        });

        assert!(data.entity_exists(&goal_id, EntityKind::Goal));
        assert!(data.entity_exists("i1", EntityKind::Initiative));
        assert!(!data.entity_exists("i1", EntityKind::Goal));
        assert!(!data.entity_exists("missing", EntityKind::Initiative));
    }

    #[test]
    fn test_reset_subscription_fields_keeps_customer_id() {
        let mut data = sample_data();
        data.is_subscribed = true;
        data.subscription_type = Some(SubscriptionType::Monthly);
        data.subscription_end = Some(Utc::now());
        data.billing_customer_id = Some("cus_1".to_string());
        data.billing_subscription_id = Some("sub_1".to_string());
        data.billing_price_id = Some("price_1".to_string());

        data.reset_subscription_fields();

        assert!(!data.is_subscribed);
        assert!(data.subscription_type.is_none());
        assert!(data.subscription_end.is_none());
        assert!(data.billing_subscription_id.is_none());
        assert!(data.billing_price_id.is_none());
        // Customer identity survives so a later checkout can reuse it
        assert_eq!(data.billing_customer_id.as_deref(), Some("cus_1"));
    }

    #[test]
    fn test_document_round_trips_in_camel_case() {
        let data = sample_data();
        let json = serde_json::to_value(&data).unwrap();

        assert!(json.get("journalEntries").is_some());
        assert!(json.get("isSubscribed").is_some());
        assert!(json.get("checkIns").is_some());

        let back: UserData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }
}
