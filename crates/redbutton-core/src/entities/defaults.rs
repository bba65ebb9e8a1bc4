//! Default data seeded into every new account

use chrono::Utc;

use super::user_data::{Emotion, Goal, Settings, Theme, UserData};
use super::new_record_id;

/// The ten emotions every new account starts with
pub fn default_emotions() -> Vec<Emotion> {
    let seed = [
        ("Happy", "😊", true),
        ("Excited", "🎉", true),
        ("Grateful", "🙏", true),
        ("Proud", "🏆", true),
        ("Calm", "😌", true),
        ("Sad", "😔", false),
        ("Anxious", "😰", false),
        ("Frustrated", "😤", false),
        ("Overwhelmed", "😩", false),
        ("Angry", "😠", false),
    ];

    seed.into_iter()
        .map(|(name, emoji, is_positive)| Emotion {
            id: new_record_id(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            is_positive,
        })
        .collect()
}

/// The three fixed goals every new account starts with
pub fn default_goals() -> Vec<Goal> {
    let seed = [
        (
            "Personal Well-being",
            "Maintain and improve my physical and mental health",
        ),
        (
            "Professional Growth",
            "Develop skills and advance in my career",
        ),
        ("Relationships", "Nurture important relationships in my life"),
    ];

    seed.into_iter()
        .map(|(text, description)| Goal {
            id: new_record_id(),
            text: text.to_string(),
            description: description.to_string(),
            completed: false,
            is_fixed: true,
            created_at: Utc::now().to_rfc3339(),
            completed_at: None,
        })
        .collect()
}

pub fn default_settings() -> Settings {
    Settings {
        custom_emotions: false,
        theme: Theme::Dark,
        ai_enabled: true,
    }
}

impl UserData {
    /// A fresh document with default emotions, fixed goals, and settings
    pub fn with_defaults() -> Self {
        Self {
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
}
