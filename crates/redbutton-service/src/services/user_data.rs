//! User-data service
//!
//! Reads and mutates the per-user document: default seeding, settings,
//! emotions, journal entries (upsert by date), goals, initiatives, and
//! check-ins with referential checks.

use chrono::Utc;
use redbutton_core::{
    new_record_id, CheckIn, Emotion, EntityKind, Goal, Initiative, JournalEntry, Settings,
    UserData,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dto::{
    AddCheckInRequest, AddEmotionRequest, AddGoalRequest, AddInitiativeRequest,
    AddJournalEntryRequest,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// User-data service
pub struct UserDataService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserDataService<'a> {
    /// Create a new UserDataService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load the user's document, seeding defaults when absent
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: Uuid) -> ServiceResult<UserData> {
        if let Some(data) = self.ctx.user_data_repo().find_by_user(user_id).await? {
            return Ok(data);
        }

        let defaults = UserData::with_defaults();
        self.ctx
            .user_data_repo()
            .create_if_absent(user_id, &defaults)
            .await?;

        info!(user_id = %user_id, "User data seeded with defaults");

        // Re-read: a concurrent initializer may have won the insert
        Ok(self
            .ctx
            .user_data_repo()
            .find_by_user(user_id)
            .await?
            .unwrap_or(defaults))
    }

    /// Load the user's document, failing when absent
    pub async fn require(&self, user_id: Uuid) -> ServiceResult<UserData> {
        self.ctx
            .user_data_repo()
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User data", user_id.to_string()))
    }

    /// Replace the user's settings
    #[instrument(skip(self, settings))]
    pub async fn update_settings(
        &self,
        user_id: Uuid,
        settings: Settings,
    ) -> ServiceResult<Settings> {
        let mut data = self.require(user_id).await?;
        data.settings = settings.clone();
        self.ctx.user_data_repo().update(user_id, &data).await?;
        Ok(settings)
    }

    /// Add an emotion with a fresh id
    #[instrument(skip(self, request))]
    pub async fn add_emotion(
        &self,
        user_id: Uuid,
        request: AddEmotionRequest,
    ) -> ServiceResult<(Emotion, Vec<Emotion>)> {
        let mut data = self.require(user_id).await?;

        let emotion = Emotion {
            id: new_record_id(),
            name: request.name,
            emoji: request.emoji,
            is_positive: request.is_positive,
        };

        data.emotions.push(emotion.clone());
        self.ctx.user_data_repo().update(user_id, &data).await?;

        Ok((emotion, data.emotions))
    }

    /// Remove an emotion by id; removing an unknown id is a no-op
    #[instrument(skip(self))]
    pub async fn remove_emotion(
        &self,
        user_id: Uuid,
        emotion_id: &str,
    ) -> ServiceResult<Vec<Emotion>> {
        let mut data = self.require(user_id).await?;
        data.emotions.retain(|e| e.id != emotion_id);
        self.ctx.user_data_repo().update(user_id, &data).await?;
        Ok(data.emotions)
    }

    /// Create or update the journal entry for a date.
    ///
    /// Exactly one entry exists per date; a second post for the same date
    /// replaces the content (last write wins).
    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn upsert_journal_entry(
        &self,
        user_id: Uuid,
        request: AddJournalEntryRequest,
    ) -> ServiceResult<(JournalEntry, bool)> {
        let mut data = self.require(user_id).await?;

        if let Some(existing) = data
            .journal_entries
            .iter_mut()
            .find(|e| e.date == request.date)
        {
            existing.content = request.content;
            existing.emotion_records = request.emotion_records;
            existing.actions = request.actions;
            let entry = existing.clone();
            self.ctx.user_data_repo().update(user_id, &data).await?;
            return Ok((entry, false));
        }

        let entry = JournalEntry {
            id: new_record_id(),
            date: request.date,
            content: request.content,
            emotion_records: request.emotion_records,
            actions: request.actions,
        };

        data.journal_entries.push(entry.clone());
        self.ctx.user_data_repo().update(user_id, &data).await?;

        Ok((entry, true))
    }

    /// Add a user goal (never fixed)
    #[instrument(skip(self, request))]
    pub async fn add_goal(
        &self,
        user_id: Uuid,
        request: AddGoalRequest,
    ) -> ServiceResult<(Goal, Vec<Goal>)> {
        let mut data = self.require(user_id).await?;

        let goal = Goal {
            id: new_record_id(),
            text: request.text,
            description: request.description,
            completed: false,
            is_fixed: false,
            created_at: Utc::now().to_rfc3339(),
            completed_at: None,
        };

        data.goals.push(goal.clone());
        self.ctx.user_data_repo().update(user_id, &data).await?;

        Ok((goal, data.goals))
    }

    /// Add an initiative under an existing goal
    #[instrument(skip(self, request), fields(goal_id = %request.goal_id))]
    pub async fn add_initiative(
        &self,
        user_id: Uuid,
        request: AddInitiativeRequest,
    ) -> ServiceResult<(Initiative, Vec<Initiative>)> {
        let mut data = self.require(user_id).await?;

        if data.goal(&request.goal_id).is_none() {
            return Err(ServiceError::not_found("Goal", request.goal_id));
        }

        let initiative = Initiative {
            id: new_record_id(),
            text: request.text,
            completed: false,
            goal_id: request.goal_id.clone(),
            created_at: Utc::now().to_rfc3339(),
            completed_at: None,
        };

        data.initiatives.push(initiative.clone());
        self.ctx.user_data_repo().update(user_id, &data).await?;

        let siblings = data
            .initiatives
            .iter()
            .filter(|i| i.goal_id == request.goal_id)
            .cloned()
            .collect();

        Ok((initiative, siblings))
    }

    /// Add a check-in against an existing goal or initiative
    #[instrument(skip(self, request), fields(entity_id = %request.entity_id))]
    pub async fn add_check_in(
        &self,
        user_id: Uuid,
        request: AddCheckInRequest,
    ) -> ServiceResult<(CheckIn, Vec<CheckIn>)> {
        let mut data = self.require(user_id).await?;

        if !data.entity_exists(&request.entity_id, request.entity_type) {
            let resource = match request.entity_type {
                EntityKind::Goal => "Goal",
                EntityKind::Initiative => "Initiative",
            };
            return Err(ServiceError::not_found(resource, request.entity_id));
        }

        let check_in = CheckIn {
            id: new_record_id(),
            content: request.content,
            timestamp: Utc::now().to_rfc3339(),
            entity_id: request.entity_id.clone(),
            entity_type: request.entity_type,
        };

        data.check_ins.push(check_in.clone());
        self.ctx.user_data_repo().update(user_id, &data).await?;

        let related = data
            .check_ins
            .iter()
            .filter(|c| c.entity_id == request.entity_id && c.entity_type == request.entity_type)
            .cloned()
            .collect();

        Ok((check_in, related))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::harness;

    #[tokio::test]
    async fn test_get_or_create_seeds_defaults() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);
        let user_id = Uuid::new_v4();

        let data = service.get_or_create(user_id).await.unwrap();
        assert_eq!(data.emotions.len(), 10);
        assert_eq!(data.goals.len(), 3);
        assert!(data.goals.iter().all(|g| g.is_fixed));

        // A second call returns the stored document, not a fresh seed
        let again = service.get_or_create(user_id).await.unwrap();
        assert_eq!(again.goals[0].id, data.goals[0].id);
    }

    #[tokio::test]
    async fn test_mutations_require_existing_document() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);

        let result = service
            .add_goal(
                Uuid::new_v4(),
                AddGoalRequest {
                    text: "Read more".to_string(),
                    description: String::new(),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_goal_keeps_fixed_defaults() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        service.get_or_create(user_id).await.unwrap();

        let (goal, goals) = service
            .add_goal(
                user_id,
                AddGoalRequest {
                    text: "Read more".to_string(),
                    description: "One book a month".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(!goal.is_fixed);
        assert_eq!(goals.len(), 4);
        assert_eq!(goals.iter().filter(|g| g.is_fixed).count(), 3);
    }

    #[tokio::test]
    async fn test_journal_upsert_by_date() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        service.get_or_create(user_id).await.unwrap();

        let (first, created) = service
            .upsert_journal_entry(
                user_id,
                AddJournalEntryRequest {
                    date: "2026-08-06".to_string(),
                    content: "first draft".to_string(),
                    emotion_records: Vec::new(),
                    actions: Vec::new(),
                },
            )
            .await
            .unwrap();
        assert!(created);

        let (second, created) = service
            .upsert_journal_entry(
                user_id,
                AddJournalEntryRequest {
                    date: "2026-08-06".to_string(),
                    content: "final version".to_string(),
                    emotion_records: Vec::new(),
                    actions: Vec::new(),
                },
            )
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);

        let data = service.require(user_id).await.unwrap();
        let entries: Vec<_> = data
            .journal_entries
            .iter()
            .filter(|e| e.date == "2026-08-06")
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "final version");
    }

    #[tokio::test]
    async fn test_add_initiative_checks_goal_exists() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        let data = service.get_or_create(user_id).await.unwrap();
        let goal_id = data.goals[0].id.clone();

        let result = service
            .add_initiative(
                user_id,
                AddInitiativeRequest {
                    text: "Do something".to_string(),
                    goal_id: "missing-goal".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));

        let (initiative, siblings) = service
            .add_initiative(
                user_id,
                AddInitiativeRequest {
                    text: "Run weekly".to_string(),
                    goal_id: goal_id.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(initiative.goal_id, goal_id);
        assert_eq!(siblings.len(), 1);
    }

    #[tokio::test]
    async fn test_add_check_in_validates_target() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        let data = service.get_or_create(user_id).await.unwrap();
        let goal_id = data.goals[0].id.clone();

        // Goal id presented as an initiative target is rejected
        let result = service
            .add_check_in(
                user_id,
                AddCheckInRequest {
                    content: "note".to_string(),
                    entity_id: goal_id.clone(),
                    entity_type: EntityKind::Initiative,
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));

        let (check_in, related) = service
            .add_check_in(
                user_id,
                AddCheckInRequest {
                    content: "making progress".to_string(),
                    entity_id: goal_id.clone(),
                    entity_type: EntityKind::Goal,
                },
            )
            .await
            .unwrap();
        assert_eq!(check_in.entity_id, goal_id);
        assert_eq!(related.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_emotion() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        let data = service.get_or_create(user_id).await.unwrap();
        let emotion_id = data.emotions[0].id.clone();

        let emotions = service.remove_emotion(user_id, &emotion_id).await.unwrap();
        assert_eq!(emotions.len(), 9);
        assert!(emotions.iter().all(|e| e.id != emotion_id));

        // Unknown id is a no-op
        let emotions = service.remove_emotion(user_id, "missing").await.unwrap();
        assert_eq!(emotions.len(), 9);
    }

    #[tokio::test]
    async fn test_add_emotion_generates_fresh_id() {
        let h = harness();
        let service = UserDataService::new(&h.ctx);
        let user_id = Uuid::new_v4();
        service.get_or_create(user_id).await.unwrap();

        let (emotion, emotions) = service
            .add_emotion(
                user_id,
                AddEmotionRequest {
                    name: "Curious".to_string(),
                    emoji: "🤔".to_string(),
                    is_positive: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(emotions.len(), 11);
        assert!(emotions.iter().filter(|e| e.id == emotion.id).count() == 1);
    }
}
