//! AI orchestration service
//!
//! Non-streaming completion calls: suggestion generation with line parsing,
//! journal template generation, entry polishing, and the file-upload
//! passthrough. Template and polish degrade to static fallbacks on provider
//! failure; suggestions propagate the failure since there is no safe
//! generic fallback for personalized content.

use chrono::Utc;
use redbutton_core::{ChatMessage, CompletionRequest, Goal, Initiative, UploadedFile, User};
use std::path::Path;
use tracing::{error, instrument};

use crate::dto::{
    JournalTemplateRequest, PolishEntryRequest, RelatedItem, RelatedKind, Suggestion,
    SuggestionsRequest,
};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::prompts::{
    format_goals_with_details, journal_template_prompt, suggestions_prompt,
    DEFAULT_JOURNAL_TEMPLATE, JOURNAL_SYSTEM_PROMPT, POLISH_SYSTEM_PROMPT,
    SUGGESTIONS_SYSTEM_PROMPT,
};
use super::user_data::UserDataService;

/// The fallback when the model returns no usable lines
const DEFAULT_SUGGESTION: &str = "Take a few minutes to reflect on your current emotions.";

/// AI orchestration service
pub struct AiService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AiService<'a> {
    /// Create a new AiService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Generate emotion-driven suggestions grounded in the user's goals
    #[instrument(skip(self, user, request), fields(user_id = %user.id, emotion = %request.emotion_name))]
    pub async fn suggestions(
        &self,
        user: &User,
        request: SuggestionsRequest,
    ) -> ServiceResult<Vec<Suggestion>> {
        let data = UserDataService::new(self.ctx).require(user.id).await?;

        let goals_text =
            format_goals_with_details(&data.goals, &data.initiatives, &data.check_ins);
        let prompt = suggestions_prompt(
            &request.emotion_name,
            request.is_positive,
            request.available_minutes,
            request.action.as_deref(),
            &goals_text,
        );

        let config = &self.ctx.config().ai;
        let client = self.ctx.completion_client(user.api_key.as_deref());
        let text = client
            .complete(CompletionRequest {
                model: config.default_model.clone(),
                messages: vec![
                    ChatMessage::system(SUGGESTIONS_SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ],
                temperature: config.limits.temperature.suggestions,
                max_tokens: config.limits.max_tokens.suggestions,
            })
            .await?;

        Ok(parse_suggestions(&text, &data.goals, &data.initiatives))
    }

    /// Generate a journal template; degrades to the static template on
    /// provider failure
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn journal_template(
        &self,
        user: &User,
        request: JournalTemplateRequest,
    ) -> ServiceResult<String> {
        let data = UserDataService::new(self.ctx).require(user.id).await?;

        let goals_text =
            format_goals_with_details(&data.goals, &data.initiatives, &data.check_ins);
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let prompt = journal_template_prompt(
            &request.emotions,
            &request.previous_entries,
            &goals_text,
            &today,
        );

        let config = &self.ctx.config().ai;
        let client = self.ctx.completion_client(user.api_key.as_deref());
        let result = client
            .complete(CompletionRequest {
                model: config.default_model.clone(),
                messages: vec![
                    ChatMessage::system(JOURNAL_SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ],
                temperature: config.limits.temperature.journal,
                max_tokens: config.limits.max_tokens.journal,
            })
            .await;

        match result {
            Ok(text) if !text.is_empty() => Ok(text),
            Ok(_) => Ok(DEFAULT_JOURNAL_TEMPLATE.to_string()),
            Err(e) => {
                error!(error = %e, "Journal template generation failed; using default");
                Ok(DEFAULT_JOURNAL_TEMPLATE.to_string())
            }
        }
    }

    /// Polish an entry; returns the original text unchanged on provider
    /// failure (never fabricates content on error)
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn polish_entry(
        &self,
        user: &User,
        request: PolishEntryRequest,
    ) -> ServiceResult<String> {
        let config = &self.ctx.config().ai;
        let client = self.ctx.completion_client(user.api_key.as_deref());
        let result = client
            .complete(CompletionRequest {
                model: config.default_model.clone(),
                messages: vec![
                    ChatMessage::system(POLISH_SYSTEM_PROMPT),
                    ChatMessage::user(format!(
                        "Please polish this journal entry without changing its meaning or adding new content:\n\n{}",
                        request.entry_content
                    )),
                ],
                temperature: config.limits.temperature.polish,
                max_tokens: config.limits.max_tokens.polish,
            })
            .await;

        match result {
            Ok(text) if !text.is_empty() => Ok(text),
            Ok(_) => Ok(request.entry_content),
            Err(e) => {
                error!(error = %e, "Entry polishing failed; returning original");
                Ok(request.entry_content)
            }
        }
    }

    /// Forward a spooled upload to the provider's file storage
    #[instrument(skip(self, user, path), fields(user_id = %user.id, filename = %filename))]
    pub async fn upload_file(
        &self,
        user: &User,
        path: &Path,
        filename: &str,
    ) -> ServiceResult<UploadedFile> {
        let client = self.ctx.completion_client(user.api_key.as_deref());
        Ok(client.upload_file(path, filename, "assistants").await?)
    }
}

/// Parse model output into suggestions, linking lines to goals or
/// initiatives where possible.
///
/// A line shaped `<id>: <text>` resolves the id against initiatives first,
/// then goals. Lines without an id reference fall back to case-insensitive
/// substring matching of initiative and goal text. Unmatched lines are kept
/// as plain suggestions.
pub fn parse_suggestions(
    text: &str,
    goals: &[Goal],
    initiatives: &[Initiative],
) -> Vec<Suggestion> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return vec![Suggestion::plain(DEFAULT_SUGGESTION)];
    }

    lines
        .into_iter()
        .map(|line| {
            let cleaned = strip_list_prefix(line);

            // Exactly one colon counts as an id reference
            let parts: Vec<&str> = cleaned.splitn(3, ':').collect();
            if parts.len() == 2 {
                let id = parts[0].trim();
                let text = parts[1].trim();

                if let Some(initiative) = initiatives.iter().find(|i| i.id == id) {
                    return Suggestion {
                        text: text.to_string(),
                        related_item: Some(initiative_item(initiative, goals)),
                    };
                }
                if let Some(goal) = goals.iter().find(|g| g.id == id) {
                    return Suggestion {
                        text: text.to_string(),
                        related_item: Some(RelatedItem {
                            id: goal.id.clone(),
                            kind: RelatedKind::Goal,
                            name: goal.text.clone(),
                        }),
                    };
                }
                // An id-shaped prefix that matches nothing keeps only the text
                return Suggestion::plain(text);
            }

            // Substring matching: initiatives first (more specific)
            let lowered = cleaned.to_lowercase();
            for initiative in initiatives {
                if lowered.contains(&initiative.text.to_lowercase()) {
                    return Suggestion {
                        text: cleaned.to_string(),
                        related_item: Some(initiative_item(initiative, goals)),
                    };
                }
            }
            for goal in goals {
                if lowered.contains(&goal.text.to_lowercase()) {
                    return Suggestion {
                        text: cleaned.to_string(),
                        related_item: Some(RelatedItem {
                            id: goal.id.clone(),
                            kind: RelatedKind::Goal,
                            name: goal.text.clone(),
                        }),
                    };
                }
            }

            Suggestion::plain(cleaned)
        })
        .collect()
}

/// Remove a leading bullet or `1.`-style numbering
fn strip_list_prefix(line: &str) -> &str {
    let trimmed = line.trim_start_matches(['*', '-']).trim_start();
    if trimmed.len() < line.len() {
        return trimmed;
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix('.') {
            return rest.trim_start();
        }
    }

    line
}

fn initiative_item(initiative: &Initiative, goals: &[Goal]) -> RelatedItem {
    let goal_text = goals
        .iter()
        .find(|g| g.id == initiative.goal_id)
        .map_or("Unknown goal", |g| g.text.as_str());

    RelatedItem {
        id: initiative.id.clone(),
        kind: RelatedKind::Initiative,
        name: format!("{} ({})", initiative.text, goal_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{harness_with, FakeCompletion};
    use crate::services::UserDataService;

    fn goal(id: &str, text: &str) -> Goal {
        Goal {
            id: id.to_string(),
            text: text.to_string(),
            description: String::new(),
            completed: false,
            is_fixed: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: None,
        }
    }

    fn initiative(id: &str, goal_id: &str, text: &str) -> Initiative {
        Initiative {
            id: id.to_string(),
            text: text.to_string(),
            completed: false,
            goal_id: goal_id.to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: None,
        }
    }

    #[test]
    fn test_goal_id_line_resolves_to_goal() {
        let goals = vec![goal("g1", "Personal Well-being")];
        let suggestions = parse_suggestions("g1: Go for a walk", &goals, &[]);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].text, "Go for a walk");
        let related = suggestions[0].related_item.as_ref().unwrap();
        assert_eq!(related.kind, RelatedKind::Goal);
        assert_eq!(related.id, "g1");
        assert_eq!(related.name, "Personal Well-being");
    }

    #[test]
    fn test_initiative_id_wins_over_goal_id() {
        // The same id could in principle exist on both lists; the
        // initiative resolution runs first
        let goals = vec![goal("x1", "Some goal")];
        let initiatives = vec![initiative("x1", "x1", "Run weekly")];
        let suggestions = parse_suggestions("x1: Lace up", &goals, &initiatives);

        let related = suggestions[0].related_item.as_ref().unwrap();
        assert_eq!(related.kind, RelatedKind::Initiative);
        assert_eq!(related.name, "Run weekly (Some goal)");
    }

    #[test]
    fn test_unmatched_line_stays_plain() {
        let goals = vec![goal("g1", "Personal Well-being")];
        let suggestions = parse_suggestions("Take a break", &goals, &[]);

        assert_eq!(suggestions[0].text, "Take a break");
        assert!(suggestions[0].related_item.is_none());
    }

    #[test]
    fn test_unknown_id_keeps_text_only() {
        let suggestions = parse_suggestions("zz: Do a thing", &[], &[]);
        assert_eq!(suggestions[0].text, "Do a thing");
        assert!(suggestions[0].related_item.is_none());
    }

    #[test]
    fn test_substring_match_links_goal() {
        let goals = vec![goal("g1", "running")];
        let suggestions = parse_suggestions("Let's go Running for 30 minutes", &goals, &[]);

        let related = suggestions[0].related_item.as_ref().unwrap();
        assert_eq!(related.id, "g1");
        assert_eq!(suggestions[0].text, "Let's go Running for 30 minutes");
    }

    #[test]
    fn test_bullets_and_numbering_stripped() {
        let goals = vec![goal("g1", "Personal Well-being")];
        let suggestions =
            parse_suggestions("1. g1: Go for a walk\n- Take a break\n* Breathe deeply", &goals, &[]);

        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0].text, "Go for a walk");
        assert!(suggestions[0].related_item.is_some());
        assert_eq!(suggestions[1].text, "Take a break");
        assert_eq!(suggestions[2].text, "Breathe deeply");
    }

    #[test]
    fn test_empty_output_yields_default_suggestion() {
        let suggestions = parse_suggestions("  \n\n ", &[], &[]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].text, DEFAULT_SUGGESTION);
    }

    #[test]
    fn test_line_with_two_colons_is_not_an_id() {
        let goals = vec![goal("g1", "Personal Well-being")];
        let suggestions = parse_suggestions("Note: remember: breathe", &goals, &[]);
        assert!(suggestions[0].related_item.is_none());
        assert_eq!(suggestions[0].text, "Note: remember: breathe");
    }

    fn suggestions_request() -> SuggestionsRequest {
        SuggestionsRequest {
            emotion_id: "e1".to_string(),
            emotion_name: "Anxious".to_string(),
            is_positive: false,
            available_minutes: 10,
            action: None,
        }
    }

    #[tokio::test]
    async fn test_suggestions_end_to_end_with_fake_provider() {
        let h = harness_with(FakeCompletion::replying("Take a short walk"), None);
        let user = User::new("a@b.com".to_string());
        UserDataService::new(&h.ctx).get_or_create(user.id).await.unwrap();

        let service = AiService::new(&h.ctx);
        let suggestions = service
            .suggestions(&user, suggestions_request())
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].text, "Take a short walk");

        // The request used the suggestions limits
        let requests = h.completions.client.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 600);
    }

    #[tokio::test]
    async fn test_suggestions_propagate_provider_failure() {
        let h = harness_with(FakeCompletion::failing("quota exceeded"), None);
        let user = User::new("a@b.com".to_string());
        UserDataService::new(&h.ctx).get_or_create(user.id).await.unwrap();

        let service = AiService::new(&h.ctx);
        let result = service.suggestions(&user, suggestions_request()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_journal_template_falls_back_on_failure() {
        let h = harness_with(FakeCompletion::failing("down"), None);
        let user = User::new("a@b.com".to_string());
        UserDataService::new(&h.ctx).get_or_create(user.id).await.unwrap();

        let service = AiService::new(&h.ctx);
        let template = service
            .journal_template(
                &user,
                JournalTemplateRequest {
                    emotions: Vec::new(),
                    previous_entries: Vec::new(),
                },
            )
            .await
            .unwrap();

        assert_eq!(template, DEFAULT_JOURNAL_TEMPLATE);
    }

    #[tokio::test]
    async fn test_polish_returns_original_on_failure() {
        let h = harness_with(FakeCompletion::failing("down"), None);
        let user = User::new("a@b.com".to_string());

        let service = AiService::new(&h.ctx);
        let polished = service
            .polish_entry(
                &user,
                PolishEntryRequest {
                    entry_content: "my rough draft".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(polished, "my rough draft");
    }

    #[tokio::test]
    async fn test_personal_api_key_flows_to_factory() {
        let h = harness_with(FakeCompletion::replying("ok"), None);
        let mut user = User::new("a@b.com".to_string());
        user.api_key = Some("sk-personal".to_string());

        let service = AiService::new(&h.ctx);
        service
            .polish_entry(
                &user,
                PolishEntryRequest {
                    entry_content: "text".to_string(),
                },
            )
            .await
            .unwrap();

        let keys = h.completions.override_keys.lock().unwrap();
        assert_eq!(keys.as_slice(), &[Some("sk-personal".to_string())]);
    }
}
