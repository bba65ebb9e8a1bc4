//! Tag-delimited extraction from streamed completion text
//!
//! Two tag grammars exist: `<check_in>…</check_in>` proposals in initiative
//! chats, and `<goal:ID>…</goal>` / `<initiative:ID on GOAL_ID>…</initiative>`
//! proposals in onboarding chats. Check-in tags are stripped leaving their
//! content visible; onboarding tags are removed wholesale and surfaced as
//! structured extractables instead.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static CHECK_IN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<check_in>(.*?)</check_in>").unwrap());

static GOAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<goal:([^>]+)>(.*?)</goal>").unwrap());

static INITIATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<initiative:([^ >]+) on ([^>]+)>(.*?)</initiative>").unwrap());

/// A goal or initiative proposal extracted from onboarding chat text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extractable {
    #[serde(rename = "type")]
    pub kind: ExtractableKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    pub text: String,
}

/// What an extractable proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractableKind {
    Goal,
    Initiative,
}

/// Extract every check-in proposal from a completed response
pub fn extract_check_ins(text: &str) -> Vec<String> {
    CHECK_IN_RE
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Remove check-in tag markers, keeping the proposal text visible
pub fn strip_check_in_tags(text: &str) -> String {
    text.replace("<check_in>", "").replace("</check_in>", "")
}

/// Extract goal/initiative proposals from the accumulated onboarding buffer
/// and return the visible text with the tags removed.
///
/// Called on every increment with the whole buffer, so the extractable set
/// is always recomputed from scratch rather than patched per delta.
pub fn extract_onboarding(buffer: &str) -> (String, Vec<Extractable>) {
    let mut extractables = Vec::new();

    for cap in GOAL_RE.captures_iter(buffer) {
        extractables.push(Extractable {
            kind: ExtractableKind::Goal,
            id: cap[1].to_string(),
            goal_id: None,
            text: cap[2].to_string(),
        });
    }

    for cap in INITIATIVE_RE.captures_iter(buffer) {
        extractables.push(Extractable {
            kind: ExtractableKind::Initiative,
            id: cap[1].to_string(),
            goal_id: Some(cap[2].to_string()),
            text: cap[3].to_string(),
        });
    }

    let visible = GOAL_RE.replace_all(buffer, "");
    let visible = INITIATIVE_RE.replace_all(&visible, "").into_owned();

    (visible, extractables)
}
