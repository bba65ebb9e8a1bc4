//! Prompt construction for the completion provider
//!
//! Renders a user's goals, nested initiatives, and check-ins into the text
//! block injected into completion prompts. Check-ins are ordered
//! most-recent-first within each list.

use chrono::DateTime;
use redbutton_core::{CheckIn, EntityKind, Goal, Initiative};

use crate::dto::{ChatContext, EmotionDescriptor};

/// Render a check-in timestamp for a prompt line
fn format_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

fn sorted_recent_first<'a>(
    check_ins: &'a [CheckIn],
    entity_id: &str,
    entity_type: EntityKind,
) -> Vec<&'a CheckIn> {
    let mut matched: Vec<&CheckIn> = check_ins
        .iter()
        .filter(|c| c.entity_id == entity_id && c.entity_type == entity_type)
        .collect();
    matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matched
}

/// Format goals with their initiatives and progress notes for prompt context
pub fn format_goals_with_details(
    goals: &[Goal],
    initiatives: &[Initiative],
    check_ins: &[CheckIn],
) -> String {
    let mut out = String::new();

    for goal in goals {
        out.push_str(&format!("GOAL: ID: {} - {}\n", goal.id, goal.text));
        if !goal.description.is_empty() {
            out.push_str(&format!("DESCRIPTION: {}\n", goal.description));
        }

        let goal_check_ins = sorted_recent_first(check_ins, &goal.id, EntityKind::Goal);
        if !goal_check_ins.is_empty() {
            out.push_str("PROGRESS NOTES:\n");
            for check_in in goal_check_ins {
                out.push_str(&format!(
                    "- {}: {}\n",
                    format_date(&check_in.timestamp),
                    check_in.content
                ));
            }
        }

        let goal_initiatives: Vec<&Initiative> =
            initiatives.iter().filter(|i| i.goal_id == goal.id).collect();
        if !goal_initiatives.is_empty() {
            out.push_str("INITIATIVES:\n");
            for initiative in goal_initiatives {
                out.push_str(&format!(
                    "- ID: {} - {} ({})\n",
                    initiative.id,
                    initiative.text,
                    if initiative.completed {
                        "COMPLETED"
                    } else {
                        "IN PROGRESS"
                    }
                ));

                for check_in in
                    sorted_recent_first(check_ins, &initiative.id, EntityKind::Initiative)
                {
                    out.push_str(&format!(
                        "  * {}: {}\n",
                        format_date(&check_in.timestamp),
                        check_in.content
                    ));
                }
            }
        }

        out.push('\n');
    }

    out
}

/// Build the user prompt for suggestion generation
pub fn suggestions_prompt(
    emotion_name: &str,
    is_positive: bool,
    available_minutes: u32,
    action: Option<&str>,
    goals_text: &str,
) -> String {
    let mut prompt = if is_positive {
        format!("I'm feeling {emotion_name} right now and I have {available_minutes} minutes available.")
    } else {
        format!(
            "I'm feeling {emotion_name} right now and I have {available_minutes} minutes available. \
             I need some suggestions to help me feel better or be more productive."
        )
    };

    if is_positive {
        match action {
            Some("celebrate") => prompt.push_str(
                " I want to have at least one proposal that will allow me to celebrate this feeling.",
            ),
            Some("plan") => prompt.push_str(" I want you to help me to identify a next step."),
            _ => {}
        }
    }

    prompt.push_str(&format!(
        "\n\nHere are my current goals and initiatives:\n{goals_text}\n\
         Given my current state and goals, what are 3 specific actions I could take in the next {available_minutes} minutes?\n\n\
         I want your actions to be\n\
         - very specific and brief (\"let's go running for 30 minutes\" is good; an abstract micro-goal exercise is not)\n\
         - exactly fit to the available time\n\
         - informed by the goals, initiatives and check-ins above, CONSIDERING THEIR DATES\n\
           - try to balance between the goals - do not prioritize one goal over the others\n\
           - propose actions that are about different goals\n\
           - combine straightforward actions with more abstract ones\n\n\
         OUTPUT FORMAT NOTES:\n\
         - each action should be in a new line. No multiline actions.\n\
         - if an action is relevant to a specific goal or initiative, follow the format: <id>: <action_text>\n"
    ));

    prompt
}

/// System prompt for suggestion generation
pub const SUGGESTIONS_SYSTEM_PROMPT: &str =
    "You are an empathetic assistant helping users respond effectively to their emotional states.";

/// System prompt for journal template generation
pub const JOURNAL_SYSTEM_PROMPT: &str = "You are a supportive journaling assistant. Create \
     templates that are personal, reflective, and help users process their emotions.";

/// System prompt for entry polishing
pub const POLISH_SYSTEM_PROMPT: &str = "You are a skilled writing assistant helping to polish \
     journal entries.\nMaintain the writer's voice, key points, and personal insights.\n\
     Improve clarity, flow, and readability.\nFix any grammar or spelling issues.\n\
     DO NOT add new content or change the meaning of what was written.";

/// Build the user prompt for journal template generation
pub fn journal_template_prompt(
    emotions: &[EmotionDescriptor],
    previous_entries: &[String],
    goals_text: &str,
    today: &str,
) -> String {
    let emotions_text = emotions
        .iter()
        .map(|e| {
            format!(
                "{} ({})",
                e.name,
                if e.is_positive { "positive" } else { "negative" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    // Limit to the two most recent prior entries to save tokens
    let recent_entries = previous_entries
        .iter()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut prompt = format!(
        "=== TASK ===\n\
         Create a thoughtful journal template for today that helps me reflect on these emotions.\n\
         Include 3-5 specific questions or prompts to guide my reflection.\n\
         Keep it plaintext only. Only questions to answer (or reference to some TODAY's updates like check-ins).\n\
         Today is {today}.\n\n\
         === CONTEXT ===\n\
         I experienced these emotions today: {emotions_text}."
    );

    if !recent_entries.is_empty() {
        prompt.push_str(&format!(
            "\n\nHere are my most recent journal entries:\n{recent_entries}"
        ));
    }
    if !goals_text.is_empty() {
        prompt.push_str(&format!(
            "\n\nHere are my current goals and initiatives:\n{goals_text}"
        ));
    }

    prompt.push_str(
        "\n\n=== OUTPUT FORMAT ===\n\
         Plaintext only. Numbered list of questions.\n\
         You may add 1 inspirational quote at the end related to today's emotions and updates.",
    );

    prompt
}

/// The fallback journal template used when the provider fails
pub const DEFAULT_JOURNAL_TEMPLATE: &str = "# Journal Entry\n\n\
## How I'm feeling today\n[Write about your emotions and overall mood]\n\n\
## What happened today\n[Describe any significant events or interactions]\n\n\
## Reflections\n[What did I learn today? What insights did I gain?]\n\n\
## Tomorrow\n[What am I looking forward to? What do I want to accomplish?]";

/// Build the system prompt for an initiative coaching chat
pub fn initiative_chat_system_prompt(context: &ChatContext) -> String {
    let mut prompt = format!(
        "You are an AI assistant helping the user break down their initiative: \"{}\" \
         which is part of their goal: \"{}\".\n",
        context.initiative.text, context.goal.text
    );

    if !context.goal.description.is_empty() {
        prompt.push_str(&format!(
            "\nThe goal description is: \"{}\"\n",
            context.goal.description
        ));
    }

    if context.check_ins.is_empty() {
        prompt.push_str("\nThere are no check-ins for this initiative yet.\n");
    } else {
        prompt.push_str("\nHere are the check-ins (progress notes) for this initiative so far:\n");
        for check_in in &context.check_ins {
            prompt.push_str(&format!(
                "- {}: {}\n",
                format_date(&check_in.timestamp),
                check_in.content
            ));
        }
    }

    prompt.push_str(
        "\nYour role is to help the user:\n\
         1. Break down the initiative into smaller, actionable steps\n\
         2. Identify potential obstacles and solutions\n\
         3. Suggest concrete next actions\n\
         4. Provide guidance on how to approach the initiative\n\n\
         Stay sharp and concise. Stay very practical. If something is not clear to the user, ask for more details.\n\n\
         IMPORTANT: Every message should contain at least one potential improvement for the user to take - \
         a potential check-in (progress note) that the user might want to record, wrap it in <check_in> tags. \
         For example: \"<check_in>Completed initial research on design patterns.</check_in>\"\n\n\
         Keep your responses concise, practical and focused on helping the user make progress towards completing their initiative.\n\
         Important - your default response length is under 30 words. Don't make it larger if not asked about deep advice.\n\n\
         Stay personal. Don't be too formal. Give your advice.\n",
    );

    prompt
}

/// System prompt for the onboarding chat
pub const ONBOARDING_SYSTEM_PROMPT: &str = "You are an AI onboarding assistant for the RedButton app.\n\
When you suggest a goal, wrap it as <goal:unique_id>Goal text</goal>.\n\
When you suggest an initiative, wrap it as <initiative:unique_id on goal_id>Initiative text</initiative>.\n\
Do not use the same ID twice.\n\
Do not include the text inside these tags in the visible message; it will be shown as a button instead.";
