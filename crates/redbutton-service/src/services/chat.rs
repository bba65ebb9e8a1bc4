//! Streaming chat relay
//!
//! Relays the completion provider's token stream to the caller chunk by
//! chunk. A session streams until the source is exhausted and then emits a
//! terminal completion event; a provider error at any point emits a single
//! terminal error event instead. The channel (and with it the SSE
//! transport) closes on both terminal states.

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, instrument, warn};

use redbutton_core::{ChatMessage, CompletionRequest};

use crate::dto::{ChatHistoryMessage, ChatHistoryRole, InitiativeChatRequest, OnboardingChatRequest};

use super::context::ServiceContext;
use super::extract::{extract_check_ins, extract_onboarding, strip_check_in_tags, Extractable};
use super::prompts::{initiative_chat_system_prompt, ONBOARDING_SYSTEM_PROMPT};

const CHANNEL_CAPACITY: usize = 32;

/// Events emitted over the initiative-chat SSE stream
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatStreamEvent {
    /// One forwarded increment
    Text { text: String },
    /// Terminal completion event
    Done {
        done: bool,
        #[serde(rename = "fullResponse")]
        full_response: String,
        #[serde(rename = "checkIns")]
        check_ins: Vec<String>,
        #[serde(rename = "hasCheckIn")]
        has_check_in: bool,
    },
    /// Terminal failure event (headers are already committed mid-stream)
    Error { error: String },
}

/// Events emitted over the onboarding-chat SSE stream
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OnboardingStreamEvent {
    /// Visible text so far plus the current extractable set
    Chunk {
        text: String,
        extractables: Vec<Extractable>,
    },
    /// Terminal completion event
    Done {
        done: bool,
        #[serde(rename = "fullResponse")]
        full_response: String,
        extractables: Vec<Extractable>,
    },
    /// Terminal failure event
    Error { error: String },
}

fn history_messages(history: &[ChatHistoryMessage]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|m| match m.role {
            ChatHistoryRole::User => ChatMessage::user(m.content.clone()),
            ChatHistoryRole::Assistant => ChatMessage::assistant(m.content.clone()),
        })
        .collect()
}

/// Streaming chat relay service
pub struct ChatService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChatService<'a> {
    /// Create a new ChatService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Start an initiative coaching stream.
    ///
    /// Increments are forwarded as they arrive; on completion the buffered
    /// response is scanned for check-in proposals and a terminal event
    /// carries the tag-stripped text plus the extracted proposals.
    #[instrument(skip(self, api_key, request))]
    pub fn initiative_stream(
        &self,
        api_key: Option<&str>,
        request: InitiativeChatRequest,
    ) -> ReceiverStream<ChatStreamEvent> {
        let client = self.ctx.completion_client(api_key);
        let config = &self.ctx.config().ai;

        let mut messages = vec![ChatMessage::system(initiative_chat_system_prompt(
            &request.context,
        ))];
        messages.extend(history_messages(&request.history));
        messages.push(ChatMessage::user(request.message));

        let completion_request = CompletionRequest {
            model: config.chat_model.clone(),
            messages,
            temperature: config.limits.temperature.chat,
            max_tokens: config.limits.max_tokens.chat,
        };

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut stream = match client.stream(completion_request).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Chat stream failed to start");
                    let _ = tx
                        .send(ChatStreamEvent::Error {
                            error: "Error processing chat request".to_string(),
                        })
                        .await;
                    return;
                }
            };

            let mut full_response = String::new();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(content) => {
                        full_response.push_str(&content);
                        if tx.send(ChatStreamEvent::Text { text: content }).await.is_err() {
                            // Caller went away; stop relaying
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Chat stream failed mid-response");
                        let _ = tx
                            .send(ChatStreamEvent::Error {
                                error: "Error processing chat request".to_string(),
                            })
                            .await;
                        return;
                    }
                }
            }

            let check_ins = extract_check_ins(&full_response);
            info!(check_ins = check_ins.len(), "Chat stream completed");

            let _ = tx
                .send(ChatStreamEvent::Done {
                    done: true,
                    full_response: strip_check_in_tags(&full_response),
                    has_check_in: !check_ins.is_empty(),
                    check_ins,
                })
                .await;
        });

        ReceiverStream::new(rx)
    }

    /// Start an onboarding stream.
    ///
    /// On every increment the whole accumulated buffer is re-scanned for
    /// goal/initiative proposals, and the caller receives the visible text
    /// with tags removed plus the current extractable set.
    #[instrument(skip(self, api_key, request))]
    pub fn onboarding_stream(
        &self,
        api_key: Option<&str>,
        request: OnboardingChatRequest,
    ) -> ReceiverStream<OnboardingStreamEvent> {
        let client = self.ctx.completion_client(api_key);
        let config = &self.ctx.config().ai;

        let mut messages = vec![ChatMessage::system(ONBOARDING_SYSTEM_PROMPT)];
        messages.extend(history_messages(&request.history));

        let completion_request = CompletionRequest {
            model: config.chat_model.clone(),
            messages,
            temperature: config.limits.temperature.chat,
            max_tokens: config.limits.max_tokens.chat,
        };

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut stream = match client.stream(completion_request).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Onboarding stream failed to start");
                    let _ = tx
                        .send(OnboardingStreamEvent::Error {
                            error: "Error processing chat request".to_string(),
                        })
                        .await;
                    return;
                }
            };

            let mut full_response = String::new();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(content) => {
                        full_response.push_str(&content);
                        let (visible, extractables) = extract_onboarding(&full_response);
                        let event = OnboardingStreamEvent::Chunk {
                            text: visible,
                            extractables,
                        };
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Onboarding stream failed mid-response");
                        let _ = tx
                            .send(OnboardingStreamEvent::Error {
                                error: "Error processing chat request".to_string(),
                            })
                            .await;
                        return;
                    }
                }
            }

            let (visible, extractables) = extract_onboarding(&full_response);
            info!(extractables = extractables.len(), "Onboarding stream completed");

            let _ = tx
                .send(OnboardingStreamEvent::Done {
                    done: true,
                    full_response: visible,
                    extractables,
                })
                .await;
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{ChatContext, ChatContextGoal, ChatContextInitiative};
    use crate::services::testing::{harness_with, FakeCompletion};
    use std::sync::Mutex;

    fn chat_request(message: &str) -> InitiativeChatRequest {
        InitiativeChatRequest {
            context: ChatContext {
                goal: ChatContextGoal {
                    text: "Get fit".to_string(),
                    description: String::new(),
                },
                initiative: ChatContextInitiative {
                    text: "Run weekly".to_string(),
                    completed: false,
                },
                check_ins: Vec::new(),
            },
            history: Vec::new(),
            message: message.to_string(),
        }
    }

    fn scripted(chunks: &[&str]) -> FakeCompletion {
        FakeCompletion {
            reply: Ok(chunks.concat()),
            chunks: chunks.iter().map(|c| Ok((*c).to_string())).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    async fn collect_chat(stream: ReceiverStream<ChatStreamEvent>) -> Vec<ChatStreamEvent> {
        tokio_stream::StreamExt::collect(stream).await
    }

    #[tokio::test]
    async fn test_increments_forwarded_in_order_then_done() {
        let h = harness_with(
            scripted(&["Nice ", "start! ", "<check_in>Ran 5k</check_in>"]),
            None,
        );
        let service = ChatService::new(&h.ctx);

        let events = collect_chat(service.initiative_stream(None, chat_request("hi"))).await;
        assert_eq!(events.len(), 4);

        let texts: Vec<_> = events[..3]
            .iter()
            .map(|e| match e {
                ChatStreamEvent::Text { text } => text.clone(),
                other => panic!("expected text event, got {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec!["Nice ", "start! ", "<check_in>Ran 5k</check_in>"]);

        let ChatStreamEvent::Done {
            done,
            full_response,
            check_ins,
            has_check_in,
        } = &events[3]
        else {
            panic!("expected terminal done event");
        };
        assert!(*done);
        assert_eq!(full_response, "Nice start! Ran 5k");
        assert_eq!(check_ins, &vec!["Ran 5k".to_string()]);
        assert!(has_check_in);
    }

    #[tokio::test]
    async fn test_stream_without_check_ins() {
        let h = harness_with(scripted(&["Just keep going."]), None);
        let service = ChatService::new(&h.ctx);

        let events = collect_chat(service.initiative_stream(None, chat_request("hi"))).await;
        let ChatStreamEvent::Done {
            check_ins,
            has_check_in,
            ..
        } = events.last().unwrap()
        else {
            panic!("expected done event");
        };
        assert!(check_ins.is_empty());
        assert!(!has_check_in);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_yields_single_error_event() {
        let completion = FakeCompletion {
            reply: Ok(String::new()),
            chunks: vec![Ok("partial ".to_string()), Err("boom".to_string())],
            requests: Mutex::new(Vec::new()),
        };
        let h = harness_with(completion, None);
        let service = ChatService::new(&h.ctx);

        let events = collect_chat(service.initiative_stream(None, chat_request("hi"))).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ChatStreamEvent::Text { .. }));
        assert!(matches!(events[1], ChatStreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_chat_uses_chat_model_and_limits() {
        let h = harness_with(scripted(&["ok"]), None);
        let service = ChatService::new(&h.ctx);

        let _ = collect_chat(service.initiative_stream(None, chat_request("hi"))).await;

        let requests = h.completions.client.requests.lock().unwrap();
        assert_eq!(requests[0].model, "gpt-4o");
        assert_eq!(requests[0].max_tokens, 1000);
        // System prompt first, then the user's message
        assert!(requests[0].messages[0].content.contains("Run weekly"));
        assert_eq!(requests[0].messages.last().unwrap().content, "hi");
    }

    #[tokio::test]
    async fn test_onboarding_recomputes_extractables_each_chunk() {
        let h = harness_with(
            scripted(&["Try this ", "<goal:g1>Get fit</goal>", " ok?"]),
            None,
        );
        let service = ChatService::new(&h.ctx);

        let events: Vec<OnboardingStreamEvent> = tokio_stream::StreamExt::collect(
            service.onboarding_stream(None, OnboardingChatRequest::default()),
        )
        .await;

        assert_eq!(events.len(), 4);

        // Chunk 1: no complete tag yet
        let OnboardingStreamEvent::Chunk { text, extractables } = &events[0] else {
            panic!("expected chunk");
        };
        assert_eq!(text, "Try this ");
        assert!(extractables.is_empty());

        // Chunk 2: the tag completed, so it disappears from the visible
        // text and appears as an extractable
        let OnboardingStreamEvent::Chunk { text, extractables } = &events[1] else {
            panic!("expected chunk");
        };
        assert_eq!(text, "Try this ");
        assert_eq!(extractables.len(), 1);
        assert_eq!(extractables[0].id, "g1");

        let OnboardingStreamEvent::Done {
            done,
            full_response,
            extractables,
        } = &events[3]
        else {
            panic!("expected done");
        };
        assert!(*done);
        assert_eq!(full_response, "Try this  ok?");
        assert_eq!(extractables.len(), 1);
    }

    #[tokio::test]
    async fn test_event_wire_shapes() {
        let event = ChatStreamEvent::Text {
            text: "hello".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"text": "hello"})
        );

        let event = ChatStreamEvent::Done {
            done: true,
            full_response: "all".to_string(),
            check_ins: vec!["x".to_string()],
            has_check_in: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["done"], true);
        assert_eq!(json["fullResponse"], "all");
        assert_eq!(json["checkIns"][0], "x");
        assert_eq!(json["hasCheckIn"], true);

        let event = OnboardingStreamEvent::Chunk {
            text: "t".to_string(),
            extractables: Vec::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("extractables").is_some());
    }
}
