//! Completion provider REST client
//!
//! Wraps the provider's chat-completions endpoint (blocking and streaming)
//! and the file-storage endpoint. Clients are produced by a factory so that
//! a caller-supplied API key yields its own client instead of mutating a
//! shared one.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use redbutton_core::{
    ChatRole, CompletionFactory, CompletionProvider, CompletionRequest, ProviderError,
    ProviderResult, TokenStream, UploadedFile,
};

use super::SseDecoder;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Completion provider client bound to one API key
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client against the production API
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>) -> ProviderResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (tests, proxies)
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::Transport(format!("failed building completion client: {e}"))
            })?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    fn completion_body(request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let messages: Vec<_> = request
            .messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        ChatRole::System => "system",
                        ChatRole::User => "user",
                        ChatRole::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": stream,
        })
    }
}

// === Wire types ===

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the content delta from one streamed payload, if any
fn delta_content(payload: &str) -> Option<String> {
    serde_json::from_str::<StreamChunk>(payload)
        .ok()
        .and_then(|chunk| chunk.choices.into_iter().next())
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
}

struct StreamState {
    bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
    #[serde(default)]
    filename: String,
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<String> {
        let body = Self::completion_body(&request, false);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Api(format!("{status}: {text}")));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn stream(&self, request: CompletionRequest) -> ProviderResult<TokenStream> {
        let body = Self::completion_body(&request, true);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{status}: {text}")));
        }

        let state = StreamState {
            bytes: response.bytes_stream().boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        };

        let token_stream = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(content) = state.pending.pop_front() {
                    return Some((Ok(content), state));
                }
                if state.done {
                    return None;
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        for payload in state.decoder.feed(&chunk) {
                            if payload == "[DONE]" {
                                state.done = true;
                                break;
                            }
                            if let Some(content) = delta_content(&payload) {
                                state.pending.push_back(content);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        state.done = true;
                        return Some((Err(ProviderError::Transport(e.to_string())), state));
                    }
                    None => {
                        state.done = true;
                    }
                }
            }
        });

        Ok(token_stream.boxed())
    }

    async fn upload_file(
        &self,
        path: &Path,
        filename: &str,
        purpose: &str,
    ) -> ProviderResult<UploadedFile> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ProviderError::Transport(format!("failed reading upload: {e}")))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Api(format!("{status}: {text}")));
        }

        let parsed: FileObject = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(UploadedFile {
            id: parsed.id,
            filename: if parsed.filename.is_empty() {
                filename.to_string()
            } else {
                parsed.filename
            },
        })
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Produces completion clients, honoring per-caller API key overrides.
///
/// The default client is built once and shared; a caller with a personal
/// key gets a dedicated client for that call, so concurrent requests with
/// different keys never interfere.
pub struct OpenAiClientFactory {
    default_client: Arc<OpenAiClient>,
    base_url: String,
}

impl OpenAiClientFactory {
    /// Create a factory with the configured default key
    ///
    /// # Errors
    /// Returns an error if the default client cannot be built
    pub fn new(default_api_key: &str) -> ProviderResult<Self> {
        Self::with_base_url(default_api_key, DEFAULT_BASE_URL)
    }

    /// Create a factory against a custom base URL
    ///
    /// # Errors
    /// Returns an error if the default client cannot be built
    pub fn with_base_url(default_api_key: &str, base_url: &str) -> ProviderResult<Self> {
        Ok(Self {
            default_client: Arc::new(OpenAiClient::with_base_url(default_api_key, base_url)?),
            base_url: base_url.to_string(),
        })
    }
}

impl CompletionFactory for OpenAiClientFactory {
    fn client(&self, api_key_override: Option<&str>) -> Arc<dyn CompletionProvider> {
        match api_key_override {
            Some(key) => match OpenAiClient::with_base_url(key, &self.base_url) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    tracing::warn!(error = %e, "Falling back to default completion client");
                    self.default_client.clone()
                }
            },
            None => self.default_client.clone(),
        }
    }
}

impl std::fmt::Debug for OpenAiClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClientFactory")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redbutton_core::ChatMessage;

    #[test]
    fn test_delta_content_extraction() {
        let payload = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(delta_content(payload), Some("Hel".to_string()));

        // Role-only first chunk carries no content
        let payload = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(delta_content(payload), None);

        // Empty deltas are dropped
        let payload = r#"{"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(delta_content(payload), None);

        assert_eq!(delta_content("not json"), None);
    }

    #[test]
    fn test_completion_body_shape() {
        let request = CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![
                ChatMessage::system("be brief"),
                ChatMessage::user("hello"),
            ],
            temperature: 0.7,
            max_tokens: 600,
        };

        let body = OpenAiClient::completion_body(&request, true);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 600);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_factory_reuses_default_client() {
        let factory = OpenAiClientFactory::new("sk-default").unwrap();
        let a = factory.client(None);
        let b = factory.client(None);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_factory_builds_dedicated_client_for_override() {
        let factory = OpenAiClientFactory::new("sk-default").unwrap();
        let default = factory.client(None);
        let personal = factory.client(Some("sk-personal"));
        assert!(!Arc::ptr_eq(&default, &personal));
    }
}
