//! Text-completion collaborator.
//!
//! The model is strictly a response generator for general questions; it
//! never drives the booking flow, validates fields, or touches storage.
//! Those are deterministic decisions made by the conversation core.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use medbook_core::config::{LlmConfig, LlmProvider};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }

    fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub user_message: String,
    /// Retrieved document context, injected as an extra system message.
    pub document_context: Option<String>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Client for OpenAI-compatible chat-completions endpoints (OpenAI, Groq,
/// and Ollama's compatibility surface).
pub struct HttpCompletionClient {
    http: reqwest::Client,
    chat_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl HttpCompletionClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let base_url = match (&config.base_url, config.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmProvider::OpenAi) => "https://api.openai.com/v1".to_string(),
            (None, LlmProvider::Groq) => "https://api.groq.com/openai/v1".to_string(),
            (None, LlmProvider::Ollama) => "http://localhost:11434/v1".to_string(),
        };

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("building http client")?;

        Ok(Self {
            http,
            chat_url: format!("{base_url}/chat/completions"),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    fn build_messages(request: &CompletionRequest, with_context: bool) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(request.system_prompt.clone())];
        messages.extend(request.history.iter().cloned());
        if with_context {
            if let Some(context) = &request.document_context {
                messages.push(ChatMessage::system(format!(
                    "Use this context from clinic documents to help answer the user's \
                     question:\n\n{context}"
                )));
            }
        }
        messages.push(ChatMessage::user(request.user_message.clone()));
        messages
    }

    async fn call_once(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let body = ChatCompletionBody {
            model: self.model.clone(),
            messages,
            max_tokens: 1024,
            temperature: 0.7,
        };

        let mut http_request = self.http.post(&self.chat_url).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key.expose_secret());
        }

        let response = http_request.send().await.context("llm request failed")?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("llm endpoint returned {status}: {detail}"));
        }

        let parsed: ChatCompletionResponse =
            response.json().await.context("decoding llm response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("llm response contained no choices"))
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.call_once(Self::build_messages(request, true)).await {
                Ok(content) => return Ok(content),
                Err(error) => {
                    warn!(attempt, error = %error, "llm completion attempt failed");
                    last_error = Some(error);
                }
            }
        }

        // The context block is the most common reason for oversized or
        // malformed requests; retry once without it before giving up.
        if request.document_context.is_some() {
            if let Ok(content) = self.call_once(Self::build_messages(request, false)).await {
                return Ok(format!(
                    "{content}\n\n(Note: I couldn't access the uploaded documents for this answer)"
                ));
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("llm completion failed")))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

/// Canned client for tests and offline runs.
pub struct ScriptedCompletionClient {
    reply: Option<String>,
}

impl ScriptedCompletionClient {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self { reply: Some(reply.into()) }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(anyhow!("completion backend unavailable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use medbook_core::config::{LlmConfig, LlmProvider};

    use super::{ChatMessage, ChatRole, CompletionRequest, HttpCompletionClient};

    fn request_with_context() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "You are a booking assistant.".to_string(),
            history: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            user_message: "what are your hours?".to_string(),
            document_context: Some("Open 8am-6pm weekdays.".to_string()),
        }
    }

    #[test]
    fn messages_carry_system_history_context_and_user() {
        let messages = HttpCompletionClient::build_messages(&request_with_context(), true);
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[3].content.contains("Open 8am-6pm"));
        assert_eq!(messages[4].content, "what are your hours?");
    }

    #[test]
    fn context_can_be_dropped_for_the_fallback_call() {
        let messages = HttpCompletionClient::build_messages(&request_with_context(), false);
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|message| !message.content.contains("Open 8am-6pm")));
    }

    #[test]
    fn provider_defaults_pick_known_endpoints() {
        let config = LlmConfig {
            provider: LlmProvider::Groq,
            api_key: Some("test-key".to_string().into()),
            base_url: None,
            model: "llama-3.3-70b-versatile".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        };
        let client = HttpCompletionClient::from_config(&config).expect("client");
        assert!(client.chat_url.starts_with("https://api.groq.com/openai/v1"));
        assert!(client.chat_url.ends_with("/chat/completions"));
    }
}
