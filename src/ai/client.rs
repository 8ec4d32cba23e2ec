use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{GenerationRequest, TextGenerator};
use crate::auth::Token;
use crate::config::AiProvider;
use crate::error::{PipeLensError, Result};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Chat-completion backend for a single hosted provider.
///
/// Makes exactly one attempt per call. Failures surface as errors and are
/// never retried.
pub struct HttpTextGenerator {
    client: Client,
    provider: AiProvider,
    endpoint: Url,
    token: Token,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

impl HttpTextGenerator {
    /// Creates a backend for `provider` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for the mock provider, an invalid base
    /// URL, or an HTTP client that cannot be built.
    pub fn new(
        provider: AiProvider,
        base_url: &str,
        token: Token,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self> {
        let path = match provider {
            AiProvider::OpenAi => "v1/chat/completions",
            AiProvider::Anthropic => "v1/messages",
            AiProvider::Mock => {
                return Err(PipeLensError::Config(
                    "The mock provider has no HTTP backend".to_string(),
                ))
            }
        };

        let client = Client::builder()
            .user_agent(concat!("PipeLens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipeLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base = Url::parse(base_url)
            .map_err(|e| PipeLensError::Config(format!("Invalid base URL: {e}")))?;
        let endpoint = base
            .join(path)
            .map_err(|e| PipeLensError::Config(format!("Invalid API URL: {e}")))?;

        Ok(Self {
            client,
            provider,
            endpoint,
            token,
            model: model.into(),
            max_tokens,
            temperature,
        })
    }

    async fn send<B: Serialize + ?Sized>(&self, body: &B) -> Result<reqwest::Response> {
        let request = self.client.post(self.endpoint.clone()).json(body);
        let request = match self.provider {
            AiProvider::Anthropic => request
                .header("x-api-key", self.token.as_str())
                .header("anthropic-version", ANTHROPIC_VERSION),
            _ => request.bearer_auth(self.token.as_str()),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PipeLensError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn openai(&self, request: &GenerationRequest) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = OpenAiRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.unwrap_or(self.temperature),
        };

        let response: OpenAiResponse = self.send(&body).await?.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipeLensError::Ai("OpenAI response contained no content".to_string()))
    }

    async fn anthropic(&self, request: &GenerationRequest) -> Result<String> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.unwrap_or(self.temperature),
            system: request
                .system_prompt
                .as_deref()
                .unwrap_or(DEFAULT_SYSTEM_PROMPT),
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response: AnthropicResponse = self.send(&body).await?.json().await?;
        response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| {
                PipeLensError::Ai("Anthropic response contained no text".to_string())
            })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!("Sending generation request to {}", self.endpoint);
        match self.provider {
            AiProvider::Anthropic => self.anthropic(request).await,
            _ => self.openai(request).await,
        }
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }
}
