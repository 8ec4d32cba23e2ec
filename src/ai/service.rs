use async_trait::async_trait;
use log::{error, info, warn};

use super::{GenerationRequest, HttpTextGenerator, MockTextGenerator, TextGenerator};
use crate::config::{AiProvider, Config};
use crate::error::Result;

/// Entry point to the AI capability.
///
/// Routes each request to the configured provider and answers with the
/// canned mock text whenever that provider is not configured or fails.
/// `generate_response` therefore always returns text.
pub struct AiService {
    default_provider: AiProvider,
    model: String,
    openai: Option<HttpTextGenerator>,
    anthropic: Option<HttpTextGenerator>,
}

impl AiService {
    /// Builds the service from configuration, creating an HTTP backend for
    /// each provider that has an API key.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ai = &config.ai;
        let backend = |provider: AiProvider, base_url: &str| {
            config
                .api_key(provider)
                .map(|token| {
                    HttpTextGenerator::new(
                        provider,
                        base_url,
                        token.clone(),
                        ai.model.clone(),
                        ai.max_tokens,
                        ai.temperature,
                    )
                })
                .transpose()
        };

        let service = Self {
            default_provider: ai.provider,
            model: ai.model.clone(),
            openai: backend(AiProvider::OpenAi, &ai.openai_base_url)?,
            anthropic: backend(AiProvider::Anthropic, &ai.anthropic_base_url)?,
        };

        info!(
            "AI service ready (default provider: {}, openai: {}, anthropic: {})",
            service.default_provider.as_str(),
            service.openai.is_some(),
            service.anthropic.is_some()
        );

        Ok(service)
    }

    /// Service that only ever answers with mock text.
    pub fn offline() -> Self {
        Self {
            default_provider: AiProvider::Mock,
            model: "mock".to_string(),
            openai: None,
            anthropic: None,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn backend(&self, provider: AiProvider) -> Option<&HttpTextGenerator> {
        match provider {
            AiProvider::OpenAi => self.openai.as_ref(),
            AiProvider::Anthropic => self.anthropic.as_ref(),
            AiProvider::Mock => None,
        }
    }

    /// Generates text for `request`, never failing.
    pub async fn generate_response(&self, request: &GenerationRequest) -> String {
        let provider = request.provider.unwrap_or(self.default_provider);

        let Some(backend) = self.backend(provider) else {
            if provider != AiProvider::Mock {
                warn!(
                    "AI provider {} not available, using mock response",
                    provider.as_str()
                );
            }
            return MockTextGenerator::respond(&request.prompt);
        };

        match backend.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                error!("AI generation failed: {e}");
                MockTextGenerator::respond(&request.prompt)
            }
        }
    }
}

#[async_trait]
impl TextGenerator for AiService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        Ok(self.generate_response(request).await)
    }

    fn name(&self) -> &str {
        "ai-service"
    }
}
