use serenity::async_trait;
use tracing::warn;

use crate::clients::openai_client;
use crate::config::Settings;
use crate::error::BotError;
use crate::models::session::{ChatMessage, ChatRole};

#[async_trait]
pub trait OpenAIClient: Send + Sync {
    /// Stateless one-shot generation.
    async fn generate(&self, prompt: &str) -> Result<String, BotError>;

    /// Next assistant turn for an existing conversation.
    async fn converse(&self, history: &[ChatMessage]) -> Result<String, BotError>;
}

pub struct OpenAIService {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    models: Vec<String>,
}

impl OpenAIService {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        base_url: String,
        models: Vec<String>,
    ) -> Self {
        Self {
            http,
            api_key,
            base_url,
            models,
        }
    }

    pub fn from_settings(http: reqwest::Client, settings: &Settings) -> Self {
        Self::new(
            http,
            settings.openai_api_key.clone(),
            settings.openai_base_url.clone(),
            settings.openai_models.clone(),
        )
    }

    /// Tries each configured model in order; auth failures stop the walk since
    /// every model shares the key.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BotError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BotError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let mut last_error = None;
        for model in &self.models {
            match openai_client::query_openai(&self.http, &self.base_url, api_key, model, messages)
                .await
            {
                Ok(text) => return Ok(text),
                Err(err @ BotError::Auth(_)) => return Err(err),
                Err(err) => {
                    warn!(model = %model, error = %err, "model failed, trying next");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| BotError::Config("no OpenAI models configured".to_string())))
    }
}

#[async_trait]
impl OpenAIClient for OpenAIService {
    async fn generate(&self, prompt: &str) -> Result<String, BotError> {
        self.complete(&[ChatMessage::new(ChatRole::User, prompt)]).await
    }

    async fn converse(&self, history: &[ChatMessage]) -> Result<String, BotError> {
        self.complete(history).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let service = OpenAIService::new(
            reqwest::Client::new(),
            None,
            "http://127.0.0.1:9".to_string(),
            vec!["gpt-4o-mini".to_string()],
        );
        assert!(matches!(service.generate("hi").await, Err(BotError::Config(_))));
    }

    #[tokio::test]
    async fn empty_model_list_is_a_config_error() {
        let service = OpenAIService::new(
            reqwest::Client::new(),
            Some("key".to_string()),
            "http://127.0.0.1:9".to_string(),
            Vec::new(),
        );
        assert!(matches!(service.generate("hi").await, Err(BotError::Config(_))));
    }
}
