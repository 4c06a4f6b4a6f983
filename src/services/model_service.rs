use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::{config::Config, errors::ProviderError};

/// Produces raw text for a prompt. The text may be arbitrarily malformed.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Chat-completion model reached through `async-openai`.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(config.openai_api_base.as_str());

        Self {
            client: Client::with_config(openai_config),
            model: config.generation_model.clone(),
            temperature: config.generation_temperature,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        })
    }
}

impl From<OpenAIError> for ProviderError {
    fn from(err: OpenAIError) -> Self {
        ProviderError::Http(err.to_string())
    }
}

fn message_content(response: &Value) -> Result<String, ProviderError> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::InvalidResponse("completion contained no message content".to_string())
        })
}

#[async_trait]
impl GenerativeModel for OpenAiChatModel {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let response: Value = self
            .client
            .chat()
            .create_byot(self.request_body(prompt))
            .await?;

        message_content(&response)
    }
}
