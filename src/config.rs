use secrecy::SecretString;
use std::env;

const DEFAULT_API_KEY: &str = "dev_api_key_change_in_production";

#[derive(Clone, Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub api_key: SecretString,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub generation_model: String,
    pub generation_temperature: f32,
    pub embedding_model: String,
    pub retrieval_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parse_env("WEB_SERVER_PORT", 8080),
            api_key: SecretString::from(
                env::var("API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string()),
            ),
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            generation_model: env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            generation_temperature: parse_env("GENERATION_TEMPERATURE", 0.7),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            retrieval_k: parse_env("RETRIEVAL_K", 4),
            chunk_size: parse_env("CHUNK_SIZE", 1000),
            chunk_overlap: parse_env("CHUNK_OVERLAP", 100),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are missing or using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let api_key = self.api_key.expose_secret();

        if api_key == DEFAULT_API_KEY {
            panic!("FATAL: API_KEY is using default value! Set API_KEY environment variable.");
        }

        if api_key.len() < 16 {
            panic!(
                "FATAL: API_KEY is too short ({}). Must be at least 16 characters.",
                api_key.len()
            );
        }

        if self.openai_api_key.expose_secret().is_empty() {
            panic!("FATAL: OPENAI_API_KEY is not set.");
        }

        if self.chunk_overlap >= self.chunk_size {
            panic!(
                "FATAL: CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({}).",
                self.chunk_overlap, self.chunk_size
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            api_key: SecretString::from("test_api_key".to_string()),
            openai_api_key: SecretString::from("sk-test".to_string()),
            openai_api_base: "http://localhost:9999/v1".to_string(),
            generation_model: "test-model".to_string(),
            generation_temperature: 0.0,
            embedding_model: "test-embedding".to_string(),
            retrieval_k: 4,
            chunk_size: 200,
            chunk_overlap: 20,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
