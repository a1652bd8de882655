pub mod gemini;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;

use self::gemini::GeminiChatClient;
use super::{ LlmConfig, UpstreamError };
use crate::models::chat::Turn;

/// Everything needed for one upstream generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub turns: Vec<Turn>,
    pub max_tokens: i64,
    pub temperature: f32,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the whole conversation and returns the reply text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, UpstreamError>;

    fn get_base_url(&self) -> String;
}

/// Builds the upstream client, or `None` when no API key is configured.
pub fn new_client(
    config: &LlmConfig
) -> Result<Option<Arc<dyn ChatClient>>, Box<dyn StdError + Send + Sync>> {
    if !config.is_configured() {
        return Ok(None);
    }
    let client = GeminiChatClient::from_config(config)?;
    Ok(Some(Arc::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_key_builds_no_client() {
        let client = new_client(&LlmConfig::default()).unwrap();
        assert!(client.is_none());
    }

    #[test]
    fn key_builds_gemini_client() {
        let config = LlmConfig {
            api_key: Some("secret".into()),
            ..LlmConfig::default()
        };
        let client = new_client(&config).unwrap().expect("client");
        assert_eq!(client.get_base_url(), crate::llm::DEFAULT_GEMINI_BASE_URL);
    }
}
