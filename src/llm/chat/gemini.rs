use async_trait::async_trait;
use log::{ debug, info };
use reqwest::{ header::CONTENT_TYPE, Client as HttpClient };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::time::Duration;
use url::Url;

use super::{ ChatClient, GenerationRequest };
use crate::llm::{ LlmConfig, UpstreamError, DEFAULT_GEMINI_BASE_URL };
use crate::models::chat::Role;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct GeminiContent {
    role: Role,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: i64,
    temperature: f32,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

fn extract_reply(body: &[u8]) -> Result<String, UpstreamError> {
    let response: GoogleResponse = serde_json::from_slice(body)?;
    let candidate = response.candidates
        .into_iter()
        .next()
        .ok_or(UpstreamError::MalformedResponse("candidates[0]"))?;
    let content = candidate.content.ok_or(UpstreamError::MalformedResponse("candidates[0].content"))?;
    let part = content.parts
        .into_iter()
        .next()
        .ok_or(UpstreamError::MalformedResponse("candidates[0].content.parts[0]"))?;
    part.text.ok_or(UpstreamError::MalformedResponse("candidates[0].content.parts[0].text"))
}

pub struct GeminiChatClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    send_turn_roles: bool,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Option<Duration>,
        send_turn_roles: bool
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        // Validate early so a bad GEMINI_BASE_URL fails at startup.
        Url::parse(&base_url).map_err(|e| format!("Invalid Gemini base url '{}': {}", base_url, e))?;

        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_key,
            base_url,
            send_turn_roles,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "Google API key is required for GeminiChatClient".to_string())?;

        Self::new(api_key, config.base_url.clone(), config.timeout, config.send_turn_roles)
    }

    fn endpoint(&self, model: &str) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}/models/{}:generateContent", self.base_url, model))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    fn build_payload(&self, request: &GenerationRequest) -> GeminiRequest {
        let contents = request.turns
            .iter()
            .map(|turn| GeminiContent {
                // Prior replies go out as "user" unless real roles are enabled.
                role: if self.send_turn_roles { turn.role } else { Role::User },
                parts: vec![GeminiPart { text: turn.content.clone() }],
            })
            .collect();

        GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, UpstreamError> {
        let url = self.endpoint(&request.model)?;
        let payload = self.build_payload(request);
        info!(
            "GeminiChatClient::generate() → model={} turns={} base_url={}",
            request.model,
            payload.contents.len(),
            self.base_url
        );

        let resp = self.http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }

        let body = resp.bytes().await?;
        debug!("Gemini response: {} bytes", body.len());
        extract_reply(&body)
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
