use serde::{ Deserialize, Serialize };

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_MAX_TOKENS: i64 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const ECHO_PREFIX: &str = "🤖 Echo: ";

/// Wire shape of a chat request; omitted and `null` optionals both fall back to defaults.
#[derive(Deserialize)]
struct RawChatRequest {
    message: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    max_tokens: Option<i64>,
    #[serde(default)]
    temperature: Option<f32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(from = "RawChatRequest")]
pub struct ChatRequest {
    pub message: String,
    pub model: String,
    pub max_tokens: i64,
    pub temperature: f32,
}

impl From<RawChatRequest> for ChatRequest {
    fn from(raw: RawChatRequest) -> Self {
        Self {
            message: raw.message,
            model: raw.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: raw.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: raw.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub model_used: String,
    pub tokens_used: Option<i64>,
}

impl ChatResponse {
    pub fn echo(message: &str) -> Self {
        Self {
            reply: format!("{}{}", ECHO_PREFIX, message),
            model_used: "echo".to_string(),
            tokens_used: Some(0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub gemini_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub gemini_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_fills_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert_eq!(req.model, "gemini-1.5-flash");
        assert_eq!(req.max_tokens, 1000);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn chat_request_treats_null_as_default() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","model":null,"max_tokens":null,"temperature":null}"#
        ).unwrap();
        assert_eq!(req.model, DEFAULT_MODEL);
        assert_eq!(req.max_tokens, DEFAULT_MAX_TOKENS);
        assert!((req.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn chat_request_accepts_any_integer_max_tokens() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi","max_tokens":-1}"#).unwrap();
        assert_eq!(req.max_tokens, -1);
        let req: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","max_tokens":5000000000}"#
        ).unwrap();
        assert_eq!(req.max_tokens, 5_000_000_000);
    }

    #[test]
    fn chat_request_requires_message() {
        assert!(serde_json::from_str::<ChatRequest>(r#"{"model":"x"}"#).is_err());
    }

    #[test]
    fn echo_embeds_message_verbatim() {
        let resp = ChatResponse::echo("hello  world");
        assert_eq!(resp.reply, "🤖 Echo: hello  world");
        assert_eq!(resp.model_used, "echo");
        assert_eq!(resp.tokens_used, Some(0));
    }
}
