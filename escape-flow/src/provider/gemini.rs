use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::{GenerateRequest, GenerativeModel};
use crate::error::ProviderError;
use crate::models::{ChatRole, ChatTurn};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

impl From<&ChatTurn> for Content {
    fn from(turn: &ChatTurn) -> Self {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Content::text(Some(role), turn.text.clone())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl From<&GenerateRequest> for GenerateContentRequest {
    fn from(request: &GenerateRequest) -> Self {
        let mut contents: Vec<Content> = request.history.iter().map(Content::from).collect();
        contents.push(Content::text(Some("user"), request.prompt.clone()));

        let system_instruction = request
            .system_instruction
            .as_ref()
            .map(|text| Content::text(None, text.clone()));

        let generation_config = if request.response_schema.is_some()
            || request.thinking_budget.is_some()
        {
            Some(GenerationConfig {
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
                thinking_config: request
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated. Empty when the model
    /// returned nothing usable.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Build a [`ProviderError`] from a non-success response, keeping the
/// `status` string (e.g. `RESOURCE_EXHAUSTED`) in the message.
pub fn error_from_response(status: u16, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error:
                ErrorBody {
                    message,
                    status: Some(code),
                },
        }) => format!("{code}: {message}"),
        Ok(ErrorEnvelope { error }) => error.message,
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => body.trim().to_string(),
    };
    ProviderError::with_status(status, message)
}

/// Gemini `generateContent` over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        let body = GenerateContentRequest::from(&request);
        debug!(
            model = %self.model,
            history = request.history.len(),
            structured = request.response_schema.is_some(),
            "Calling Gemini generateContent"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        if !status.is_success() {
            let err = error_from_response(status.as_u16(), &text);
            error!(status = status.as_u16(), "Gemini request failed: {}", err.message);
            return Err(err);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::with_status(
                status.as_u16(),
                format!("Could not decode Gemini response: {e}"),
            )
        })?;
        Ok(parsed.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::recommendation_schema;
    use serde_json::json;

    #[test]
    fn history_then_prompt_in_order() {
        let request = GenerateRequest::new("and for anime?")
            .with_system_instruction("be nice")
            .with_history(vec![
                ChatTurn::model("Hello!"),
                ChatTurn::user("recommend a movie"),
                ChatTurn::model("Try Arrival."),
            ]);

        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();
        assert_eq!(
            body["contents"],
            json!([
                { "role": "model", "parts": [{ "text": "Hello!" }] },
                { "role": "user", "parts": [{ "text": "recommend a movie" }] },
                { "role": "model", "parts": [{ "text": "Try Arrival." }] },
                { "role": "user", "parts": [{ "text": "and for anime?" }] },
            ])
        );
        assert_eq!(body["systemInstruction"], json!({ "parts": [{ "text": "be nice" }] }));
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn schema_sets_json_mime_type() {
        let request =
            GenerateRequest::new("recommend").with_response_schema(recommendation_schema());
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn thinking_budget_only() {
        let request = GenerateRequest::new("advice").with_thinking_budget(4000);
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 4000);
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn response_text_joins_parts() {
        let raw = r##"{"candidates":[{"content":{"role":"model","parts":[{"text":"# Road"},{"text":"map"}]}}]}"##;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "# Roadmap");

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn quota_error_keeps_status_marker() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = error_from_response(429, body);
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "RESOURCE_EXHAUSTED: Quota exceeded for metric");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn non_json_error_body_is_kept() {
        let err = error_from_response(502, "Bad Gateway\n");
        assert_eq!(err.message, "Bad Gateway");
        assert!(!err.is_rate_limited());
        assert_eq!(error_from_response(500, "").message, "HTTP 500");
    }

    #[test]
    fn endpoint_uses_model_name() {
        let model = GeminiModel::new("key")
            .with_base_url("http://localhost:8080/v1beta/")
            .with_model("gemini-2.5-flash");
        assert_eq!(
            model.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
