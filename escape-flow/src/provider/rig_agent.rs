//! `rig-core` backed provider, for running against OpenRouter instead of
//! Gemini directly.

use async_trait::async_trait;
use rig::completion::{Chat, Message};
use rig::prelude::*;
use rig::providers::openrouter;
use tracing::debug;

use super::{GenerateRequest, GenerativeModel};
use crate::error::ProviderError;
use crate::models::{ChatRole, ChatTurn};

pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4.1-mini";

pub fn to_rig_message(turn: &ChatTurn) -> Message {
    match turn.role {
        ChatRole::User => Message::user(turn.text.clone()),
        ChatRole::Model => Message::assistant(turn.text.clone()),
    }
}

pub fn to_rig_messages(turns: &[ChatTurn]) -> Vec<Message> {
    turns.iter().map(to_rig_message).collect()
}

/// OpenRouter has no response-schema parameter, so a schema is folded into
/// the preamble.
pub fn build_preamble(request: &GenerateRequest) -> Option<String> {
    let schema_note = request.response_schema.as_ref().map(|schema| {
        format!(
            "Respond **only** with JSON matching this schema, with no surrounding prose:\n{schema}"
        )
    });

    match (request.system_instruction.as_deref(), schema_note) {
        (Some(system), Some(note)) => Some(format!("{system}\n\n{note}")),
        (Some(system), None) => Some(system.to_string()),
        (None, Some(note)) => Some(note),
        (None, None) => None,
    }
}

pub struct RigModel {
    client: openrouter::Client,
    model: String,
}

impl RigModel {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: DEFAULT_OPENROUTER_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl GenerativeModel for RigModel {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        let mut builder = self.client.agent(&self.model);
        if let Some(preamble) = build_preamble(&request) {
            builder = builder.preamble(&preamble);
        }
        let agent = builder.build();

        debug!(model = %self.model, history = request.history.len(), "Calling OpenRouter agent");

        // rig hides the HTTP status; the message still carries 429 markers.
        agent
            .chat(request.prompt.as_str(), to_rig_messages(&request.history))
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::recommendation_schema;

    #[test]
    fn converts_every_turn() {
        let turns = vec![ChatTurn::model("Hello"), ChatTurn::user("Hi")];
        assert_eq!(to_rig_messages(&turns).len(), 2);
    }

    #[test]
    fn preamble_combines_instruction_and_schema() {
        let request = GenerateRequest::new("go")
            .with_system_instruction("You are Escape Zone.")
            .with_response_schema(recommendation_schema());
        let preamble = build_preamble(&request).unwrap();
        assert!(preamble.starts_with("You are Escape Zone.\n\n"));
        assert!(preamble.contains("\"ratingIMDb\""));

        assert_eq!(build_preamble(&GenerateRequest::new("go")), None);
    }
}
