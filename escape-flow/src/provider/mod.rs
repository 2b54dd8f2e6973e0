//! The seam between orchestration and whichever model API answers.
//!
//! [`Orchestrator`](crate::Orchestrator) only ever talks to a
//! [`GenerativeModel`]; production wires in [`GeminiModel`] (or `RigModel`
//! with the `rig` feature), tests wire in a scripted double.

pub mod gemini;
#[cfg(feature = "rig")]
pub mod rig_agent;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::models::ChatTurn;

pub use gemini::GeminiModel;
#[cfg(feature = "rig")]
pub use rig_agent::RigModel;

/// One logical call to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    /// The active turn.
    pub prompt: String,
    pub system_instruction: Option<String>,
    /// Earlier turns, oldest first. Sent in exactly this order.
    pub history: Vec<ChatTurn>,
    /// When set, the provider must answer with JSON matching this schema.
    pub response_schema: Option<Value>,
    pub thinking_budget: Option<u32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }
}

/// A text-generating model endpoint.
///
/// Returns the raw response text; an empty string means the provider answered
/// without content.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError>;
}
