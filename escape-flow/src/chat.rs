use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ErrorKind, Result};
use crate::models::{ChatRole, ChatTurn};
use crate::orchestrator::{Orchestrator, Surface};
use crate::prompt::CHAT_GREETING;

/// A user message that has been appended but not yet answered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTurn {
    pub message: String,
    /// Transcript as it stood before `message` was appended.
    pub history: Vec<ChatTurn>,
}

/// The model turn that closed a chat turn, and the failure behind it if the
/// text is an error message.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub turn: ChatTurn,
    pub error: Option<ErrorKind>,
}

/// One conversation: an append-only transcript seeded with a greeting.
///
/// Turns are never edited or removed. Alternation of roles is expected but
/// not enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    transcript: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: vec![ChatTurn::model(CHAT_GREETING)],
        }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.transcript.last()
    }

    /// Append the user's message right away and snapshot the history that
    /// goes to the provider alongside it.
    pub fn begin_turn(&mut self, message: impl Into<String>) -> PendingTurn {
        let message = message.into();
        let history = self.transcript.clone();
        self.transcript.push(ChatTurn::user(message.clone()));
        PendingTurn { message, history }
    }

    /// Append the model's side of the turn. Failures become a model turn
    /// carrying the user-facing message for their kind.
    pub fn finish_turn(&mut self, outcome: Result<String>) -> TurnReply {
        let (text, error) = match outcome {
            Ok(reply) => (reply, None),
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Chat turn failed");
                let kind = e.kind();
                (Surface::Chat.message(kind).to_string(), Some(kind))
            }
        };
        let turn = ChatTurn::new(ChatRole::Model, text);
        self.transcript.push(turn.clone());
        TurnReply { turn, error }
    }

    pub async fn send(
        &mut self,
        orchestrator: &Orchestrator,
        message: impl Into<String>,
    ) -> TurnReply {
        let pending = self.begin_turn(message);
        info!(session_id = %self.id, turns = self.transcript.len(), "Sending chat turn");
        let outcome = orchestrator.chat(&pending.message, &pending.history).await;
        self.finish_turn(outcome)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
