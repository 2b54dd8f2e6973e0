use escape_flow::{ChatTurn, ErrorKind, RecommendationItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub items: Vec<RecommendationItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub topic: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatSessionResponse {
    pub session_id: String,
    pub transcript: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReplyResponse {
    pub session_id: String,
    pub reply: ChatTurn,
    pub transcript: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub success: bool,
    pub message: String,
}
