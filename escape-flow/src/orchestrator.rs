use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{AdviceCache, RecommendationCache, RecommendationKey};
use crate::error::{ErrorKind, Result};
use crate::models::{ChatTurn, RecommendationFilter, RecommendationItem};
use crate::prompt::{
    ADVICE_THINKING_BUDGET, CHAT_SYSTEM_INSTRUCTION, advice_prompt, recommendation_prompt,
    recommendation_schema,
};
use crate::provider::{GenerateRequest, GenerativeModel};
use crate::retry::{Delay, RetryPolicy, TokioDelay, retry_with_backoff};

pub const ADVICE_EMPTY_FALLBACK: &str = "Sorry, I couldn't generate advice at this time.";
pub const CHAT_EMPTY_FALLBACK: &str = "I'm having trouble connecting right now.";

/// Which view a failure is being reported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Recommendations,
    Advice,
    Chat,
}

impl Surface {
    /// User-facing text for a failure of `kind` on this surface.
    pub fn message(self, kind: ErrorKind) -> &'static str {
        match (self, kind) {
            (Surface::Recommendations, ErrorKind::RateLimited) => {
                "AI Quota Exceeded. Please try again in a few minutes."
            }
            (Surface::Recommendations, ErrorKind::Generic) => {
                "Failed to fetch recommendations. Please check your connection."
            }
            (Surface::Advice, ErrorKind::RateLimited) => {
                "AI Quota Exceeded. The service is currently at its limit. Please try again in a few minutes."
            }
            (Surface::Advice, ErrorKind::Generic) => {
                "Failed to load advice. Please check your connection and try again."
            }
            (Surface::Chat, ErrorKind::RateLimited) => {
                "AI Quota Exceeded. I'm currently at my limit. Please try again in a few minutes."
            }
            (Surface::Chat, ErrorKind::Generic) => CHAT_EMPTY_FALLBACK,
        }
    }
}

/// Strip a markdown code fence the model sometimes wraps JSON in.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse the structured recommendation payload.
///
/// Malformed JSON and JSON that is missing required fields both come back as
/// `None`; callers cannot tell them apart.
pub fn parse_recommendations(raw: &str) -> Option<Vec<RecommendationItem>> {
    let cleaned = strip_code_fence(raw);
    let cleaned = if cleaned.is_empty() { "[]" } else { cleaned };
    match serde_json::from_str::<Vec<RecommendationItem>>(cleaned) {
        Ok(items) => Some(items),
        Err(e) => {
            warn!("Failed to parse recommendations: {}", e);
            None
        }
    }
}

/// Entry points for recommendations, advice and chat.
///
/// Holds the injected model, the retry policy and the two response caches.
/// Cloning shares the caches.
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn GenerativeModel>,
    delay: Arc<dyn Delay>,
    retry: RetryPolicy,
    recommendations: RecommendationCache,
    advice: AdviceCache,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            delay: Arc::new(TokioDelay),
            retry: RetryPolicy::default(),
            recommendations: RecommendationCache::new(),
            advice: AdviceCache::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn recommendation_cache(&self) -> &RecommendationCache {
        &self.recommendations
    }

    pub fn advice_cache(&self) -> &AdviceCache {
        &self.advice
    }

    async fn call(&self, request: GenerateRequest) -> Result<String> {
        let text = retry_with_backoff(self.retry, self.delay.as_ref(), || {
            self.model.generate(request.clone())
        })
        .await?;
        Ok(text)
    }

    /// Recommendations in provider order. An unparseable payload yields an
    /// empty list and is not cached; transport failures propagate.
    pub async fn recommendations(
        &self,
        filter: &RecommendationFilter,
    ) -> Result<Arc<Vec<RecommendationItem>>> {
        let key = RecommendationKey::from(filter);
        if let Some(cached) = self.recommendations.get(&key) {
            debug!(category = %filter.category, "Recommendation cache hit");
            return Ok(cached);
        }

        let prompt = recommendation_prompt(filter);
        info!(category = %filter.category, "Requesting recommendations");
        let request = GenerateRequest::new(prompt).with_response_schema(recommendation_schema());
        let raw = self.call(request).await?;

        match parse_recommendations(&raw) {
            Some(items) => {
                let items = Arc::new(items);
                info!(count = items.len(), "Recommendations received");
                self.recommendations.insert(key, items.clone());
                Ok(items)
            }
            None => Ok(Arc::new(Vec::new())),
        }
    }

    /// Markdown roadmap for `topic`, cached by topic title.
    pub async fn advice(&self, topic: &str) -> Result<String> {
        let key = topic.to_string();
        if let Some(cached) = self.advice.get(&key) {
            debug!(topic, "Advice cache hit");
            return Ok(cached);
        }

        info!(topic, "Requesting advice");
        let request =
            GenerateRequest::new(advice_prompt(topic)).with_thinking_budget(ADVICE_THINKING_BUDGET);
        let text = self.call(request).await?;

        if text.trim().is_empty() {
            warn!(topic, "Provider returned empty advice");
            return Ok(ADVICE_EMPTY_FALLBACK.to_string());
        }
        self.advice.insert(key, text.clone());
        Ok(text)
    }

    /// One chat turn. `history` is replayed verbatim before `message`; chat is
    /// never cached.
    pub async fn chat(&self, message: &str, history: &[ChatTurn]) -> Result<String> {
        let request = GenerateRequest::new(message)
            .with_system_instruction(CHAT_SYSTEM_INSTRUCTION)
            .with_history(history.to_vec());
        let text = self.call(request).await?;

        if text.trim().is_empty() {
            return Ok(CHAT_EMPTY_FALLBACK.to_string());
        }
        Ok(text)
    }

    /// Like [`recommendations`](Self::recommendations) but never fails: errors
    /// come back as an empty list plus the user-facing message.
    pub async fn recommendations_or_message(
        &self,
        filter: &RecommendationFilter,
    ) -> (Arc<Vec<RecommendationItem>>, Option<(ErrorKind, &'static str)>) {
        match self.recommendations(filter).await {
            Ok(items) => (items, None),
            Err(e) => {
                warn!(error = %e, "Error fetching recommendations");
                let kind = e.kind();
                (
                    Arc::new(Vec::new()),
                    Some((kind, Surface::Recommendations.message(kind))),
                )
            }
        }
    }

    /// Like [`advice`](Self::advice) but failures resolve to the advice
    /// surface's message.
    pub async fn advice_or_message(&self, topic: &str) -> (String, Option<ErrorKind>) {
        match self.advice(topic).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(topic, error = %e, "Error fetching advice");
                let kind = e.kind();
                (Surface::Advice.message(kind).to_string(), Some(kind))
            }
        }
    }
}
