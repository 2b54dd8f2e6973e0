pub mod cache;
pub mod chat;
pub mod error;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod storage;

// Re-export commonly used types
pub use cache::{AdviceCache, RecommendationCache, RecommendationKey, ResponseCache};
pub use chat::{ChatSession, PendingTurn, TurnReply};
pub use error::{ErrorKind, FlowError, ProviderError, Result};
pub use models::{ChatRole, ChatTurn, MediaKind, RecommendationFilter, RecommendationItem};
pub use notify::{LoginKind, LoginNotification, Notifier};
pub use orchestrator::{Orchestrator, Surface};
pub use provider::{GeminiModel, GenerateRequest, GenerativeModel};
#[cfg(feature = "rig")]
pub use provider::RigModel;
pub use retry::{Delay, RetryPolicy, TokioDelay, retry_with_backoff};
pub use storage::{InMemorySessionStorage, SessionLocks, SessionStorage};
