use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    chat::ChatSession,
    error::{FlowError, Result},
};

/// Trait for storing and retrieving chat sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: ChatSession) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<ChatSession>>;
    async fn delete(&self, id: &str) -> Result<()>;

    /// Like `get`, but an unknown id is `FlowError::SessionNotFound`.
    async fn load(&self, id: &str) -> Result<ChatSession> {
        self.get(id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(id.to_string()))
    }
}

/// In-memory implementation of SessionStorage. Sessions are gone on restart.
#[derive(Clone, Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, ChatSession>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: ChatSession) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ChatSession>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

/// One async mutex per session id. Hold the guard across load, turn and
/// save so concurrent turns on a session run one after another.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(id.to_string()).or_default().clone();
        lock.lock_owned().await
    }
}
