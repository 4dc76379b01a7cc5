//! Conversation memory boundary and an in-process reference store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ReelError;
use crate::types::MemoryRecord;

/// Append-only, ordered conversation log keyed by (session, user).
///
/// Implementations must return records of one (session, user) pair in the
/// exact order they were appended.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Append one record to the end of the log.
    async fn append(&self, record: MemoryRecord) -> Result<(), ReelError>;

    /// Return at most `limit` of the most recent records, oldest first.
    async fn recent(
        &self,
        session_id: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, ReelError>;

    /// Remove every record of the (session, user) pair.
    async fn clear(&self, session_id: &str, user_id: &str) -> Result<(), ReelError>;
}

type LogKey = (String, String);

/// Process-local memory store. Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryConversationMemory {
    logs: RwLock<HashMap<LogKey, Vec<MemoryRecord>>>,
    max_records: usize,
}

impl Default for InMemoryConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS)
    }
}

/// Records retained per (session, user) before the oldest are dropped.
pub const DEFAULT_MAX_RECORDS: usize = 500;

impl InMemoryConversationMemory {
    pub fn new(max_records: usize) -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
            max_records: max_records.max(1),
        }
    }

    /// Every retained record of a (session, user) pair, oldest first.
    pub async fn records(&self, session_id: &str, user_id: &str) -> Vec<MemoryRecord> {
        self.logs
            .read()
            .await
            .get(&(session_id.to_string(), user_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversationMemory {
    async fn append(&self, record: MemoryRecord) -> Result<(), ReelError> {
        let key = (record.session_id.clone(), record.user_id.clone());
        let mut logs = self.logs.write().await;
        let log = logs.entry(key).or_default();
        log.push(record);
        if log.len() > self.max_records {
            let overflow = log.len() - self.max_records;
            log.drain(..overflow);
        }
        Ok(())
    }

    async fn recent(
        &self,
        session_id: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, ReelError> {
        let logs = self.logs.read().await;
        let Some(log) = logs.get(&(session_id.to_string(), user_id.to_string())) else {
            return Ok(Vec::new());
        };
        let start = log.len().saturating_sub(limit);
        Ok(log[start..].to_vec())
    }

    async fn clear(&self, session_id: &str, user_id: &str) -> Result<(), ReelError> {
        let removed = self
            .logs
            .write()
            .await
            .remove(&(session_id.to_string(), user_id.to_string()));
        debug!(
            session_id,
            user_id,
            removed = removed.map(|log| log.len()).unwrap_or(0),
            "conversation memory cleared"
        );
        Ok(())
    }
}
