use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::history::{ HistoryError, HistoryStore };
use crate::models::chat::{ Conversation, Turn };

pub struct MemoryHistoryStore {
    conversations: RwLock<HashMap<String, Conversation>>,
    max_turns: usize,
}

impl MemoryHistoryStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub async fn user_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn get(&self, user_id: &str) -> Result<Conversation, HistoryError> {
        let conversations = self.conversations.read().await;
        Ok(
            conversations
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| Conversation::new(user_id))
        )
    }

    async fn append(&self, user_id: &str, turn: Turn) -> Result<(), HistoryError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .entry(user_id.to_string())
            .or_insert_with(|| Conversation::new(user_id));
        debug!("History append: user={} role={}", user_id, turn.role.as_str());
        conversation.push(turn);
        conversation.truncate_front(self.max_turns);
        Ok(())
    }

    async fn replace(
        &self,
        user_id: &str,
        mut conversation: Conversation
    ) -> Result<(), HistoryError> {
        conversation.id = user_id.to_string();
        conversation.truncate_front(self.max_turns);
        debug!("History replace: user={} turns={}", user_id, conversation.len());
        self.conversations.write().await.insert(user_id.to_string(), conversation);
        Ok(())
    }
}
