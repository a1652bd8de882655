mod memory;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::models::chat::{ Conversation, Turn };

pub use memory::MemoryHistoryStore;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history backend error: {0}")]
    Backend(String),
}

/// Per-user conversation storage. Each call is atomic on its own; callers
/// composing several calls get no isolation between them.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the stored conversation, or an empty one if the user is unknown.
    async fn get(&self, user_id: &str) -> Result<Conversation, HistoryError>;

    async fn append(&self, user_id: &str, turn: Turn) -> Result<(), HistoryError>;

    /// Overwrites whatever is stored for `user_id`. Last writer wins.
    async fn replace(
        &self,
        user_id: &str,
        conversation: Conversation
    ) -> Result<(), HistoryError>;
}

pub fn initialize_history_store(args: &Args) -> Arc<dyn HistoryStore> {
    if args.history_max_turns > 0 {
        info!("Chat history kept in memory, capped at {} turns per user", args.history_max_turns);
    } else {
        info!("Chat history kept in memory without a size cap");
    }
    Arc::new(MemoryHistoryStore::new(args.history_max_turns))
}
