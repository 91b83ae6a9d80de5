//! Conversation participants
//!
//! A participant turns a role-tagged history into one reply. Both seats of a
//! conversation, and the web tools' summarizer, are participants.

mod console;
mod model;

pub use console::{stdin_input, ConsoleInput, ConsoleParticipant};
pub use model::ModelParticipant;

use crate::conversation::Message;
use crate::llm::LlmError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Why a participant could not produce a reply
#[derive(Debug, Error)]
pub enum PromptError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    /// The human closed standard input
    #[error("participant input closed")]
    Closed,
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl PromptError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PromptError::Llm(e) if e.kind.is_retryable())
    }

    /// Server-provided delay before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PromptError::Llm(e) => e.retry_after,
            PromptError::Closed | PromptError::Io(_) => None,
        }
    }
}

/// Anything that can reply to a history
#[async_trait]
pub trait Participant: Send + Sync {
    /// Short name used in logs
    fn label(&self) -> &str;

    /// Produce one reply to `history`
    async fn prompt(&self, history: &[Message]) -> Result<String, PromptError>;

    /// One reply per history, in order
    async fn prompt_batch(&self, histories: &[Vec<Message>]) -> Result<Vec<String>, PromptError> {
        let mut replies = Vec::with_capacity(histories.len());
        for history in histories {
            replies.push(self.prompt(history).await?);
        }
        Ok(replies)
    }
}
