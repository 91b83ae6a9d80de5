//! Conversation executor

use crate::conversation::{History, Message, Seat};
use crate::participant::{Participant, PromptError};
use crate::protocol::dispatch;
use crate::state_machine::{retry_delay, transition, MAX_PROMPT_ATTEMPTS};
use crate::system_prompt::build_preamble;
use crate::tools::ToolRegistry;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;

/// Errors that end a conversation
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{seat} failed to reply: {source}")]
    Prompt {
        seat: Seat,
        #[source]
        source: PromptError,
    },
}

impl RuntimeError {
    /// A human closed their input; the conversation ends normally
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            RuntimeError::Prompt {
                source: PromptError::Closed,
                ..
            }
        )
    }
}

/// Two participants, their histories, and the tools they share
pub struct Conversation {
    participants: [Arc<dyn Participant>; 2],
    histories: [History; 2],
    registry: ToolRegistry,
}

impl Conversation {
    /// Seed both histories with the same preamble
    pub fn new(
        first: Arc<dyn Participant>,
        second: Arc<dyn Participant>,
        registry: ToolRegistry,
    ) -> Self {
        let preamble = build_preamble(&registry);
        Self {
            participants: [first, second],
            histories: [History::seeded(preamble.clone()), History::seeded(preamble)],
            registry,
        }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn history(&self, seat: Seat) -> &History {
        &self.histories[seat.index()]
    }

    /// Own history sees the reply as `assistant`, the other one as `user`
    fn record_reply(&mut self, seat: Seat, reply: &str) {
        self.histories[seat.index()].push(Message::assistant(reply));
        self.histories[seat.other().index()].push(Message::user(reply));
    }

    fn broadcast(&mut self, message: &Message) {
        for history in &mut self.histories {
            history.push(message.clone());
        }
    }

    /// Prompt `seat` until it replies without a tool directive.
    ///
    /// Returns that final reply. There is no cap on tool round trips.
    pub async fn run_turn(&mut self, seat: Seat) -> Result<String, RuntimeError> {
        tracing::debug!(seat = %seat, "Turn started");
        let mut tool_calls = 0usize;
        loop {
            let reply = self.prompt_with_retry(seat).await?;
            self.record_reply(seat, &reply);

            let dispatch = dispatch(&reply, &self.registry).await;
            let step = transition(&dispatch);
            if let Some(message) = &step.broadcast {
                self.broadcast(message);
            }

            if step.status.is_finished() {
                tracing::info!(
                    seat = %seat,
                    tool_calls,
                    history_len = self.histories[seat.index()].len(),
                    "Turn finished"
                );
                return Ok(reply);
            }
            tool_calls += 1;
        }
    }

    /// Prompt once, retrying transient failures with backoff
    async fn prompt_with_retry(&self, seat: Seat) -> Result<String, RuntimeError> {
        let participant = &self.participants[seat.index()];
        let history = self.histories[seat.index()].messages();

        let mut attempt = 1;
        loop {
            match participant.prompt(history).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < MAX_PROMPT_ATTEMPTS => {
                    let delay = e.retry_after().unwrap_or_else(|| retry_delay(attempt));
                    tracing::warn!(
                        seat = %seat,
                        participant = participant.label(),
                        attempt,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Prompt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    tracing::error!(
                        seat = %seat,
                        participant = participant.label(),
                        attempt,
                        error = %source,
                        "Prompt failed"
                    );
                    return Err(RuntimeError::Prompt { seat, source });
                }
            }
        }
    }

    /// Run `rounds` rounds of participant 1 then participant 2
    #[allow(dead_code)] // Bounded variant of run(), used by tests
    pub async fn run_rounds(&mut self, rounds: usize) -> Result<(), RuntimeError> {
        for _ in 0..rounds {
            self.run_turn(Seat::First).await?;
            self.run_turn(Seat::Second).await?;
        }
        Ok(())
    }

    /// Alternate the seats until a participant fails
    pub async fn run(&mut self) -> Result<Infallible, RuntimeError> {
        tracing::info!(
            first = self.participants[0].label(),
            second = self.participants[1].label(),
            tools = ?self.registry.names(),
            "Conversation started"
        );
        loop {
            self.run_turn(Seat::First).await?;
            self.run_turn(Seat::Second).await?;
        }
    }
}
