//! Pure turn transition function
//!
//! Maps the result of routing one reply through the dispatch protocol to the
//! next loop status. Tool outcomes always keep the loop prompting; only a
//! plain reply finishes the turn.

use super::Status;
use crate::conversation::Message;
use crate::protocol::Dispatch;
use std::time::Duration;

/// Prompt attempts per reply before a retryable error becomes fatal
pub const MAX_PROMPT_ATTEMPTS: u32 = 3;

const SUCCEEDED_SUFFIX: &str = ".  Now, please inform the user of the command you just ran or run another command if you haven't completed their query.";
const FAILED_SUFFIX: &str = ".  Please try again before reporting back to the user.";

/// Result of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnStep {
    pub status: Status,
    /// System message to append to both histories, if any
    pub broadcast: Option<Message>,
}

impl TurnStep {
    fn finished() -> Self {
        Self {
            status: Status::Finished,
            broadcast: None,
        }
    }

    fn reprompt(content: String) -> Self {
        Self {
            status: Status::Prompting,
            broadcast: Some(Message::system(content)),
        }
    }
}

/// Decide how the turn continues after one dispatch.
///
/// This function is pure: the same dispatch always yields the same step.
pub fn transition(dispatch: &Dispatch) -> TurnStep {
    match dispatch {
        Dispatch::Plain => TurnStep::finished(),
        Dispatch::UnknownTool { message, .. } => TurnStep::reprompt(message.clone()),
        Dispatch::Tool { outcome, .. } => match outcome.status {
            Status::Succeeded => TurnStep::reprompt(format!("{}{SUCCEEDED_SUFFIX}", outcome.message)),
            // A handler reporting anything but success is retried by the participant
            Status::FailedReprompt | Status::Prompting | Status::Finished => {
                TurnStep::reprompt(format!("{}{FAILED_SUFFIX}", outcome.message))
            }
        },
    }
}

/// Backoff before re-prompting after the given failed attempt: 1s, 2s, 4s
pub fn retry_delay(failed_attempt: u32) -> Duration {
    let exponent = failed_attempt.saturating_sub(1).min(6);
    Duration::from_secs(1 << exponent)
}
