//! Outcome signal shared by the dispatch protocol and the turn engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one dispatch or of the turn loop.
///
/// `Prompting` and `Finished` are the turn loop's own states. `Succeeded`
/// and `FailedReprompt` only ever come out of a tool invocation and are
/// consumed immediately; the loop never ends on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Prompting,
    Finished,
    Succeeded,
    FailedReprompt,
}

impl Status {
    pub fn is_finished(self) -> bool {
        matches!(self, Status::Finished)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Prompting => "PROMPTING",
            Status::Finished => "FINISHED",
            Status::Succeeded => "SUCCEEDED",
            Status::FailedReprompt => "FAILED_REPROMPT",
        };
        f.write_str(s)
    }
}
