//! Per-turn status machine
//!
//! Pure transitions: a dispatch outcome goes in, the next status and the
//! system message to mirror into both histories come out. The runtime
//! executes the result.

pub mod status;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use status::Status;
pub use transition::{retry_delay, transition, TurnStep, MAX_PROMPT_ATTEMPTS};
