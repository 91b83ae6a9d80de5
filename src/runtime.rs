//! Runtime for executing conversations
//!
//! Drives the two seats in alternation. Each turn is a sequential loop of
//! prompt, mirror, dispatch and transition until the seat replies without a
//! tool directive.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{Conversation, RuntimeError};
