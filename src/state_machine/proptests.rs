//! Property-based tests for the turn state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::protocol::Dispatch;
use crate::tools::ToolOutcome;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Prompting),
        Just(Status::Finished),
        Just(Status::Succeeded),
        Just(Status::FailedReprompt),
    ]
}

fn arb_tool_dispatch() -> impl Strategy<Value = Dispatch> {
    ("[A-Z_]{1,12}", "[A-Z]{0,8}", arb_status(), "[a-zA-Z0-9 .']{0,60}").prop_map(
        |(tool, command, status, message)| Dispatch::Tool {
            tool,
            command,
            outcome: ToolOutcome { status, message },
        },
    )
}

fn arb_unknown_tool() -> impl Strategy<Value = Dispatch> {
    "%[A-Za-z]{0,10}".prop_map(|directive| Dispatch::UnknownTool {
        message: format!("{directive} is not an available tool.  catalog"),
        directive,
    })
}

fn arb_dispatch() -> impl Strategy<Value = Dispatch> {
    prop_oneof![
        Just(Dispatch::Plain),
        arb_tool_dispatch(),
        arb_unknown_tool(),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Only a plain reply ends the turn
    #[test]
    fn prop_finishes_iff_plain(dispatch in arb_dispatch()) {
        let step = transition(&dispatch);
        prop_assert_eq!(step.status.is_finished(), dispatch == Dispatch::Plain);
    }

    /// Every non-finishing step mirrors exactly one system message
    #[test]
    fn prop_reprompt_always_broadcasts(dispatch in arb_dispatch()) {
        let step = transition(&dispatch);
        prop_assert_eq!(step.status == Status::Prompting, step.broadcast.is_some());
        prop_assert!(!matches!(step.status, Status::Succeeded | Status::FailedReprompt));
    }

    /// The handler's message is kept verbatim at the start of the broadcast
    #[test]
    fn prop_tool_message_prefix(dispatch in arb_tool_dispatch()) {
        let Dispatch::Tool { outcome, .. } = &dispatch else {
            return Err(TestCaseError::fail("expected tool dispatch"));
        };
        let step = transition(&dispatch);
        let broadcast = step.broadcast.expect("tool dispatch broadcasts");
        prop_assert!(broadcast.content().starts_with(&outcome.message));

        let instructs_report = broadcast.content().ends_with("if you haven't completed their query.");
        prop_assert_eq!(instructs_report, outcome.status == Status::Succeeded);
    }

    /// Same input, same step
    #[test]
    fn prop_transition_is_deterministic(dispatch in arb_dispatch()) {
        prop_assert_eq!(transition(&dispatch), transition(&dispatch));
    }

    /// Backoff never shrinks between attempts
    #[test]
    fn prop_retry_delay_monotonic(attempt in 1u32..64) {
        prop_assert!(retry_delay(attempt + 1) >= retry_delay(attempt));
        prop_assert!(retry_delay(attempt) >= Duration::from_secs(1));
    }
}
