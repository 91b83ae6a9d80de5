//! In-band tool invocation protocol
//!
//! A reply whose first whitespace-delimited token starts with `%` is a tool
//! invocation: `%TOOL COMMAND arg1 arg2 ...`. There is no quoting; arguments
//! are the remaining tokens, so runs of whitespace inside free text collapse
//! to single spaces when a handler re-joins them.

use crate::tools::{ToolOutcome, ToolRegistry};

/// Marker that turns the first token into a tool directive
pub const TOOL_MARKER: char = '%';

/// Syntactic reading of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Ordinary conversational reply
    Plain,
    /// `%TOOL COMMAND args...`
    Invocation {
        /// First token as written, marker included
        directive: String,
        tool: String,
        /// Empty when the reply names only the tool
        command: String,
        args: Vec<String>,
    },
}

/// Parse a reply without consulting the registry
pub fn parse(reply: &str) -> Directive {
    let mut tokens = reply.split_whitespace();
    let Some(first) = tokens.next() else {
        return Directive::Plain;
    };
    let Some(tool) = first.strip_prefix(TOOL_MARKER) else {
        return Directive::Plain;
    };

    Directive::Invocation {
        directive: first.to_string(),
        tool: tool.to_string(),
        command: tokens.next().unwrap_or_default().to_string(),
        args: tokens.map(ToString::to_string).collect(),
    }
}

/// Result of routing one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No marker: the turn is over
    Plain,
    /// Marker with a tool name nobody registered
    UnknownTool { directive: String, message: String },
    /// A registered tool ran (or refused) the command
    Tool {
        tool: String,
        command: String,
        outcome: ToolOutcome,
    },
}

/// Parse a reply and, when it names a registered tool, invoke it
pub async fn dispatch(reply: &str, registry: &ToolRegistry) -> Dispatch {
    let Directive::Invocation {
        directive,
        tool,
        command,
        args,
    } = parse(reply)
    else {
        return Dispatch::Plain;
    };

    let Some(registered) = registry.get(&tool) else {
        tracing::info!(directive = %directive, "Unknown tool requested");
        let message = format!("{directive} is not an available tool.  {}", registry.catalog());
        return Dispatch::UnknownTool { directive, message };
    };

    let outcome = registered.invoke(&command, &args).await;
    tracing::info!(
        tool = %tool,
        command = %command,
        args = args.len(),
        status = %outcome.status,
        "Tool dispatched"
    );
    Dispatch::Tool {
        tool,
        command,
        outcome,
    }
}
