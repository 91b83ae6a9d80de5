//! Tool capability contract and registry
//!
//! Tools expose named commands invoked in-band as `%TOOL COMMAND args...`.
//! The shared behavior every tool gets (HELP synthesis, unknown-command and
//! arity-fault mapping) lives in free functions over a `ToolDescriptor`, not
//! in the tools themselves.

mod file_manager;
mod google;
mod html;
mod python;
mod summarize;
mod wiki;

pub use file_manager::FileManagerTool;
pub use google::GoogleTool;
pub use python::PythonTool;
pub use wiki::WikipediaTool;

use crate::participant::Participant;
use crate::protocol::TOOL_MARKER;
use crate::state_machine::Status;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Name of the introspection command every tool answers
pub const HELP_COMMAND: &str = "HELP";

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub status: Status,
    pub message: String,
}

impl ToolOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            status: Status::Succeeded,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::FailedReprompt,
            message: message.into(),
        }
    }
}

/// A handler read an argument position that was not supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("missing argument at position {position}")]
pub struct MissingArgument {
    pub position: usize,
}

/// Positional arguments of one command invocation
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    tokens: &'a [String],
}

impl<'a> Args<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Self { tokens }
    }

    /// Argument at `position`, or an arity fault
    pub fn get(&self, position: usize) -> Result<&'a str, MissingArgument> {
        self.tokens
            .get(position)
            .map(String::as_str)
            .ok_or(MissingArgument { position })
    }

    /// Arguments from `position` on, joined by `separator`. Empty when none remain.
    pub fn rest(&self, position: usize, separator: &str) -> String {
        self.tokens
            .get(position..)
            .map(|rest| rest.join(separator))
            .unwrap_or_default()
    }

    /// Like `rest`, but at least one argument must be present at `position`
    pub fn text(&self, position: usize, separator: &str) -> Result<String, MissingArgument> {
        self.get(position)?;
        Ok(self.rest(position, separator))
    }
}

/// One command a tool exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    /// Human-readable argument names, only used in arity messages
    pub required_args: Vec<String>,
}

impl CommandDescriptor {
    pub fn new(name: &str, description: impl Into<String>, required_args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.into(),
            required_args: required_args.iter().map(ToString::to_string).collect(),
        }
    }

    fn help(tool_name: &str) -> Self {
        Self::new(
            HELP_COMMAND,
            format!("Get help using the {tool_name} tool"),
            &[],
        )
    }
}

/// Declarative snapshot of a tool, `HELP` included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub short_description: String,
    pub commands: Vec<CommandDescriptor>,
    pub examples: [String; 2],
}

impl ToolDescriptor {
    pub fn of(tool: &dyn Tool) -> Self {
        let name = tool.name().to_string();
        let mut commands = tool.commands();
        commands.push(CommandDescriptor::help(&name));
        Self {
            short_description: tool.short_description(),
            commands,
            examples: tool.examples(),
            name,
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|c| c.name == name)
    }
}

/// Trait for tools that participants can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, used after the `%` marker
    fn name(&self) -> &str;

    /// One-line description for the catalog
    fn short_description(&self) -> String;

    /// Declared commands in order. `HELP` is appended by `ToolDescriptor`.
    fn commands(&self) -> Vec<CommandDescriptor>;

    /// Two worked transcripts shown by `HELP`
    fn examples(&self) -> [String; 2];

    /// Run a declared command.
    ///
    /// Handlers read arguments through `Args` and propagate `MissingArgument`
    /// with `?`; domain failures must be returned as `ToolOutcome::failed`.
    async fn execute(&self, command: &str, args: Args<'_>) -> Result<ToolOutcome, MissingArgument>;
}

/// Shared `invoke` behavior: HELP, routing to a declared command, and
/// mapping of unknown commands and arity faults.
pub async fn invoke(
    tool: &dyn Tool,
    descriptor: &ToolDescriptor,
    command: &str,
    args: &[String],
) -> ToolOutcome {
    if command == HELP_COMMAND {
        return ToolOutcome::succeeded(help_message(descriptor));
    }

    let Some(declared) = descriptor.command(command) else {
        return unknown_command(&descriptor.name, command);
    };

    match tool.execute(command, Args::new(args)).await {
        Ok(outcome) => outcome,
        Err(missing) => {
            tracing::debug!(
                tool = %descriptor.name,
                command,
                position = missing.position,
                "Arity fault"
            );
            arity_fault(&descriptor.name, declared)
        }
    }
}

/// HELP text for a tool
pub fn help_message(descriptor: &ToolDescriptor) -> String {
    let commands = descriptor
        .commands
        .iter()
        .map(|c| format!("{}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n");
    let [first, second] = &descriptor.examples;
    format!(
        "Information on using the {name} tool:\n\nAvailable commands:\n{commands}\n\nExamples using the {name} tool:\n\n{first}\n\n{second}",
        name = descriptor.name,
    )
}

/// Outcome for a command the tool does not declare
pub fn unknown_command(tool_name: &str, command: &str) -> ToolOutcome {
    ToolOutcome::failed(format!(
        "{TOOL_MARKER}{tool_name} {command} is not a valid {tool_name} command.  To view all of the commands, run {TOOL_MARKER}{tool_name} {HELP_COMMAND}"
    ))
}

fn arity_fault(tool_name: &str, declared: &CommandDescriptor) -> ToolOutcome {
    ToolOutcome::failed(format!(
        "Not enough arguments were included to run {TOOL_MARKER}{tool_name} {command}.  The {command} command requires {args} as arguments, separated by spaces",
        command = declared.name,
        args = declared.required_args.join(", "),
    ))
}

/// Registry construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool {0} is registered more than once")]
    DuplicateTool(String),
    #[error("tool {tool} declares command {command} more than once")]
    DuplicateCommand { tool: String, command: String },
}

/// A registered tool with its descriptor
pub struct RegisteredTool {
    tool: Arc<dyn Tool>,
    descriptor: ToolDescriptor,
}

impl RegisteredTool {
    #[allow(dead_code)] // Useful for tests
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub async fn invoke(&self, command: &str, args: &[String]) -> ToolOutcome {
        invoke(self.tool.as_ref(), &self.descriptor, command, args).await
    }
}

/// Fixed, ordered set of tools shared by both participants
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Build a registry, rejecting ambiguous names
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut registered: Vec<RegisteredTool> = Vec::with_capacity(tools.len());
        for tool in tools {
            let descriptor = ToolDescriptor::of(tool.as_ref());
            if registered.iter().any(|r| r.descriptor.name == descriptor.name) {
                return Err(RegistryError::DuplicateTool(descriptor.name));
            }
            for (i, command) in descriptor.commands.iter().enumerate() {
                if descriptor.commands[..i].iter().any(|c| c.name == command.name) {
                    return Err(RegistryError::DuplicateCommand {
                        tool: descriptor.name.clone(),
                        command: command.name.clone(),
                    });
                }
            }
            registered.push(RegisteredTool { tool, descriptor });
        }
        Ok(Self { tools: registered })
    }

    /// Standard tool set of the binary
    pub fn standard(
        working_dir: PathBuf,
        python: String,
        summarizer: Option<Arc<dyn Participant>>,
    ) -> Result<Self, RegistryError> {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(FileManagerTool::new(working_dir)),
            Arc::new(PythonTool::new(python)),
            Arc::new(WikipediaTool::new(summarizer.clone())),
            Arc::new(GoogleTool::new(summarizer)),
        ];
        Self::new(tools)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.descriptor.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.descriptor.name.as_str()).collect()
    }

    /// Catalog of every tool and command, in registration then declaration order
    pub fn catalog(&self) -> String {
        let mut catalog = String::from("The commands available to you are:\n");
        for tool in &self.tools {
            let d = &tool.descriptor;
            let _ = writeln!(catalog, " - {TOOL_MARKER}{}: {}", d.name, d.short_description);
            for command in &d.commands {
                let _ = writeln!(
                    catalog,
                    "    - {TOOL_MARKER}{} {}: {}",
                    d.name, command.name, command.description
                );
            }
        }
        catalog
    }
}
