//! PYTHON tool - evaluates one Python expression
//!
//! The expression runs in a fresh interpreter subprocess, so no state
//! survives between calls.

use super::{unknown_command, Args, CommandDescriptor, MissingArgument, Tool, ToolOutcome};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const RUN_TIMEOUT: Duration = Duration::from_secs(30);
/// The expression arrives as `argv[1]`, never as source text
const EVAL_PROGRAM: &str = "import sys; print(eval(sys.argv[1]))";

pub struct PythonTool {
    interpreter: String,
}

impl PythonTool {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Expression to evaluate, with one enclosing `print(...)` removed
    fn expression(script: &str) -> &str {
        let script = script.trim();
        match script
            .strip_prefix("print(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) if encloses(inner) => inner,
            _ => script,
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<String, String> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.args(["-c", EVAL_PROGRAM, Self::expression(expression)])
            .env("PYTHONUTF8", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| format!("failed to start {}: {e}", self.interpreter))?;

        let output = tokio::time::timeout(RUN_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| format!("a timeout after {RUN_TIMEOUT:?}"))?
            .map_err(|e| e.to_string())?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // The last traceback line carries the exception
            Err(stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("a non-zero exit status")
                .trim()
                .to_string())
        }
    }

    async fn run(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let expression = args.text(0, " ")?;
        Ok(match self.evaluate(&expression).await {
            Ok(result) => {
                ToolOutcome::succeeded(format!("The results of the line of Python is '{result}'"))
            }
            Err(reason) => {
                tracing::debug!(error = %reason, "Python evaluation failed");
                ToolOutcome::failed(format!("The line of Python did not run because of {reason}"))
            }
        })
    }
}

/// Whether the parentheses in `inner` balance without closing the outer call early
fn encloses(inner: &str) -> bool {
    let mut depth = 0usize;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        "PYTHON"
    }

    fn short_description(&self) -> String {
        "The Python interpreter can run single line Python programs".to_string()
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        vec![CommandDescriptor::new(
            "RUN",
            "Run a single line python script",
            &["Python script"],
        )]
    }

    fn examples(&self) -> [String; 2] {
        [
            "user: What is the sum of the first 10 numbers?\nassistant: %PYTHON RUN sum([i + 1 for i in range(10)])\nsystem: The results of the line of Python is '55'\nassistant: The sum of the first 10 numbers is 55".to_string(),
            "user: How many seconds are in a week?\nassistant: %PYTHON RUN 60 * 60 * 24 * 7\nsystem: The results of the line of Python is '604800'\nassistant: There are 604800 seconds in a week".to_string(),
        ]
    }

    async fn execute(&self, command: &str, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        match command {
            "RUN" => self.run(args).await,
            _ => Ok(unknown_command(self.name(), command)),
        }
    }
}
