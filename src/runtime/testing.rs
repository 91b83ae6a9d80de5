//! Mock implementations for testing
//!
//! These mocks enable conversation and tool tests without real I/O.

use crate::conversation::Message;
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::participant::{Participant, PromptError};
use crate::tools::{unknown_command, Args, CommandDescriptor, MissingArgument, Tool, ToolOutcome};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ============================================================================
// Scripted participant
// ============================================================================

/// Participant that replays queued replies and records every history it sees.
/// Once the queue is empty it reports closed input.
pub struct ScriptedParticipant {
    replies: Mutex<VecDeque<Result<String, PromptError>>>,
    histories: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedParticipant {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            histories: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error.into()));
    }

    pub fn recorded_histories(&self) -> Vec<Vec<Message>> {
        self.histories.lock().unwrap().clone()
    }
}

#[async_trait]
impl Participant for ScriptedParticipant {
    fn label(&self) -> &str {
        "scripted"
    }

    async fn prompt(&self, history: &[Message]) -> Result<String, PromptError> {
        self.histories.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(PromptError::Closed))
    }
}

// ============================================================================
// Mock LLM service
// ============================================================================

/// LLM service returning queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(LlmResponse {
            text: text.into(),
            ..LlmResponse::default()
        }));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::unknown("No more mock responses")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// In-memory tools
// ============================================================================

/// `%ECHO SAY text` repeats the text, `%ECHO SHOUT text` in upper case
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "ECHO"
    }

    fn short_description(&self) -> String {
        "Repeats text back".to_string()
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new("SAY", "Say the text", &["Text"]),
            CommandDescriptor::new("SHOUT", "Say the text loudly", &["Text"]),
        ]
    }

    fn examples(&self) -> [String; 2] {
        [
            "user: Say hi\nassistant: %ECHO SAY hi\nsystem: hi\nassistant: hi".to_string(),
            "user: Say hi loudly\nassistant: %ECHO SHOUT hi\nsystem: HI\nassistant: HI".to_string(),
        ]
    }

    async fn execute(&self, command: &str, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        match command {
            "SAY" => Ok(ToolOutcome::succeeded(args.text(0, " ")?)),
            "SHOUT" => Ok(ToolOutcome::succeeded(args.text(0, " ")?.to_uppercase())),
            _ => Ok(unknown_command(self.name(), command)),
        }
    }
}

/// Tool with configurable commands that only check their arity
pub struct StaticTool {
    name: String,
    commands: Vec<(String, Vec<String>)>,
}

impl StaticTool {
    /// Starts with a `GET` command taking no arguments
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commands: vec![("GET".to_string(), Vec::new())],
        }
    }

    pub fn with_command(mut self, name: &str, required_args: &[&str]) -> Self {
        self.commands.push((
            name.to_string(),
            required_args.iter().map(ToString::to_string).collect(),
        ));
        self
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn short_description(&self) -> String {
        format!("Static tool {}", self.name)
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        self.commands
            .iter()
            .map(|(name, args)| {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                CommandDescriptor::new(name, format!("Static command {name}"), &args)
            })
            .collect()
    }

    fn examples(&self) -> [String; 2] {
        [
            format!("assistant: %{} GET\nsystem: {} GET ok", self.name, self.name),
            format!("assistant: %{} HELP", self.name),
        ]
    }

    async fn execute(&self, command: &str, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let Some((_, required)) = self.commands.iter().find(|(name, _)| name == command) else {
            return Ok(unknown_command(&self.name, command));
        };
        for position in 0..required.len() {
            args.get(position)?;
        }
        Ok(ToolOutcome::succeeded(format!("{} {command} ok", self.name)))
    }
}

// ============================================================================
// Local HTTP server
// ============================================================================

/// Serve fixed pages on a loopback port and return the base URL.
///
/// Routes match the full request target, query included. `{base}` in a body
/// is replaced by the server's own base URL. Unknown targets get a 404.
pub async fn serve_pages(routes: Vec<(&str, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes: HashMap<String, String> = routes
        .into_iter()
        .map(|(target, body)| (target.to_string(), body.replace("{base}", &base)))
        .collect();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            respond(socket, &routes).await;
        }
    });
    base
}

async fn respond(mut socket: TcpStream, routes: &HashMap<String, String>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let target = request.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = match routes.get(target) {
        Some(body) => ("200 OK", body.as_str()),
        None => ("404 Not Found", "not found"),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
