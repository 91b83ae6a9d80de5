//! Human participant on a terminal
//!
//! Roles are rendered from the human's point of view: their own replies are
//! `assistant` messages in their history, the other seat's replies are `user`.

use super::{Participant, PromptError};
use crate::conversation::{Message, Role};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;

const INPUT_PROMPT: &str = "> ";

/// Render one message as a console line, newline included
pub fn render_message(message: &Message) -> String {
    match message.role() {
        Role::Assistant => format!(" > {}\n", message.content()),
        Role::User => format!("Assistant: {}\n", message.content()),
        Role::System => format!("System: {}\n", message.content()),
    }
}

/// Render every message in order
pub fn render_history(messages: &[Message]) -> String {
    messages.iter().map(render_message).collect()
}

/// Line reader shared by every console seat of one terminal.
///
/// A buffered reader pulls more than one line at a time, so two seats on the
/// same terminal must read through one buffer.
pub type ConsoleInput<R> = Arc<Mutex<R>>;

/// Buffered standard input for the console seats
pub fn stdin_input() -> ConsoleInput<BufReader<Stdin>> {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin())))
}

struct ConsoleOutput<W> {
    writer: W,
    /// Messages of the history already printed
    shown: usize,
}

/// Participant reading replies line by line
pub struct ConsoleParticipant<R, W> {
    input: ConsoleInput<R>,
    output: Mutex<ConsoleOutput<W>>,
}

impl ConsoleParticipant<BufReader<Stdin>, Stdout> {
    pub fn stdio(input: &ConsoleInput<BufReader<Stdin>>) -> Self {
        Self::with_input(input.clone(), tokio::io::stdout())
    }
}

impl<R, W> ConsoleParticipant<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    #[cfg(test)]
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_input(Arc::new(Mutex::new(reader)), writer)
    }

    pub fn with_input(input: ConsoleInput<R>, writer: W) -> Self {
        Self {
            input,
            output: Mutex::new(ConsoleOutput { writer, shown: 0 }),
        }
    }

    #[cfg(test)]
    fn into_writer(self) -> W {
        self.output.into_inner().writer
    }

    async fn ask(&self, output: &mut ConsoleOutput<W>, rendered: &str) -> Result<String, PromptError> {
        output.writer.write_all(rendered.as_bytes()).await?;
        output.writer.write_all(INPUT_PROMPT.as_bytes()).await?;
        output.writer.flush().await?;

        let mut line = String::new();
        if self.input.lock().await.read_line(&mut line).await? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

#[async_trait]
impl<R, W> Participant for ConsoleParticipant<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn label(&self) -> &str {
        "console"
    }

    async fn prompt(&self, history: &[Message]) -> Result<String, PromptError> {
        let mut output = self.output.lock().await;
        let unseen = history.get(output.shown..).unwrap_or(history);
        let rendered = render_history(unseen);
        let reply = self.ask(&mut output, &rendered).await?;
        // The reply itself is appended by the conversation, so it counts as shown
        output.shown = history.len() + 1;
        Ok(reply)
    }

    async fn prompt_batch(&self, histories: &[Vec<Message>]) -> Result<Vec<String>, PromptError> {
        let mut output = self.output.lock().await;
        let mut replies = Vec::with_capacity(histories.len());
        for history in histories {
            replies.push(self.ask(&mut output, &render_history(history)).await?);
        }
        Ok(replies)
    }
}
