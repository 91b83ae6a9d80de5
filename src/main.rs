//! tandem - two participants in one conversation, sharing in-band tools
//!
//! Each seat is a human on the console or a language model. Replies of the
//! form `%TOOL COMMAND args` run a tool and feed its result back to both
//! seats as a system message.

mod config;
mod conversation;
mod llm;
mod participant;
mod protocol;
mod runtime;
mod state_machine;
mod system_prompt;
mod tools;

use config::{AppConfig, ConfigError, ParticipantKind};
use llm::LlmConfig;
use participant::{stdin_input, ConsoleInput, ConsoleParticipant, ModelParticipant, Participant};
use runtime::Conversation;
use std::sync::Arc;
use tokio::io::{BufReader, Stdin};
use tools::ToolRegistry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the console seat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Both console seats read through the same buffered stdin
    let stdin = stdin_input();
    let first = build_participant(config.participants[0], &config.llm, &stdin)?;
    let second = build_participant(config.participants[1], &config.llm, &stdin)?;
    let summarizer = if config.summarize {
        Some(build_participant(ParticipantKind::Model, &config.llm, &stdin)?)
    } else {
        None
    };

    tracing::info!(
        working_dir = %config.working_dir.display(),
        python = %config.python,
        summarize = config.summarize,
        "Starting conversation"
    );
    let registry = ToolRegistry::standard(config.working_dir, config.python, summarizer)?;
    let mut conversation = Conversation::new(first, second, registry);

    match conversation.run().await {
        Ok(never) => match never {},
        Err(e) if e.is_closed() => {
            tracing::info!(reason = %e, "Conversation ended");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn build_participant(
    kind: ParticipantKind,
    llm: &LlmConfig,
    stdin: &ConsoleInput<BufReader<Stdin>>,
) -> Result<Arc<dyn Participant>, ConfigError> {
    Ok(match kind {
        ParticipantKind::Console => Arc::new(ConsoleParticipant::stdio(stdin)),
        ParticipantKind::Model => Arc::new(ModelParticipant::new(llm.build_service()?, llm.sampling)),
    })
}
