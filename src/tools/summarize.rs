//! Section-wise page summarization through a participant

use super::html::PageSection;
use crate::conversation::Message;
use crate::participant::{Participant, PromptError};

const SUMMARIZER_INSTRUCTIONS: &str = "You are a summarization model that summarizes parts of webpages that a user has asked about.  My next message will be the page snippet.  Please summarize it so that the user can better understand it, while keeping essential information including dates, names, and other information.  Do not preface your summary or mention that you are summarizing.";

/// History asking for a summary of one section body
pub fn section_prompt(body: &str) -> Vec<Message> {
    vec![
        Message::system(SUMMARIZER_INSTRUCTIONS),
        Message::system(format!("The snippet says {body}")),
    ]
}

/// Summarize every body section in one batch and join the page back
/// together, headings kept verbatim, one part per line.
pub async fn summarize_sections(
    summarizer: &dyn Participant,
    sections: Vec<PageSection>,
) -> Result<String, PromptError> {
    let prompts: Vec<Vec<Message>> = sections
        .iter()
        .filter_map(|section| match section {
            PageSection::Body(body) => Some(section_prompt(body)),
            PageSection::Heading(_) => None,
        })
        .collect();

    let summaries = if prompts.is_empty() {
        Vec::new()
    } else {
        summarizer.prompt_batch(&prompts).await?
    };
    tracing::debug!(
        summarizer = summarizer.label(),
        sections = prompts.len(),
        "Summarized page sections"
    );

    let mut summaries = summaries.into_iter();
    let parts: Vec<String> = sections
        .into_iter()
        .map(|section| match section {
            PageSection::Heading(heading) => heading,
            PageSection::Body(_) => summaries.next().unwrap_or_default(),
        })
        .collect();
    Ok(parts.join("\n"))
}
