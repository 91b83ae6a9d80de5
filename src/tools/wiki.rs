//! WIKI tool - reads Wikipedia articles

use super::html::{extract_sections, extract_text, join_path, PageFetcher};
use super::summarize::summarize_sections;
use super::{unknown_command, Args, CommandDescriptor, MissingArgument, Tool, ToolOutcome};
use crate::participant::Participant;
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";
const ARTICLE_CONTAINER: &str = "div.mw-page-container-inner";
const SECTION_HEADING: &str = "h2";

pub struct WikipediaTool {
    fetcher: PageFetcher,
    base_url: String,
    summarizer: Option<Arc<dyn Participant>>,
}

impl WikipediaTool {
    pub fn new(summarizer: Option<Arc<dyn Participant>>) -> Self {
        Self {
            fetcher: PageFetcher::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            summarizer,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn read_article(&self, topic: &str) -> Result<String, String> {
        let url = join_path(&self.base_url, &["wiki", topic]).map_err(|e| e.to_string())?;
        let html = self.fetcher.fetch(url.as_str()).await.map_err(|e| e.to_string())?;

        match &self.summarizer {
            None => extract_text(&html, ARTICLE_CONTAINER).map_err(|e| e.to_string()),
            Some(summarizer) => {
                let sections = extract_sections(&html, ARTICLE_CONTAINER, Some(SECTION_HEADING))
                    .map_err(|e| e.to_string())?;
                summarize_sections(summarizer.as_ref(), sections)
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }

    async fn get(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let topic = args.text(0, "_")?;
        Ok(match self.read_article(&topic).await {
            Ok(page) => ToolOutcome::succeeded(format!("The wikipedia page for {topic} says '{page}'")),
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "Wikipedia fetch failed");
                ToolOutcome::failed(format!("The Wikipedia page was not returned because of {e}"))
            }
        })
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "WIKI"
    }

    fn short_description(&self) -> String {
        "Read an article from Wikipedia on millions of topics.  Good for getting factual information on widely-known topics".to_string()
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        vec![CommandDescriptor::new(
            "GET",
            "Download and read a wikipedia article",
            &["Article topic"],
        )]
    }

    fn examples(&self) -> [String; 2] {
        [
            "user: When did the Roman Empire collapse?\nassistant: %WIKI GET Fall of the Western Roman Empire\nsystem: The wikipedia page for Fall_of_the_Western_Roman_Empire says [WIKIPEDIA PAGE]\nassistant: The Roman Empire fell in 476 AD".to_string(),
            "user: What is Tom Cruise's birthday?\nassistant: %WIKI GET Tom Cruise\nsystem: The wikipedia page for Tom_Cruise says [WIKIPEDIA PAGE]\nassistant: Tom Cruise's birthday is July 3rd".to_string(),
        ]
    }

    async fn execute(&self, command: &str, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        match command {
            "GET" => self.get(args).await,
            _ => Ok(unknown_command(self.name(), command)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::{serve_pages, ScriptedParticipant};
    use crate::state_machine::Status;
    use crate::tools::ToolRegistry;

    const ARTICLE: &str = r#"<html><body><div class="mw-page-container-inner">
        <p>Rust is a language.</p><h2>History</h2><p>Started in 2006.</p>
        </div></body></html>"#;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_get_joins_topic_with_underscores() {
        let base = serve_pages(vec![("/wiki/Rust_programming_language", ARTICLE.to_string())]).await;
        let tool = WikipediaTool::new(None).with_base_url(base);
        let registry = ToolRegistry::new(vec![Arc::new(tool)]).unwrap();

        let outcome = registry
            .get("WIKI")
            .unwrap()
            .invoke("GET", &args(&["Rust", "programming", "language"]))
            .await;
        assert_eq!(outcome.status, Status::Succeeded);
        assert!(outcome
            .message
            .starts_with("The wikipedia page for Rust_programming_language says '"));
        assert!(outcome.message.contains("Started in 2006."));
    }

    #[tokio::test]
    async fn test_get_with_summarizer() {
        let base = serve_pages(vec![("/wiki/Rust", ARTICLE.to_string())]).await;
        let summarizer = Arc::new(ScriptedParticipant::new(["A language.", "Began 2006."]));
        let tool = WikipediaTool::new(Some(summarizer.clone() as Arc<dyn Participant>)).with_base_url(base);

        let outcome = tool.get(Args::new(&args(&["Rust"]))).await.unwrap();
        assert_eq!(
            outcome,
            ToolOutcome::succeeded("The wikipedia page for Rust says 'A language.\nHistory\nBegan 2006.'")
        );
        assert_eq!(summarizer.recorded_histories().len(), 2);
    }

    #[tokio::test]
    async fn test_topic_is_percent_encoded() {
        let base = serve_pages(vec![("/wiki/C%23_(programming_language)", ARTICLE.to_string())]).await;
        let tool = WikipediaTool::new(None).with_base_url(base);

        let outcome = tool
            .get(Args::new(&args(&["C#", "(programming", "language)"])))
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::Succeeded);
        assert!(outcome
            .message
            .starts_with("The wikipedia page for C#_(programming_language) says '"));
    }

    #[tokio::test]
    async fn test_missing_page_fails_with_reason() {
        let base = serve_pages(vec![]).await;
        let tool = WikipediaTool::new(None).with_base_url(base);
        let outcome = tool.get(Args::new(&args(&["Nothing"]))).await.unwrap();
        assert_eq!(outcome.status, Status::FailedReprompt);
        assert!(outcome
            .message
            .starts_with("The Wikipedia page was not returned because of "));
    }

    #[tokio::test]
    async fn test_get_requires_topic() {
        let tool = WikipediaTool::new(None);
        assert_eq!(tool.get(Args::new(&[])).await, Err(MissingArgument { position: 0 }));
    }
}
