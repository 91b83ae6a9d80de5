//! GOOGLE tool - web and scholar search with link following
//!
//! The links of the last search are session state: `CLICK n` follows the
//! n-th one (1-based) until the next search replaces them.

use super::html::{extract_scholar_results, extract_search_links, extract_sections, extract_text, PageFetcher};
use super::summarize::summarize_sections;
use super::{unknown_command, Args, CommandDescriptor, MissingArgument, Tool, ToolOutcome};
use crate::participant::Participant;
use async_trait::async_trait;
use std::fmt::Write;
use std::sync::{Arc, Mutex, PoisonError};

const SEARCH_URL: &str = "https://google.com/search";
const SCHOLAR_URL: &str = "https://scholar.google.com/scholar";
const CLICK_HINT: &str = "You can call %GOOGLE CLICK [LINK #] to click on a page";

pub struct GoogleTool {
    fetcher: PageFetcher,
    search_url: String,
    scholar_url: String,
    summarizer: Option<Arc<dyn Participant>>,
    links: Mutex<Vec<String>>,
}

impl GoogleTool {
    pub fn new(summarizer: Option<Arc<dyn Participant>>) -> Self {
        Self {
            fetcher: PageFetcher::default(),
            search_url: SEARCH_URL.to_string(),
            scholar_url: SCHOLAR_URL.to_string(),
            summarizer,
            links: Mutex::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.search_url = format!("{base_url}/search");
        self.scholar_url = format!("{base_url}/scholar");
        self
    }

    fn replace_links(&self, links: Vec<String>) {
        *self.links.lock().unwrap_or_else(PoisonError::into_inner) = links;
    }

    fn link(&self, number: &str) -> Option<String> {
        let index = number.trim().parse::<usize>().ok()?.checked_sub(1)?;
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    async fn search(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let query = args.text(0, "_")?;
        let html = match self.fetcher.fetch_query(&self.search_url, &query).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Google search failed");
                return Ok(ToolOutcome::failed(format!(
                    "The Google Search page was not returned because of {e}"
                )));
            }
        };

        let results = extract_search_links(&html);
        let mut listing = String::new();
        for (i, link) in results.iter().enumerate() {
            let _ = writeln!(listing, "LINK {}: {} (from {})", i + 1, link.title, link.site);
        }
        self.replace_links(results.into_iter().map(|link| link.url).collect());

        Ok(ToolOutcome::succeeded(format!(
            "The Google Search page for {query} says '{listing}'.  {CLICK_HINT}"
        )))
    }

    async fn scholar(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let query = args.text(0, "_")?;
        let html = match self.fetcher.fetch_query(&self.scholar_url, &query).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Google Scholar search failed");
                return Ok(ToolOutcome::failed(format!(
                    "The Google Scholar page was not returned because of {e}"
                )));
            }
        };

        let results = extract_scholar_results(&html);
        let mut listing = String::new();
        for (i, paper) in results.iter().enumerate() {
            let _ = write!(listing, "LINK #{}: {}\n{}\n\n", i + 1, paper.title, paper.description);
        }
        self.replace_links(results.into_iter().map(|paper| paper.url).collect());

        Ok(ToolOutcome::succeeded(format!(
            "The Google Scholar page for {query} says '{listing}'.  {CLICK_HINT}"
        )))
    }

    async fn read_page(&self, url: &str) -> Result<String, String> {
        let html = self.fetcher.fetch(url).await.map_err(|e| e.to_string())?;
        match &self.summarizer {
            None => extract_text(&html, "body").map_err(|e| e.to_string()),
            Some(summarizer) => {
                let sections = extract_sections(&html, "body", None).map_err(|e| e.to_string())?;
                summarize_sections(summarizer.as_ref(), sections)
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }

    async fn click(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let Some(url) = self.link(args.get(0)?) else {
            return Ok(ToolOutcome::failed(
                "The page was not returned because that was not a valid link",
            ));
        };

        Ok(match self.read_page(&url).await {
            Ok(page) => ToolOutcome::succeeded(format!("The page at {url} says '{page}'.")),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Following link failed");
                ToolOutcome::failed(format!("The page was not returned because of {e}"))
            }
        })
    }
}

#[async_trait]
impl Tool for GoogleTool {
    fn name(&self) -> &str {
        "GOOGLE"
    }

    fn short_description(&self) -> String {
        "Search Google and Google Scholar for up-to-date, real time information".to_string()
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new(
                "SEARCH",
                "Search Google to have access to anything on the internet",
                &["Topic"],
            ),
            CommandDescriptor::new(
                "SCHOLAR",
                "Search Google Scholar to see a list of articles about a topic",
                &["Topic"],
            ),
            CommandDescriptor::new(
                "CLICK",
                "Click a link from your previous search [ONLY AVAILABLE AFTER SEARCHING]",
                &["Link Number"],
            ),
        ]
    }

    fn examples(&self) -> [String; 2] {
        [
            "user: What has Yann LeCun published?\nassistant: %GOOGLE SCHOLAR Yann Lecun\nsystem: The Google Scholar page for Yann_Lecun says [GS PAGE]\nassistant: Yann Lecun has published numerous articles, including ones on CNNs and Deep Learning\nuser: Click on one article and summarize it\nassistant: %GOOGLE CLICK 2\nsystem: The page at [LINK] says [PAGE CONTENTS]\nassistant: This article is about the creation of deep learning".to_string(),
            "user: Who won the game last night?\nassistant: %GOOGLE SEARCH game last night score\nsystem: The Google Search page for game_last_night_score says [SEARCH RESULTS]\nassistant: %GOOGLE CLICK 1\nsystem: The page at [LINK] says [PAGE CONTENTS]\nassistant: The home team won 3 to 1".to_string(),
        ]
    }

    async fn execute(&self, command: &str, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        match command {
            "SEARCH" => self.search(args).await,
            "SCHOLAR" => self.scholar(args).await,
            "CLICK" => self.click(args).await,
            _ => Ok(unknown_command(self.name(), command)),
        }
    }
}
