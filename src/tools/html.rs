//! Page fetching and HTML extraction shared by the web tools
//!
//! Parsing is synchronous and returns owned data, so no parsed document is
//! ever held across an await point.

use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder, Url};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;

const BROWSER_AGENT: &str = "Chrome";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("the page has no {0} element")]
    MissingElement(String),
    #[error("{0} is not a valid base URL")]
    InvalidUrl(String),
}

/// HTTP client for the web tools
#[derive(Clone, Default)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub async fn fetch(&self, url: &str) -> Result<String, PageError> {
        self.send(self.client.get(url)).await
    }

    /// GET `url` with a percent-encoded `q` parameter
    pub async fn fetch_query(&self, url: &str, query: &str) -> Result<String, PageError> {
        self.send(self.client.get(url).query(&[("q", query)])).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, PageError> {
        let response = request
            .header(USER_AGENT, BROWSER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let url = response.url().to_string();
        let body = response.text().await?;
        tracing::debug!(url = %url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// `base` with `segments` appended as percent-encoded path segments
pub fn join_path(base: &str, segments: &[&str]) -> Result<Url, PageError> {
    let invalid = || PageError::InvalidUrl(base.to_string());
    let mut url = Url::parse(base).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|()| invalid())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// A piece of page text in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSection {
    Heading(String),
    /// Paragraph text accumulated since the previous heading
    Body(String),
}

/// Link from a search results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLink {
    pub url: String,
    pub title: String,
    /// Host part of the URL
    pub site: String,
}

/// Entry from a scholar results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScholarResult {
    pub url: String,
    pub title: String,
    pub description: String,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn first_element<'a>(document: &'a Html, css: &str) -> Result<ElementRef<'a>, PageError> {
    let missing = || PageError::MissingElement(css.to_string());
    let sel = selector(css).ok_or_else(missing)?;
    let element = document.select(&sel).next();
    element.ok_or_else(missing)
}

/// Text of the first element matching `css`
pub fn extract_text(html: &str, css: &str) -> Result<String, PageError> {
    let document = Html::parse_document(html);
    first_element(&document, css).map(element_text)
}

/// Split the first `container` element into sections.
///
/// Paragraphs are accumulated, one line each, until the next `heading`
/// element. With no heading tag the whole container is one section.
pub fn extract_sections(
    html: &str,
    container: &str,
    heading: Option<&str>,
) -> Result<Vec<PageSection>, PageError> {
    let document = Html::parse_document(html);
    let root = first_element(&document, container)?;
    let css = heading.map_or_else(|| "p".to_string(), |h| format!("{h}, p"));
    let Some(parts) = selector(&css) else {
        return Err(PageError::MissingElement(css));
    };

    let mut sections = Vec::new();
    let mut body = String::new();
    for element in root.select(&parts) {
        if Some(element.value().name()) == heading {
            if !body.is_empty() {
                sections.push(PageSection::Body(std::mem::take(&mut body)));
            }
            sections.push(PageSection::Heading(element_text(element)));
        } else {
            body.push_str(&element_text(element));
            body.push('\n');
        }
    }
    if !body.is_empty() {
        sections.push(PageSection::Body(body));
    }
    Ok(sections)
}

/// Result links of a search page.
///
/// Result anchors wrap the target as a query parameter
/// (`/url?q=https://site/page&sa=...`): the URL is the text after the first
/// `=` with any further `=` removed, cut at the first `&`. Anchors without a
/// host segment in that URL are navigation and skipped.
pub fn extract_search_links(html: &str) -> Vec<SearchLink> {
    let document = Html::parse_document(html);
    let Some(anchors) = selector("a") else {
        return Vec::new();
    };
    document
        .select(&anchors)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let (_, target) = href.split_once('=')?;
            let target = target.replace('=', "");
            let url = target.split('&').next().unwrap_or_default().to_string();
            let site = url.split('/').nth(2)?.to_string();
            Some(SearchLink {
                title: element_text(anchor),
                url,
                site,
            })
        })
        .collect()
}

/// Results of a scholar page; entries without a linked title are skipped
pub fn extract_scholar_results(html: &str) -> Vec<ScholarResult> {
    let document = Html::parse_document(html);
    let (Some(entries), Some(title_sel), Some(link_sel), Some(desc_sel)) = (
        selector("div.gs_or"),
        selector("h3"),
        selector("a"),
        selector("div.gs_rs"),
    ) else {
        return Vec::new();
    };
    document
        .select(&entries)
        .filter_map(|entry| {
            let title = entry.select(&title_sel).next()?;
            let url = title.select(&link_sel).next()?.value().attr("href")?.to_string();
            let description = entry
                .select(&desc_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            Some(ScholarResult {
                url,
                title: element_text(title),
                description,
            })
        })
        .collect()
}
