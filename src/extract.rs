//! Article extractor: fetches one wiki page and lifts out its readable text.
//!
//! Boilerplate regions (infoboxes, navboxes, tables of contents, thumbnails,
//! edit markers, tables, metadata blocks) are detached from the parsed tree
//! before the text is collected, so navigation chrome never reaches the
//! corpus. Pages that fail to fetch or lack the expected structure yield
//! `Ok(None)` and are skipped by callers.

use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::types::{Document, RagError};

const BOILERPLATE_SELECTORS: &str =
    ".infobox, .navbox, .hatnote, .toc, .thumb, .mw-editsection, table, .metadata";

pub struct ArticleExtractor {
    client: Client,
    title: Selector,
    content: Selector,
    boilerplate: Selector,
    whitespace: Regex,
}

impl ArticleExtractor {
    pub fn new(client: Client) -> Result<Self, RagError> {
        Ok(Self {
            client,
            title: parse_selector("h1#firstHeading")?,
            content: parse_selector("div.mw-parser-output")?,
            boilerplate: parse_selector(BOILERPLATE_SELECTORS)?,
            whitespace: Regex::new(r"\s+")
                .map_err(|err| RagError::InvalidDocument(err.to_string()))?,
        })
    }

    /// Fetches and extracts one article. `Ok(None)` means the page is
    /// unusable (fetch failure or missing content region) and should be
    /// skipped; hard errors are reserved for callers that cannot continue.
    pub async fn extract(&self, url: &Url) -> Result<Option<Document>, RagError> {
        let body = match self.fetch(url).await {
            Ok(body) => body,
            Err(err) => {
                warn!(url = %url, error = %err, "failed to fetch article, skipping");
                return Ok(None);
            }
        };
        Ok(self.parse(&body, url))
    }

    async fn fetch(&self, url: &Url) -> Result<String, RagError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    /// Parses a fetched page into a document. `None` when the main content
    /// region is absent.
    pub fn parse(&self, body: &str, url: &Url) -> Option<Document> {
        let mut document = Html::parse_document(body);

        let title = document
            .select(&self.title)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string());

        let content_id = document.select(&self.content).next().map(|el| el.id())?;

        let boilerplate: Vec<_> = document
            .select(&self.boilerplate)
            .map(|el| el.id())
            .collect();
        for id in boilerplate {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        let content = document.tree.get(content_id).and_then(ElementRef::wrap)?;
        let text = content.text().collect::<Vec<_>>().join(" ");
        let content = self.collapse_whitespace(&text);

        Some(Document::new(title, url.as_str(), content))
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

fn parse_selector(raw: &str) -> Result<Selector, RagError> {
    Selector::parse(raw).map_err(|err| RagError::InvalidDocument(err.to_string()))
}
