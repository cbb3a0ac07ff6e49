//! Category crawler: walks wiki category listings and collects article URLs.
//!
//! The traversal is an explicit worklist: a frontier of category/pagination
//! pages still to visit plus a visited set owned by the crawl call. Article
//! links go into the result set; subcategory and "next page" links are pushed
//! onto the frontier. A page that fails to fetch is logged and skipped, never
//! fatal to the rest of the walk.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::types::RagError;

/// Namespace prefixes that disqualify a URL from the article set.
///
/// Subcategory and pagination links are still followed even though they
/// contain `Category:`; the blacklist only governs article-set membership.
pub const NAMESPACE_BLACKLIST: [&str; 7] = [
    "Category:",
    "Template:",
    "File:",
    "Talk:",
    "User:",
    "Help:",
    "Module:",
];

/// Returns `true` when the URL lives in a non-article wiki namespace.
pub fn is_blacklisted(url: &Url) -> bool {
    NAMESPACE_BLACKLIST
        .iter()
        .any(|token| url.as_str().contains(token))
}

/// Result of crawling one seed category.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Deduplicated article URLs, sorted for stable output.
    pub articles: Vec<Url>,
    /// Category/pagination pages fetched during the walk.
    pub pages_visited: usize,
    /// Pages that failed to fetch and were skipped.
    pub fetch_failures: usize,
}

/// Links lifted from a single category page.
#[derive(Debug, Default)]
struct PageLinks {
    articles: Vec<Url>,
    follow: Vec<Url>,
}

pub struct CategoryCrawler {
    client: Client,
    delay: Duration,
    article_links: Selector,
    subcategory_links: Selector,
    anchors: Selector,
}

impl CategoryCrawler {
    pub fn new(client: Client, delay: Duration) -> Result<Self, RagError> {
        Ok(Self {
            client,
            delay,
            article_links: parse_selector(".mw-category-group a")?,
            subcategory_links: parse_selector(".CategoryTreeItem a")?,
            anchors: parse_selector("a")?,
        })
    }

    /// Walks the category tree rooted at `seed` and returns all reachable,
    /// non-blacklisted article URLs.
    pub async fn crawl(&self, seed: &Url) -> CrawlOutcome {
        let mut visited: HashSet<Url> = HashSet::new();
        let mut frontier: VecDeque<Url> = VecDeque::from([seed.clone()]);
        let mut articles: BTreeSet<Url> = BTreeSet::new();
        let mut outcome = CrawlOutcome::default();

        while let Some(page_url) = frontier.pop_front() {
            if !visited.insert(page_url.clone()) {
                continue;
            }

            info!(url = %page_url, "crawling category page");
            tokio::time::sleep(self.delay).await;

            let body = match self.fetch(&page_url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(url = %page_url, error = %err, "failed to fetch category page, skipping");
                    outcome.fetch_failures += 1;
                    continue;
                }
            };
            outcome.pages_visited += 1;

            let links = self.parse_page(&body, &page_url);
            debug!(
                url = %page_url,
                articles = links.articles.len(),
                follow = links.follow.len(),
                "parsed category page"
            );

            articles.extend(links.articles);
            for next in links.follow {
                if !visited.contains(&next) {
                    frontier.push_back(next);
                }
            }
        }

        outcome.articles = articles.into_iter().collect();
        outcome
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

    /// Splits a category page into article links and pages to follow.
    fn parse_page(&self, body: &str, page_url: &Url) -> PageLinks {
        let document = Html::parse_document(body);
        let mut links = PageLinks::default();

        for element in document.select(&self.article_links) {
            let Some(url) = join_href(page_url, element.value().attr("href")) else {
                continue;
            };
            if is_blacklisted(&url) {
                continue;
            }
            links.articles.push(url);
        }

        for element in document.select(&self.subcategory_links) {
            if let Some(url) = join_href(page_url, element.value().attr("href")) {
                links.follow.push(url);
            }
        }

        // Pagination: the listing links its continuation as a plain
        // "next page" anchor.
        for element in document.select(&self.anchors) {
            let text: String = element.text().collect();
            if text.trim() != "next page" {
                continue;
            }
            if let Some(url) = join_href(page_url, element.value().attr("href")) {
                links.follow.push(url);
                break;
            }
        }

        links
    }
}

fn join_href(base: &Url, href: Option<&str>) -> Option<Url> {
    let href = href?;
    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}

fn parse_selector(raw: &str) -> Result<Selector, RagError> {
    Selector::parse(raw).map_err(|err| RagError::InvalidDocument(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn crawler() -> CategoryCrawler {
        CategoryCrawler::new(Client::new(), Duration::ZERO).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://minecraft.wiki/w/Category:Blocks").unwrap()
    }

    #[test]
    fn blacklisted_namespaces_are_excluded_from_articles() {
        let url = Url::parse("https://minecraft.wiki/w/Template:Infobox").unwrap();
        assert!(is_blacklisted(&url));
        let url = Url::parse("https://minecraft.wiki/w/Oak_Log").unwrap();
        assert!(!is_blacklisted(&url));
    }

    #[test]
    fn parse_page_separates_articles_and_follow_links() {
        let html = r#"
            <div class="mw-category-group">
                <a href="/w/Stone">Stone</a>
                <a href="/w/File:Stone.png">picture</a>
                <a href="/w/Dirt#section">Dirt</a>
            </div>
            <div class="CategoryTreeItem"><a href="/w/Category:Ores">Ores</a></div>
            <a href="/w/Category:Blocks?from=Q">next page</a>
            <a href="/w/Category:Blocks?until=B">previous page</a>
        "#;

        let links = crawler().parse_page(html, &base());

        let articles: Vec<String> = links.articles.iter().map(Url::to_string).collect();
        assert_eq!(
            articles,
            vec![
                "https://minecraft.wiki/w/Stone",
                "https://minecraft.wiki/w/Dirt",
            ]
        );

        let follow: Vec<String> = links.follow.iter().map(Url::to_string).collect();
        assert_eq!(
            follow,
            vec![
                "https://minecraft.wiki/w/Category:Ores",
                "https://minecraft.wiki/w/Category:Blocks?from=Q",
            ]
        );
    }

    #[test]
    fn parse_page_drops_fragments() {
        let html = r#"<div class="mw-category-group"><a href="/w/Dirt#uses">Dirt</a></div>"#;
        let links = crawler().parse_page(html, &base());
        assert_eq!(links.articles[0].as_str(), "https://minecraft.wiki/w/Dirt");
    }

    #[test]
    fn parse_page_without_listing_yields_nothing() {
        let links = crawler().parse_page("<p>not a category page</p>", &base());
        assert!(links.articles.is_empty());
        assert!(links.follow.is_empty());
    }
}
