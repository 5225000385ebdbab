use std::collections::HashMap;
use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

use crate::config::FeedConfig;
use crate::model::NewsItem;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// Several of the configured portals return 403 to non-browser agents
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed parse failed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch every configured feed without killing the request if one
    /// fails. A feed that errors or times out contributes zero items and
    /// nothing else; the page is built from whatever loaded.
    pub async fn fetch_all(&self, feeds: &[FeedConfig]) -> Vec<NewsItem> {
        let mut all_items = Vec::new();

        for feed in feeds {
            match self.fetch_feed(feed).await {
                Ok(items) => all_items.extend(items),
                Err(e) => error!("Failed to fetch feed '{}': {}", feed.name, e),
            }
        }

        info!("Total items fetched from all feeds: {}", all_items.len());
        all_items
    }

    async fn fetch_feed(&self, feed: &FeedConfig) -> Result<Vec<NewsItem>, FetchError> {
        info!("Fetching feed: {} ({})", feed.name, feed.url);

        let response = self
            .client
            .get(&feed.url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        // Publisher attribution lives in the RSS <source> element
        // (aggregators like Google News fill it per item), which feed_rs
        // doesn't surface. Scan the raw XML for it before parsing.
        let source_titles = Self::extract_source_titles_from_xml(&bytes);

        let parsed = parser::parse(&bytes[..])?;

        let mut items = Vec::new();
        for entry in parsed.entries {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_else(|| "No title".to_string());

            // Entries without a link are kept; the page just renders the
            // card without a working "open" target.
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            let summary = entry
                .summary
                .as_ref()
                .map(|s| s.content.clone())
                .unwrap_or_default();

            let image_url = Self::extract_image(&entry);

            let publisher = source_titles
                .get(&link)
                .cloned()
                .unwrap_or_else(|| feed.name.clone());

            let published_utc = entry.published.or(entry.updated);

            items.push(NewsItem {
                feed_name: feed.name.clone(),
                publisher,
                title,
                link,
                summary,
                image_url,
                published_utc,
            });
        }

        info!("{}: entries={}", feed.name, items.len());
        Ok(items)
    }

    /// Find an image URL in the common media-rss fields: media content
    /// first, then thumbnails, then any entry link typed image/*.
    pub fn extract_image(entry: &feed_rs::model::Entry) -> Option<String> {
        for media in &entry.media {
            for content in &media.content {
                if let Some(url) = content.url.as_ref() {
                    let url = url.as_str().trim();
                    if !url.is_empty() {
                        return Some(url.to_string());
                    }
                }
            }
        }

        for media in &entry.media {
            for thumb in &media.thumbnails {
                let uri = thumb.image.uri.trim();
                if !uri.is_empty() {
                    return Some(uri.to_string());
                }
            }
        }

        for link in &entry.links {
            let is_image = link
                .media_type
                .as_deref()
                .map(|t| t.starts_with("image/"))
                .unwrap_or(false);
            if is_image && !link.href.trim().is_empty() {
                return Some(link.href.clone());
            }
        }

        None
    }

    /// Map item <link> to the display text of its <source> element, from
    /// raw RSS XML
    pub fn extract_source_titles_from_xml(xml_bytes: &[u8]) -> HashMap<String, String> {
        let mut source_titles = HashMap::new();
        let xml_str = match std::str::from_utf8(xml_bytes) {
            Ok(s) => s,
            Err(_) => return source_titles,
        };

        for item_block in xml_str.split("<item>").skip(1) {
            let item_end = item_block.find("</item>").unwrap_or(item_block.len());
            let item = &item_block[..item_end];

            let link = Self::extract_xml_element(item, "link");
            let source = Self::extract_xml_element(item, "source");

            if let (Some(link), Some(source)) = (link, source) {
                if !source.is_empty() {
                    source_titles.insert(link, source);
                }
            }
        }

        source_titles
    }

    /// Text content of the first `<tag>` or `<tag attr="...">` in the
    /// fragment. `<source>` carries a url attribute, so plain start-tag
    /// matching isn't enough.
    pub fn extract_xml_element(xml: &str, tag: &str) -> Option<String> {
        let open = format!("<{}", tag);
        let end_tag = format!("</{}>", tag);

        let mut search_from = 0;
        loop {
            let at = xml[search_from..].find(&open)? + search_from;
            let after = at + open.len();
            match xml.as_bytes().get(after) {
                Some(b'>') => {
                    let start = after + 1;
                    let end = xml[start..].find(&end_tag)? + start;
                    return Some(xml[start..end].trim().to_string());
                }
                Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {
                    let close = xml[after..].find('>')? + after;
                    if xml.as_bytes()[close - 1] == b'/' {
                        // Self-closing, no text content
                        return Some(String::new());
                    }
                    let start = close + 1;
                    let end = xml[start..].find(&end_tag)? + start;
                    return Some(xml[start..end].trim().to_string());
                }
                // A longer tag name sharing this prefix; keep looking
                _ => {
                    search_from = after;
                }
            }
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}
