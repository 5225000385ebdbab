use chrono::{DateTime, FixedOffset, Utc};

/// One normalized news entry, as produced by the fetcher.
#[derive(Debug, Clone)]
pub struct NewsItem {
    /// Configured feed the item came from (not the visible publisher)
    pub feed_name: String,
    /// Display name of the originating publisher. Aggregator feeds like
    /// Google News carry many publishers behind one feed; falls back to
    /// the feed name when the entry names no source.
    pub publisher: String,
    pub title: String,
    /// First entry link; empty string when the entry has none
    pub link: String,
    pub summary: String,
    pub image_url: Option<String>,
    /// None when the source feed supplies no date
    pub published_utc: Option<DateTime<Utc>>,
}

impl NewsItem {
    /// Dedup key: same feed + same link is the same story. The same link
    /// surfacing through two different feeds stays two stories.
    pub fn dedup_key(&self) -> (String, String) {
        (self.feed_name.clone(), self.link.clone())
    }
}

/// A selected item paired with its display-zone timestamp. Undated items
/// get the selection's "now", which sorts them to the top of the page.
#[derive(Debug, Clone)]
pub struct RankedItem {
    pub item: NewsItem,
    pub published_local: DateTime<FixedOffset>,
}
