use serde::Deserialize;
use std::path::Path;

use chrono::FixedOffset;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Trailing recency window in hours
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Minimum stories shown per feed, even when older than the window
    #[serde(default = "default_min_per_feed")]
    pub min_per_feed: usize,
    /// Overall page cap, applied after the final sort
    #[serde(default = "default_global_limit")]
    pub global_limit: Option<usize>,
    /// Display timezone as a fixed UTC offset in minutes (330 = IST)
    #[serde(default = "default_tz_offset_minutes")]
    pub tz_offset_minutes: i32,
    #[serde(default = "default_tz_label")]
    pub tz_label: String,
    pub feeds: Vec<FeedConfig>,
}

fn default_window_hours() -> i64 {
    24
}

fn default_min_per_feed() -> usize {
    1
}

fn default_global_limit() -> Option<usize> {
    Some(120)
}

fn default_tz_offset_minutes() -> i32 {
    330
}

fn default_tz_label() -> String {
    "IST".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.window_hours <= 0 {
            anyhow::bail!("window_hours must be positive, got {}", self.window_hours);
        }
        if self.global_limit == Some(0) {
            anyhow::bail!("global_limit must be positive when set");
        }
        self.display_offset()?;
        Ok(())
    }

    /// The configured display timezone as a chrono offset.
    pub fn display_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.tz_offset_minutes * 60).ok_or_else(|| {
            anyhow::anyhow!(
                "tz_offset_minutes {} is out of range",
                self.tz_offset_minutes
            )
        })
    }

    /// Registry iteration order, used for the per-feed floor pass.
    pub fn feed_names(&self) -> Vec<String> {
        self.feeds.iter().map(|f| f.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        assert_eq!(default_window_hours(), 24);
        assert_eq!(default_min_per_feed(), 1);
        assert_eq!(default_global_limit(), Some(120));
        assert_eq!(default_tz_offset_minutes(), 330);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            window_hours = 48
            min_per_feed = 2
            global_limit = 60
            tz_offset_minutes = 0
            tz_label = "UTC"

            [[feeds]]
            name = "Moneycontrol"
            url = "https://example.com/latestnews.xml"

            [[feeds]]
            name = "The Hindu - Markets"
            url = "https://example.org/markets.rss"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.window_hours, 48);
        assert_eq!(config.min_per_feed, 2);
        assert_eq!(config.global_limit, Some(60));
        assert_eq!(config.tz_offset_minutes, 0);
        assert_eq!(config.tz_label, "UTC");
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[0].name, "Moneycontrol");
        assert_eq!(config.feeds[0].url, "https://example.com/latestnews.xml");
        assert_eq!(config.feeds[1].name, "The Hindu - Markets");
    }

    #[test]
    fn test_load_config_with_defaults() {
        let content = r#"
            [[feeds]]
            name = "Test Feed"
            url = "https://example.com/feed.xml"
        "#;

        let config = Config::from_str(content).unwrap();

        assert_eq!(config.window_hours, 24);
        assert_eq!(config.min_per_feed, 1);
        assert_eq!(config.global_limit, Some(120));
        assert_eq!(config.tz_offset_minutes, 330);
        assert_eq!(config.tz_label, "IST");
        assert_eq!(config.feeds.len(), 1);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let content = "this is not valid toml {{{";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_missing_required_fields() {
        let content = r#"
            [[feeds]]
            name = "Test Feed"
            # Missing url field
        "#;

        let result = Config::from_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_positive_window() {
        let content = r#"
            window_hours = 0

            [[feeds]]
            name = "Test Feed"
            url = "https://example.com/feed.xml"
        "#;

        let result = Config::from_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_global_limit() {
        let content = r#"
            global_limit = 0

            [[feeds]]
            name = "Test Feed"
            url = "https://example.com/feed.xml"
        "#;

        let result = Config::from_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let content = r#"
            tz_offset_minutes = 100000

            [[feeds]]
            name = "Test Feed"
            url = "https://example.com/feed.xml"
        "#;

        let result = Config::from_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_feeds_list() {
        let content = "feeds = []";

        let config = Config::from_str(content).unwrap();
        assert!(config.feeds.is_empty());
        assert!(config.feed_names().is_empty());
    }

    #[test]
    fn test_feed_names_preserve_registry_order() {
        let content = r#"
            [[feeds]]
            name = "Moneycontrol"
            url = "https://example.com/a.xml"

            [[feeds]]
            name = "BS Hindi - Markets News"
            url = "https://example.com/b.xml"

            [[feeds]]
            name = "Google News - India Markets"
            url = "https://example.com/c.xml"
        "#;

        let config = Config::from_str(content).unwrap();
        assert_eq!(
            config.feed_names(),
            vec![
                "Moneycontrol",
                "BS Hindi - Markets News",
                "Google News - India Markets"
            ]
        );
    }

    #[test]
    fn test_display_offset_ist() {
        let config = Config::from_str(
            r#"
            [[feeds]]
            name = "Test Feed"
            url = "https://example.com/feed.xml"
        "#,
        )
        .unwrap();

        let offset = config.display_offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 330 * 60);
    }
}
