//! Feed retrieval and entry mapping.
//!
//! [`FeedClient`] abstracts the network so the orchestrator can run
//! against canned items in tests; [`HttpFeedClient`] is the production
//! implementation over reqwest and feed-rs.

use crate::types::{FeedSource, PipelineError, RawItem, Result};
use async_trait::async_trait;
use chrono::Utc;
use feed_rs::model::Entry;
use std::time::Duration;
use tracing::{debug, warn};

/// The default set of Marathi news feeds.
pub fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("TV9 Marathi", "https://www.tv9marathi.com/feed"),
        FeedSource::new("Saam TV", "https://www.saamtv.com/feed/"),
        FeedSource::new(
            "Divya Marathi",
            "https://divyamarathi.bhaskar.com/rss-v1--category-12019.xml",
        ),
    ]
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch and parse one feed, newest entries first as the feed lists them.
    async fn fetch_items(&self, source: &FeedSource) -> Result<Vec<RawItem>>;
}

pub struct HttpFeedClient {
    client: reqwest::Client,
}

impl HttpFeedClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("varta-pipeline/0.1 (news aggregator)")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch_items(&self, source: &FeedSource) -> Result<Vec<RawItem>> {
        debug!(source = %source.name, url = %source.url, "Fetching feed");

        let response = self.client.get(&source.url).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::Parse(format!(
                "feed {} returned status {}",
                source.url,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let feed = feed_rs::parser::parse(bytes.as_ref())
            .map_err(|e| PipelineError::Parse(format!("failed to parse {}: {}", source.url, e)))?;

        let items: Vec<RawItem> = feed.entries.iter().map(map_entry).collect();
        debug!(source = %source.name, count = items.len(), "Parsed feed entries");
        Ok(items)
    }
}

/// Map a feed-rs entry onto the pipeline's flat item shape, pulling the
/// media fields the image resolver falls back through.
fn map_entry(entry: &Entry) -> RawItem {
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let thumbnail_url = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .next();

    let media_url = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|c| c.url.as_ref())
        .map(|u| u.to_string())
        .next();

    let enclosure = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("enclosure"));

    RawItem {
        title: entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        link,
        description: entry.summary.as_ref().map(|s| s.content.clone()),
        content: entry.content.as_ref().and_then(|c| c.body.clone()),
        published_at: entry.published.or(entry.updated),
        thumbnail_url,
        media_url,
        enclosure_url: enclosure.map(|l| l.href.clone()),
        enclosure_type: enclosure.and_then(|l| l.media_type.clone()),
    }
}

/// Published timestamp with a now() fallback for feeds that omit dates.
pub fn published_or_now(item: &RawItem) -> chrono::DateTime<Utc> {
    match item.published_at {
        Some(ts) => ts,
        None => {
            warn!(link = %item.link, "Entry has no publish date, using fetch time");
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Sample</title>
    <item>
      <title>First headline</title>
      <link>https://example.com/first</link>
      <description>summary text</description>
      <pubDate>Mon, 05 Aug 2024 10:00:00 +0530</pubDate>
      <media:thumbnail url="https://example.com/thumb.jpg"/>
      <enclosure url="https://example.com/full.jpg" type="image/jpeg" length="1000"/>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn maps_media_fields_from_rss() {
        let feed = feed_rs::parser::parse(SAMPLE_RSS.as_bytes()).unwrap();
        let item = map_entry(&feed.entries[0]);

        assert_eq!(item.title, "First headline");
        assert_eq!(item.link, "https://example.com/first");
        assert_eq!(item.description.as_deref(), Some("summary text"));
        assert_eq!(
            item.thumbnail_url.as_deref(),
            Some("https://example.com/thumb.jpg")
        );
        // RSS enclosures surface through the media objects.
        assert_eq!(
            item.media_url.as_deref(),
            Some("https://example.com/full.jpg")
        );
        assert!(item.published_at.is_some());
    }
}
