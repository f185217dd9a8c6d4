//! Product feed fetching and CSV decoding.
//!
//! A feed is any URL serving delimited text (comma, tab, semicolon or pipe),
//! including a Google Sheets share link which is rewritten to its CSV export.
//! Fetched bodies are cached per URL in a bounded LRU owned by the
//! [`ProductFeed`] itself.

use std::num::NonZeroUsize;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Duration;

use lru::LruCache;
use regex::Regex;
use serde::Serialize;

use crate::error::FeedError;

/// Request timeout used by [`FeedConfig::default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cache capacity used by [`FeedConfig::default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// First-row cells that mark a header row.
const HEADER_TOKENS: [&str; 4] = ["name", "service_name", "product", "title"];

/// Delimiters tried by [`sniff_delimiter`], in order of preference.
const CANDIDATE_DELIMITERS: [char; 4] = [',', '\t', ';', '|'];

const SHEETS_HOST_PATH: &str = "docs.google.com/spreadsheets";

static SHEETS_EDIT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/edit.*$").expect("valid sheets pattern"));

/// One row of a product feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub price: String,
    pub desc: String,
    pub img: String,
}

/// Settings for the HTTP-backed feed
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub timeout: Duration,
    pub cache_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Something that can return the text body behind a feed URL
pub trait FeedSource: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String, FeedError>;
}

/// Blocking HTTP feed source
pub struct HttpFeedSource {
    client: reqwest::blocking::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch_text(&self, url: &str) -> Result<String, FeedError> {
        log::debug!("fetching product feed {url}");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }
}

/// Product fetcher with a bounded per-URL cache of feed bodies
pub struct ProductFeed {
    source: Box<dyn FeedSource>,
    cache: Mutex<LruCache<String, String>>,
}

impl ProductFeed {
    /// Create an HTTP-backed feed
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let source = HttpFeedSource::new(config.timeout)?;
        Ok(Self::with_source(source, config.cache_capacity))
    }

    /// Create a feed over any source; a zero capacity is treated as one
    pub fn with_source(source: impl FeedSource + 'static, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            source: Box::new(source),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch and decode the products behind `feed_url`
    pub fn fetch_products(&self, feed_url: &str) -> Result<Vec<Product>, FeedError> {
        let url = export_url(feed_url.trim());
        let text = self.fetch_cached(&url)?;
        parse_products(&text)
    }

    /// Drop every cached feed body
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn fetch_cached(&self, url: &str) -> Result<String, FeedError> {
        if let Some(text) = self.lock_cache().get(url) {
            log::debug!("product feed cache hit for {url}");
            return Ok(text.clone());
        }

        // Fetch outside the lock so a slow feed does not block other lookups.
        let text = self.source.fetch_text(url)?;
        self.lock_cache().put(url.to_string(), text.clone());
        Ok(text)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, String>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rewrite a Google Sheets edit link to its CSV export link.
///
/// Any other URL is returned unchanged.
pub fn export_url(url: &str) -> String {
    if url.contains(SHEETS_HOST_PATH) {
        SHEETS_EDIT_SUFFIX
            .replace(url, "/export?format=csv")
            .into_owned()
    } else {
        url.to_string()
    }
}

/// Pick the field delimiter of a feed from its first line.
///
/// The candidate occurring most often outside double quotes wins. When none
/// occurs, falls back to `|` if the first few lines contain one, else `,`.
pub fn sniff_delimiter(text: &str) -> char {
    let first_line = text.lines().next().unwrap_or_default();

    let mut best: Option<(char, usize)> = None;
    for candidate in CANDIDATE_DELIMITERS {
        let count = count_unquoted(first_line, candidate);
        if count > 0 && best.map_or(true, |(_, n)| count > n) {
            best = Some((candidate, count));
        }
    }

    match best {
        Some((delimiter, _)) => delimiter,
        None if text.lines().take(5).any(|line| line.contains('|')) => '|',
        None => ',',
    }
}

fn count_unquoted(line: &str, needle: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == needle && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Decode feed text into products.
///
/// Blank rows are dropped, a recognised header row is skipped, and each
/// remaining row maps positionally to name, price, desc and img.
pub fn parse_products(text: &str) -> Result<Vec<Product>, FeedError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().any(|cell| !cell.is_empty()) {
            rows.push(record);
        }
    }

    let skip = match rows.first() {
        Some(first) if is_header(first) => 1,
        _ => 0,
    };

    Ok(rows
        .iter()
        .skip(skip)
        .map(|row| {
            let cell = |i: usize| row.get(i).unwrap_or_default().to_string();
            Product {
                name: cell(0),
                price: cell(1),
                desc: cell(2),
                img: cell(3),
            }
        })
        .collect())
}

fn is_header(row: &csv::StringRecord) -> bool {
    row.iter()
        .map(str::to_lowercase)
        .any(|cell| HEADER_TOKENS.contains(&cell.as_str()))
}
