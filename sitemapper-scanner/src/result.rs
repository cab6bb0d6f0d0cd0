use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// What happened to one dispatched URL.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub url: String,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time: Duration,
    pub links_found: Vec<String>,
    pub error: Option<FetchError>,
}

impl CrawlResult {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: None,
            content_type: None,
            content_length: None,
            response_time: Duration::from_secs(0),
            links_found: Vec::new(),
            error: None,
        }
    }

    pub fn with_error(url: String, error: FetchError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url)
        }
    }

    /// Parsed as HTML and had its links extracted.
    pub fn is_parsed(&self) -> bool {
        self.error.is_none()
    }
}

/// Entry of the failure log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: FetchError,
}

/// Terminal state of a crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub seed: String,
    pub origin: String,
    /// Every URL that was dispatched, fetched successfully or not.
    pub visited: BTreeSet<String>,
    pub pages: Vec<CrawlResult>,
    pub failures: Vec<FetchFailure>,
    /// Links discarded because the frontier was full.
    pub dropped_links: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn page(&self, url: &str) -> Option<&CrawlResult> {
        self.pages.iter().find(|p| p.url == url)
    }

    pub fn parsed_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_parsed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.error.as_ref().is_some_and(|e| !e.is_transport()))
            .count()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
