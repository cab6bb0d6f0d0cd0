use crate::error::{FetchError, Result};
use crate::fetch::{DEFAULT_REQUEST_TIMEOUT, Fetcher, HttpFetcher};
use crate::frontier::Frontier;
use crate::links::same_origin_links;
use crate::result::{CrawlReport, CrawlResult, FetchFailure};
use crate::scope::{Origin, SeedUrl};
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(&CrawlResult) + Send + Sync>;

pub const DEFAULT_WORKERS: usize = 10;

pub struct Crawler<F: Fetcher = HttpFetcher> {
    fetcher: Arc<F>,
    request_timeout: Duration,
    crawl_timeout: Option<Duration>,
    max_frontier: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Crawler<HttpFetcher> {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(request_timeout: Duration) -> Result<Self> {
        let fetcher = HttpFetcher::new(request_timeout)?;
        Ok(Self::with_fetcher(fetcher).with_request_timeout(request_timeout))
    }
}

impl<F: Fetcher> Crawler<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            crawl_timeout: None,
            max_frontier: None,
            progress_callback: None,
            result_callback: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_crawl_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.crawl_timeout = timeout;
        self
    }

    pub fn with_max_frontier(mut self, max: Option<usize>) -> Self {
        self.max_frontier = max;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub async fn crawl(&self, start_url: &str, workers: usize) -> Result<CrawlReport> {
        self.crawl_until(start_url, workers, std::future::pending())
            .await
    }

    /// Crawls until the frontier drains, the crawl timeout elapses or
    /// `shutdown` resolves, whichever comes first.
    ///
    /// Only an invalid seed is an error. Fetch failures are collected in the
    /// report, and a cancelled crawl still returns everything visited so far.
    pub async fn crawl_until(
        &self,
        start_url: &str,
        workers: usize,
        shutdown: impl Future<Output = ()>,
    ) -> Result<CrawlReport> {
        let seed = SeedUrl::parse(start_url)?;
        let workers = workers.max(1);
        let started_at = Utc::now();

        info!("Starting crawl at {} with {} workers", seed, workers);

        let frontier = Arc::new(Frontier::new(seed.url().clone(), self.max_frontier));
        let origin = Arc::new(seed.origin().clone());

        let mut worker_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let fetcher = self.fetcher.clone();
            let frontier = frontier.clone();
            let origin = origin.clone();
            let progress_cb = self.progress_callback.clone();
            let result_cb = self.result_callback.clone();
            let request_timeout = self.request_timeout;

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                let mut results = Vec::new();

                while let Some(claim) = frontier.claim().await {
                    let url = claim.url().clone();
                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.to_string());
                    }

                    let (result, links) =
                        Self::fetch_and_parse(&*fetcher, &url, &origin, request_timeout).await;
                    let queued = claim.complete(&links);
                    debug!(
                        "[Worker {}] {} -> {} links, {} new",
                        worker_id,
                        url,
                        links.len(),
                        queued
                    );

                    if let Some(ref callback) = result_cb {
                        callback(&result);
                    }
                    results.push(result);
                }

                debug!("Worker {} finished", worker_id);
                results
            });

            worker_handles.push(handle);
        }

        let deadline = self.crawl_timeout;
        let stop = async move {
            match deadline {
                Some(limit) => {
                    tokio::select! {
                        _ = shutdown => {}
                        _ = tokio::time::sleep(limit) => {
                            info!("Crawl time limit of {:?} reached", limit);
                        }
                    }
                }
                None => shutdown.await,
            }
        };

        let all_workers = join_all(worker_handles);
        tokio::pin!(all_workers);

        let mut cancelled = false;
        let joined = tokio::select! {
            joined = &mut all_workers => joined,
            _ = stop => {
                cancelled = frontier.close();
                if cancelled {
                    warn!(
                        "Crawl cancelled with {} URLs pending, waiting for {} in-flight fetches",
                        frontier.pending_count(),
                        frontier.in_flight()
                    );
                }
                all_workers.await
            }
        };

        let mut pages = Vec::new();
        for worker_results in joined {
            pages.extend(worker_results?);
        }

        let failures: Vec<FetchFailure> = pages
            .iter()
            .filter_map(|page| match &page.error {
                Some(error) if error.is_transport() => Some(FetchFailure {
                    url: page.url.clone(),
                    error: error.clone(),
                }),
                _ => None,
            })
            .collect();

        let report = CrawlReport {
            seed: seed.to_string(),
            origin: origin.to_string(),
            visited: frontier.visited(),
            pages,
            failures,
            dropped_links: frontier.dropped(),
            cancelled,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Crawl finished. Found {} unique pages ({} failed)",
            report.visited.len(),
            report.failures.len()
        );

        Ok(report)
    }

    /// Fetches one URL and classifies the response.
    ///
    /// Never fails: every problem is recorded on the returned result.
    async fn fetch_and_parse(
        fetcher: &F,
        url: &Url,
        origin: &Origin,
        request_timeout: Duration,
    ) -> (CrawlResult, Vec<Url>) {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let fetched = match tokio::time::timeout(request_timeout, fetcher.fetch(url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(error)) => {
                warn!("Error crawling {}: {}", url, error);
                return (CrawlResult::with_error(url.to_string(), error), Vec::new());
            }
            Err(_) => {
                warn!("Error crawling {}: timed out after {:?}", url, request_timeout);
                return (
                    CrawlResult::with_error(url.to_string(), FetchError::Timeout),
                    Vec::new(),
                );
            }
        };

        let mut result = CrawlResult::new(url.to_string());
        result.status_code = Some(fetched.status);
        result.content_type = fetched.content_type.clone();
        result.content_length = fetched.content_length;
        result.response_time = start.elapsed();

        if !fetched.is_success() {
            debug!("Skipping {}: HTTP {}", url, fetched.status);
            result.error = Some(FetchError::Status(fetched.status));
            return (result, Vec::new());
        }
        if !fetched.is_html() {
            debug!("Skipping {}: not HTML", url);
            result.error = Some(FetchError::NotHtml(fetched.content_type));
            return (result, Vec::new());
        }

        info!("Crawling: {}", url);
        let links = same_origin_links(&fetched.text(), url, origin);
        result.links_found = links.iter().map(|l| l.to_string()).collect();

        (result, links)
    }
}
