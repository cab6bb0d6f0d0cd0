use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sitemapper_scanner::result::{CrawlReport, CrawlResult};
use sitemapper_scanner::{Crawler, ScanError};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub threads: usize,
    pub request_timeout: Duration,
    pub crawl_timeout: Option<Duration>,
    pub max_frontier: Option<usize>,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            threads: sitemapper_scanner::DEFAULT_WORKERS,
            request_timeout: sitemapper_scanner::DEFAULT_REQUEST_TIMEOUT,
            crawl_timeout: None,
            max_frontier: None,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options.
///
/// Crawls until the site is exhausted, `shutdown` resolves or the crawl
/// timeout elapses. Only an invalid seed URL is an error.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    shutdown: impl Future<Output = ()>,
) -> Result<CrawlReport, ScanError> {
    let CrawlOptions {
        url,
        threads,
        request_timeout,
        crawl_timeout,
        max_frontier,
        show_progress_bars,
    } = options;

    if let Some(ref callback) = progress_callback {
        callback(format!("Starting crawl at: {}", url));
    }

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: sitemapper_scanner::ProgressCallback =
        if let Some(ref pb) = progress_bar {
            let pb_clone = pb.clone();
            let count_clone = processed_count.clone();
            Arc::new(move |_worker_id: usize, url: String| {
                let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
                pb_clone.set_message(format!("[{}] {}", count, extract_url_path(&url)));
            })
        } else {
            let count_clone = processed_count.clone();
            Arc::new(move |_worker_id: usize, _url: String| {
                count_clone.fetch_add(1, Ordering::Relaxed);
            })
        };

    let crawler = Crawler::with_timeout(request_timeout)?
        .with_crawl_timeout(crawl_timeout)
        .with_max_frontier(max_frontier)
        .with_progress_callback(internal_progress_callback);

    let result = crawler.crawl_until(&url, threads, shutdown).await;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    let report = result?;
    debug!(
        "Crawl of {} processed {} URLs",
        report.seed,
        processed_count.load(Ordering::Relaxed)
    );

    if let Some(ref callback) = progress_callback {
        let total = processed_count.load(Ordering::Relaxed);
        if report.cancelled {
            callback(format!("Crawl stopped early after {} URLs", total));
        }
        callback(format!(
            "Crawl finished. Found {} unique pages.",
            report.visited.len()
        ));
    }

    Ok(report)
}

/// Generate a human-readable crawl report
pub fn generate_crawl_report(report: &CrawlReport) -> String {
    let mut out = String::new();
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!("  Seed: {}\n", report.seed));
    out.push_str(&format!("  Pages visited: {}\n", report.visited.len()));
    out.push_str(&format!("  Pages parsed: {}\n", report.parsed_count()));
    out.push_str(&format!("  Pages skipped: {}\n", report.skipped_count()));
    out.push_str(&format!("  Fetch failures: {}\n", report.failures.len()));

    let total_links: usize = report.pages.iter().map(|r| r.links_found.len()).sum();
    out.push_str(&format!("  Total links found: {}\n", total_links));

    if report.dropped_links > 0 {
        out.push_str(&format!(
            "  Links dropped (frontier full): {}\n",
            report.dropped_links
        ));
    }

    let elapsed = report.elapsed();
    out.push_str(&format!(
        "  Duration: {}.{:03}s\n",
        elapsed.num_seconds(),
        elapsed.num_milliseconds().rem_euclid(1000)
    ));

    if report.cancelled {
        out.push_str(&format!(
            "  {}\n",
            "Crawl was stopped early, results are partial".yellow()
        ));
    }

    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Sorted by path so the listing reads like the sitemap
    let pages: BTreeMap<&str, &CrawlResult> =
        report.pages.iter().map(|r| (r.url.as_str(), r)).collect();

    out.push_str(&format!("## {}\n", report.origin));
    out.push_str(&format!("  {} pages found\n\n", pages.len()));

    for result in pages.values() {
        let path = extract_url_path(&result.url);

        let status_str = match result.status_code {
            Some(code @ 200..=299) => code.to_string().green().to_string(),
            Some(code @ 300..=399) => code.to_string().cyan().to_string(),
            Some(code @ 400..=499) => code.to_string().yellow().to_string(),
            Some(code @ 500..=599) => code.to_string().red().to_string(),
            Some(code) => code.to_string(),
            None => "---".red().to_string(),
        };

        let mut line = format!("  {} {}", status_str, path);

        if let Ok(parsed) = Url::parse(&result.url)
            && let Some(query) = parsed.query()
        {
            line.push('?');
            line.push_str(query);
        }

        // Only show MIME type if it's not text/html
        if let Some(ref content_type) = result.content_type
            && !content_type.contains("text/html")
        {
            line.push_str(&format!(" {}", content_type.bright_black()));
        }

        if let Some(ref error) = result.error
            && error.is_transport()
        {
            line.push_str(&format!(" {}", error.to_string().red()));
        }

        out.push_str(&line);
        out.push('\n');
    }

    if !report.failures.is_empty() {
        out.push_str("\n## Failures\n");
        for failure in &report.failures {
            out.push_str(&format!("  [!] {}: {}\n", failure.url, failure.error));
        }
    }

    out
}
