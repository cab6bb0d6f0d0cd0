use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use sitemapper_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
use sitemapper_core::report::{ReportFormat, render_report};
use sitemapper_core::{SitemapError, serialize, write_sitemap};
use sitemapper_scanner::{CrawlReport, ScanError, SeedUrl};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info};

pub const EXIT_INVALID_SEED: i32 = 1;
pub const EXIT_WRITE_FAILED: i32 = 2;
pub const EXIT_INTERNAL: i32 = 3;

/// Where the sitemap goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` means stdout, anything else is a path with `~` expanded.
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            OutputTarget::Stdout
        } else {
            let expanded = shellexpand::tilde(raw);
            OutputTarget::File(PathBuf::from(expanded.as_ref()))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            OutputTarget::Stdout => "stdout".to_string(),
            OutputTarget::File(path) => path.display().to_string(),
        }
    }
}

pub fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the fmt subscriber on stderr.
pub fn init_tracing(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbosity))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Resolves on Ctrl-C. If the handler can't be installed the crawl just runs to completion.
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(ScanError::InvalidSeed { .. }) = err.downcast_ref::<ScanError>() {
        EXIT_INVALID_SEED
    } else if err.downcast_ref::<SitemapError>().is_some() {
        EXIT_WRITE_FAILED
    } else {
        EXIT_INTERNAL
    }
}

pub fn crawl_options_from_matches(args: &ArgMatches) -> CrawlOptions {
    let defaults = CrawlOptions::default();

    CrawlOptions {
        url: args.get_one::<String>("URL").cloned().unwrap_or_default(),
        threads: args
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or(defaults.threads),
        request_timeout: args
            .get_one::<u64>("timeout")
            .map(|secs| Duration::from_secs(*secs))
            .unwrap_or(defaults.request_timeout),
        crawl_timeout: args
            .get_one::<u64>("max-duration")
            .map(|secs| Duration::from_secs(*secs)),
        max_frontier: args.get_one::<usize>("max-frontier").copied(),
        show_progress_bars: !args.get_flag("quiet"),
    }
}

/// Status lines. Sent to stderr when stdout carries the sitemap.
struct Console {
    quiet: bool,
    to_stderr: bool,
}

impl Console {
    fn line(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        if self.to_stderr {
            eprintln!("{}", msg.as_ref());
        } else {
            println!("{}", msg.as_ref());
        }
    }
}

/// Crawls the seed from `args`, writes the sitemap and prints the crawl report.
///
/// Per-page failures are part of the report, not errors. The returned error
/// chain carries a `ScanError` or `SitemapError` when one of those caused it.
pub async fn handle_generate(
    args: &ArgMatches,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<CrawlReport> {
    let options = crawl_options_from_matches(args);
    let target = OutputTarget::parse(
        args.get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("sitemap.xml"),
    );
    let format = args
        .get_one::<String>("format")
        .and_then(|f| f.parse::<ReportFormat>().ok())
        .unwrap_or(ReportFormat::Text);

    let console = Arc::new(Console {
        quiet: args.get_flag("quiet"),
        to_stderr: target == OutputTarget::Stdout,
    });

    let seed = SeedUrl::parse(&options.url)?;
    info!("Seed {} accepted, origin {}", seed, seed.origin());

    let console_clone = console.clone();
    let progress: CrawlProgressCallback = Arc::new(move |msg: String| {
        console_clone.line(format!("{} {}", "→".blue(), msg));
    });

    let report = execute_crawl(options, Some(progress), shutdown)
        .await
        .with_context(|| format!("Crawl of {} failed", seed))?;

    let document = serialize(&report.visited);
    info!(
        "Writing sitemap with {} entries to {}",
        document.len(),
        target.describe()
    );

    match &target {
        OutputTarget::File(path) => write_sitemap(&document, path)?,
        OutputTarget::Stdout => {
            document
                .write_to(io::stdout().lock())
                .map_err(|source| SitemapError::Write {
                    destination: target.describe(),
                    source,
                })?;
        }
    }

    console.line(format!(
        "{} Sitemap successfully generated and saved to '{}'",
        "✓".green().bold(),
        target.describe()
    ));

    if !console.quiet {
        let rendered =
            render_report(&report, format).context("Failed to render the crawl report")?;
        console.line(rendered);
    }

    Ok(report)
}
