// Crawl report rendering

use crate::crawl::generate_crawl_report;
use serde::{Deserialize, Serialize};
use sitemapper_scanner::result::CrawlReport;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown report format '{0}' (expected text or json)")]
pub struct UnknownReportFormat(pub String);

impl FromStr for ReportFormat {
    type Err = UnknownReportFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(UnknownReportFormat(s.to_string())),
        }
    }
}

pub fn render_report(
    report: &CrawlReport,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_crawl_report(report)),
        ReportFormat::Json => generate_json_report(report),
    }
}

pub fn generate_json_report(report: &CrawlReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sitemapper",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "crawl": {
                "seed": report.seed,
                "origin": report.origin,
                "start_time": report.started_at.to_rfc3339(),
                "end_time": report.finished_at.to_rfc3339(),
                "duration_ms": report.elapsed().num_milliseconds(),
                "cancelled": report.cancelled
            },
            "summary": {
                "visited": report.visited.len(),
                "parsed": report.parsed_count(),
                "skipped": report.skipped_count(),
                "failed": report.failures.len(),
                "dropped_links": report.dropped_links
            },
            "visited": report.visited,
            "failures": report.failures,
            "pages": report.pages
        }
    });

    serde_json::to_string_pretty(&json_report)
}
