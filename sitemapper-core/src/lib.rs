pub mod crawl;
pub mod error;
pub mod report;
pub mod sitemap;

use colored::Colorize;

pub use error::SitemapError;
pub use sitemap::{SitemapDocument, serialize, write_sitemap};

pub fn print_banner() {
    eprintln!(
        "{} {}",
        "sitemapper".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    eprintln!("{}", "crawl a site, write its sitemap.xml".bright_black());
    eprintln!();
}
