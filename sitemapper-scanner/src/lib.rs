pub mod crawler;
pub mod error;
pub mod fetch;
pub mod frontier;
pub mod links;
pub mod result;
pub mod scope;

pub use crawler::{Crawler, DEFAULT_WORKERS, ProgressCallback, ResultCallback};
pub use error::{FetchError, LinkError, ScanError};
pub use fetch::{DEFAULT_REQUEST_TIMEOUT, FetchedPage, Fetcher, HttpFetcher};
pub use result::{CrawlReport, CrawlResult, FetchFailure};
pub use scope::{Origin, SeedUrl};
