use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Failed to write sitemap to {destination}: {source}")]
    Write {
        destination: String,
        #[source]
        source: std::io::Error,
    },
}
