use crate::error::{FetchError, Result};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What the transport hands back for one URL.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Page-fetch transport used by the crawler.
///
/// The crawler puts its own timeout around every call, so implementations
/// do not have to enforce one.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        url: &Url,
    ) -> impl Future<Output = std::result::Result<FetchedPage, FetchError>> + Send;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "Sitemapper/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/trapdoorsec/sitemapper)"
            ))
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> std::result::Result<FetchedPage, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;

        let mut page = FetchedPage {
            status: response.status().as_u16(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string()),
            content_length: response.content_length(),
            body: Vec::new(),
        };

        // Bodies of pages we will not parse are left unread.
        if page.is_success() && page.is_html() {
            page.body = response.bytes().await?.to_vec();
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn page(status: u16, content_type: Option<&str>) -> FetchedPage {
        FetchedPage {
            status,
            content_type: content_type.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_html_with_charset() {
        assert!(page(200, Some("text/html; charset=utf-8")).is_html());
        assert!(page(200, Some("Text/HTML")).is_html());
    }

    #[test]
    fn test_is_html_rejects_other_types() {
        assert!(!page(200, Some("application/json")).is_html());
        assert!(!page(200, Some("application/xhtml+xml")).is_html());
        assert!(!page(200, None).is_html());
    }

    #[test]
    fn test_is_success_range() {
        assert!(page(200, None).is_success());
        assert!(page(204, None).is_success());
        assert!(!page(301, None).is_success());
        assert!(!page(404, None).is_success());
        assert!(!page(500, None).is_success());
    }

    #[tokio::test]
    async fn test_http_fetcher_reads_html_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html><body>hi</body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let fetched = fetcher.fetch(&url).await.unwrap();

        assert_eq!(fetched.status, 200);
        assert!(fetched.is_html());
        assert_eq!(fetched.text(), "<html><body>hi</body></html>");
    }

    #[tokio::test]
    async fn test_http_fetcher_skips_non_html_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_bytes(b"{\"a\":1}"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let url = Url::parse(&format!("{}/data.json", server.uri())).unwrap();
        let fetched = fetcher.fetch(&url).await.unwrap();

        assert_eq!(fetched.status, 200);
        assert!(fetched.body.is_empty());
    }

    #[tokio::test]
    async fn test_http_fetcher_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let fetched = fetcher.fetch(&url).await.unwrap();

        assert_eq!(fetched.status, 404);
        assert!(!fetched.is_success());
    }

    #[tokio::test]
    async fn test_http_fetcher_connection_refused() {
        // Bind then drop a listener to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = HttpFetcher::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_http_fetcher_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(100)).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert_eq!(err, FetchError::Timeout);
    }
}
