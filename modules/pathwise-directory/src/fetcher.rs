use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid listing URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.to_string())
    }
}

/// Fetches one page of a paginated listing. One attempt per call; see
/// [`fetch_with_retry`] for the retry schedule.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, page: u32) -> Result<String, FetchError>;

    fn name(&self) -> &str {
        "unknown"
    }
}

/// Linear backoff: the wait after failed attempt `n` is `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Fetch `page`, retrying failures until the policy's attempts run out.
/// Returns the last error when every attempt failed.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    page: u32,
    policy: RetryPolicy,
) -> Result<String, FetchError> {
    let mut attempt = 1;
    loop {
        match fetcher.fetch(page).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    fetcher = fetcher.name(),
                    page,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Page fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(fetcher = fetcher.name(), page, attempt, error = %e, "Page fetch failed, giving up");
                return Err(e);
            }
        }
    }
}

/// Plain HTTP GET against a URL template containing `{page}`.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    url_template: String,
    user_agent: String,
}

impl HttpPageFetcher {
    pub fn new(url_template: &str, user_agent: &str) -> Result<Self, FetchError> {
        if !url_template.contains("{page}") {
            return Err(FetchError::InvalidUrl(format!(
                "{url_template} has no {{page}} placeholder"
            )));
        }
        if !(url_template.starts_with("http://") || url_template.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(url_template.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, page: u32) -> Result<String, FetchError> {
        let url = self.page_url(page);
        debug!(url = %url, "Fetching listing page");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1_500));
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn builds_page_urls() {
        let fetcher = HttpPageFetcher::new("https://listing.test/colleges?page={page}", "bot").unwrap();
        assert_eq!(fetcher.page_url(3), "https://listing.test/colleges?page=3");
    }

    #[test]
    fn rejects_templates_without_page() {
        assert!(matches!(
            HttpPageFetcher::new("https://listing.test/colleges", "bot"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpPageFetcher::new("ftp://listing.test/{page}", "bot"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn recovers_within_retry_budget() {
        let fetcher = MockFetcher::new()
            .fail(1, FetchError::Http("reset".into()))
            .fail(1, FetchError::Http("reset".into()))
            .page(1, "<html>ok</html>");

        let body = fetch_with_retry(&fetcher, 1, RetryPolicy::new(3, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(body, "<html>ok</html>");
        assert_eq!(fetcher.attempts(1), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let fetcher = MockFetcher::new()
            .fail(2, FetchError::Http("timeout".into()))
            .fail(2, FetchError::Http("timeout".into()))
            .fail(2, FetchError::Status { status: 503, url: "u".into() })
            .page(2, "never reached");

        let err = fetch_with_retry(&fetcher, 2, RetryPolicy::new(3, Duration::ZERO))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Status { status: 503, url: "u".into() });
        assert_eq!(fetcher.attempts(2), 3);
    }
}
