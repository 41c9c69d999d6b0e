//! HTML page fetching.

use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::error::{ExtractError, ExtractResult};

/// A fetched page: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// HTTP client for album pages.
///
/// Wraps a [`reqwest::Client`] configured with the user agent and timeout
/// from [`Config`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Build a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &Config) -> ExtractResult<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self { http })
    }

    /// Fetch `url`, failing on any non-success status.
    pub async fn fetch(&self, url: &str) -> ExtractResult<FetchedPage> {
        log::debug!("fetching {url}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("fetch of {url} returned {status}");
            return Err(ExtractError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        log::info!("fetched {} bytes from {url}", body.len());
        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_config() {
        let config = Config {
            http_timeout_secs: 5,
            ..Config::default()
        };
        assert!(HttpFetcher::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let config = Config {
            http_timeout_secs: 1,
            ..Config::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/album").await.unwrap_err();
        assert!(matches!(err, ExtractError::Request(_)));
        assert_eq!(err.kind(), "IOError");
    }
}
