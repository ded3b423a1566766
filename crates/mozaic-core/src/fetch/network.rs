//! HTTP strategy for browser-like hosts: one GET per module.

use super::FetchError;
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct NetworkFetcher {
    http: Client,
}

impl NetworkFetcher {
    /// Create a fetcher with its own HTTP client.
    ///
    /// No timeout is set here; the module loader owns timeout policy.
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("mozaic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { http })
    }

    /// Issue a GET and return the body once the response has completed.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(url).send().await.map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "module request failed");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(http_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_http_error() {
        let fetcher = NetworkFetcher::new().unwrap();
        let err = fetcher.fetch_text("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
        assert!(err.to_string().contains("not a url"));
    }
}
