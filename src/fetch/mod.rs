// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT},
    Client,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::SourceConfig;

/// Build the one HTTP client used for the page fetch: bounded timeout and
/// the static header set (User-Agent + session cookie) applied to every
/// request.
pub fn build_client(config: &SourceConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).context("invalid user agent header")?,
    );
    if !config.session_cookie.is_empty() {
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&config.session_cookie).context("invalid cookie header")?,
        );
    }

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()
        .context("building http client")
}

async fn get_text_core(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    Ok(client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))?)
}

async fn get_text_with_retry(
    client: &Client,
    url: &Url,
    max_retries: u32,
    initial_backoff_ms: u64,
) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_text_core(client, url).await {
            Ok(t) => return Ok(t),
            Err(e) if attempts < max_retries => {
                attempts += 1;
                let backoff = initial_backoff_ms * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(e);
            }
        }
    }
}

/// Fetch the holdings page body as UTF-8 text.
pub async fn fetch_page(config: &SourceConfig) -> Result<String> {
    let client = build_client(config)?;
    let url = Url::parse(&config.url).with_context(|| format!("invalid url {}", config.url))?;
    get_text_with_retry(&client, &url, config.max_retries, config.retry_backoff_ms).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;

    #[test]
    fn client_rejects_bad_cookie() {
        let config = SourceConfig {
            session_cookie: "session=\nnewline".to_string(),
            ..SourceConfig::default()
        };
        assert!(build_client(&config).is_err());
    }

    #[test]
    fn client_builds_with_defaults() {
        assert!(build_client(&SourceConfig::default()).is_ok());
    }
}
