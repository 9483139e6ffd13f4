//! HTTP client for embed page and player asset requests

use crate::error::DecipherError;
use crate::platform::player::DEFAULT_ORIGIN;
use rand::Rng;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// Desktop browser user agent used when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Value of the `Origin` header
    pub origin: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            proxy_url: None,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

/// Thin wrapper over `reqwest` that sends the platform's expected headers
#[derive(Debug, Clone)]
pub struct PlayerClient {
    client: Client,
    config: HttpClientConfig,
    consent_id: u32,
}

impl PlayerClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, DecipherError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, DecipherError> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            config,
            consent_id: rand::thread_rng().gen_range(100..999),
        })
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request with origin, fetch-mode and consent headers
    pub fn create_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Origin", &self.config.origin)
            .header("Sec-Fetch-Mode", "navigate")
            .header("Cookie", self.consent_cookie())
    }

    fn consent_cookie(&self) -> String {
        format!("CONSENT=YES+cb.20210328-17-p0.en+FX+{}", self.consent_id)
    }

    /// Fetch `url` and return the body, mapping non-2xx to `AssetUnavailable`
    pub async fn get_text(&self, url: &str) -> Result<String, DecipherError> {
        debug!("HTTP GET {}", url);

        let response = self
            .create_request(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP GET {} failed with status: {}", url, status);
            return Err(DecipherError::AssetUnavailable(format!(
                "GET {} returned status {}",
                url, status
            )));
        }

        debug!("HTTP GET {} succeeded with status: {}", url, status);
        response.text().await.map_err(|e| transport_error(url, e))
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> DecipherError {
    if error.is_timeout() {
        DecipherError::Timeout(format!("GET {}", url))
    } else {
        DecipherError::AssetUnavailable(format!("GET {}: {}", url, error))
    }
}
