use reqwest::header::HeaderValue;
use std::fmt::{Debug, Formatter};
use std::time::Duration;
use url::Url;

use crate::errors::{Result, WavefrontError};

const API_ROOT: &str = "/api/v2/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for a Wavefront tenant
///
/// # Example
///
/// ```rust
/// use wavefront_api::Config;
/// use std::time::Duration;
///
/// let config = Config::new("test.wavefront.com", "xxxx-xxxx-xxxx-xxxx-xxxx")
///     .with_timeout(Duration::from_secs(30));
///
/// assert_eq!(
///     config.base_url().unwrap().as_str(),
///     "https://test.wavefront.com/api/v2/"
/// );
/// ```
#[derive(Clone)]
pub struct Config {
    /// Tenant address, with or without scheme (`https` is assumed)
    pub address: String,

    /// API access token
    pub token: String,

    /// Proxy used for every request
    pub http_proxy: Option<String>,

    /// Accept invalid TLS certificates
    pub skip_tls_verify: bool,

    /// Request timeout
    pub timeout: Duration,
}

impl Config {
    /// Create a config with default proxy, TLS and timeout settings
    pub fn new(address: &str, token: &str) -> Self {
        Self {
            address: address.to_string(),
            token: token.to_string(),
            http_proxy: None,
            skip_tls_verify: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the config from the environment
    ///
    /// - `WAVEFRONT_ADDRESS` (required)
    /// - `WAVEFRONT_TOKEN` (required)
    /// - `WAVEFRONT_HTTP_PROXY`
    /// - `WAVEFRONT_SKIP_TLS_VERIFY` (`true` or `1`)
    /// - `WAVEFRONT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| WavefrontError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(&required("WAVEFRONT_ADDRESS")?, &required("WAVEFRONT_TOKEN")?);

        config.http_proxy = lookup("WAVEFRONT_HTTP_PROXY").filter(|proxy| !proxy.is_empty());
        config.skip_tls_verify = lookup("WAVEFRONT_SKIP_TLS_VERIFY")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        if let Some(secs) = lookup("WAVEFRONT_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                WavefrontError::Config(format!("WAVEFRONT_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Route requests through a proxy
    pub fn with_http_proxy(mut self, proxy: &str) -> Self {
        self.http_proxy = Some(proxy.to_string());
        self
    }

    /// Accept invalid TLS certificates
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// API root derived from the address, e.g. `https://test.wavefront.com/api/v2/`
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or is not a usable base URL.
    pub fn base_url(&self) -> Result<Url> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(WavefrontError::Config("address must not be empty".to_string()));
        }

        let address = if address.contains("://") {
            address.to_string()
        } else {
            format!("https://{address}")
        };

        let mut url = Url::parse(&address)
            .map_err(|e| WavefrontError::Config(format!("invalid address {address}: {e}")))?;

        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(WavefrontError::Config(format!(
                "address {address} has no host"
            )));
        }

        url.set_path(API_ROOT);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// `Authorization` header value for the token
    pub(crate) fn authorization(&self) -> Result<HeaderValue> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(WavefrontError::Config("token must not be empty".to_string()));
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            WavefrontError::Config("token contains characters not allowed in a header".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("http_proxy", &self.http_proxy)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}
