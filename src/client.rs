use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::alerts::Alert;
use crate::config::Config;
use crate::errors::{Result, WavefrontError};
use crate::resource::Resource;
use crate::targets::Target;

/// Client for the Wavefront management API
///
/// # Example
///
/// ```rust,no_run
/// use wavefront_api::{Alert, Client, Config, Severity};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new(&Config::new("test.wavefront.com", "xxxx-xxxx-xxxx"))?;
///
///     let mut alert = Alert::classic("HighCPU", "ts(servers.cpu.usage) > 90", Severity::Warn)
///         .with_target("ops@example.com");
///
///     client.alerts().create(&mut alert).await?;
///     println!("alert ID is {}", alert.id.as_deref().unwrap_or_default());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    client: ClientWithMiddleware,
    base_url: Url,
    authorization: HeaderValue,
}

/// Wrapper every Wavefront API response comes in
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: Option<ResponseStatus>,
    response: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseStatus {
    #[serde(default)]
    result: String,
    #[serde(default)]
    message: Option<String>,
}

impl Client {
    /// Create a new Wavefront client
    ///
    /// # Errors
    ///
    /// Returns an error if the address, token or proxy in `config` is invalid,
    /// or if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);

        if let Some(proxy) = &config.http_proxy {
            let proxy = Proxy::all(proxy.as_str())
                .map_err(|e| WavefrontError::Config(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        #[cfg(any(feature = "native-tls", feature = "rustls-tls"))]
        {
            builder = builder.danger_accept_invalid_certs(config.skip_tls_verify);
        }

        #[cfg(not(any(feature = "native-tls", feature = "rustls-tls")))]
        if config.skip_tls_verify {
            return Err(WavefrontError::Config(
                "skip_tls_verify requires a TLS feature".to_string(),
            ));
        }

        let client = builder.build().map_err(WavefrontError::BuildHttpClient)?;
        let client = ClientBuilder::new(client).build();

        Self::with_client(client, config)
    }

    /// Create a new client with a custom reqwest middleware client
    ///
    /// This allows you to add custom middleware (retry, logging, etc.).
    /// Timeout, proxy and TLS settings in `config` are ignored; they belong
    /// to the supplied client.
    pub fn with_client(client: ClientWithMiddleware, config: &Config) -> Result<Self> {
        Ok(Self {
            client,
            base_url: config.base_url()?,
            authorization: config.authorization()?,
        })
    }

    /// Alerts collection
    pub fn alerts(&self) -> Resource<'_, Alert> {
        Resource::new(self)
    }

    /// Alert targets collection
    pub fn targets(&self) -> Resource<'_, Target> {
        Resource::new(self)
    }

    /// Get the base API URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of `segments` below the API root
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WavefrontError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated request builder
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, self.authorization.clone())
            .header(ACCEPT, "application/json")
    }

    /// Send a request and return the raw body of a successful response
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(WavefrontError::Request)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WavefrontError::Api {
                status: status.as_u16(),
                message: error_message(body),
            });
        }

        response.text().await.map_err(WavefrontError::ReadBody)
    }

    /// Send a request and unwrap the `response` payload of the envelope
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        kind: &'static str,
    ) -> Result<T> {
        let body = self.execute(request).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(WavefrontError::Decode)?;

        if let Some(status) = &envelope.status {
            debug!(result = %status.result, "Wavefront responded");
        }

        envelope.response.ok_or(WavefrontError::EmptyResponse { kind })
    }
}

/// Prefer the envelope's status message, fall back to the raw body
fn error_message(body: String) -> String {
    serde_json::from_str::<Envelope<serde::de::IgnoredAny>>(&body)
        .ok()
        .and_then(|envelope| envelope.status)
        .and_then(|status| status.message)
        .filter(|message| !message.is_empty())
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(mock_server: &MockServer) -> Client {
        Client::new(&Config::new(&mock_server.uri(), "test-token")).unwrap()
    }

    #[test]
    fn test_base_url_getter() {
        let client = Client::new(&Config::new("test.wavefront.com", "token")).unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://test.wavefront.com/api/v2/"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(matches!(
            Client::new(&Config::new("", "token")),
            Err(WavefrontError::Config(_))
        ));
        assert!(matches!(
            Client::new(&Config::new("test.wavefront.com", "")),
            Err(WavefrontError::Config(_))
        ));
        assert!(matches!(
            Client::new(&Config::new("test.wavefront.com", "token").with_http_proxy("::not a proxy::")),
            Err(WavefrontError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint() {
        let client = Client::new(&Config::new("test.wavefront.com", "token")).unwrap();
        assert_eq!(
            client.endpoint(&["alert", "1528835423"]).unwrap().as_str(),
            "https://test.wavefront.com/api/v2/alert/1528835423"
        );
        assert_eq!(
            client.endpoint(&["notificant", "a b"]).unwrap().as_str(),
            "https://test.wavefront.com/api/v2/notificant/a%20b"
        );
    }

    #[tokio::test]
    async fn test_send_unwraps_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/alert/42"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": {"result": "OK", "message": "", "code": 200},
                "response": {"id": "42"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let url = client.endpoint(&["alert", "42"]).unwrap();
        let response: Value = client
            .send(client.request(Method::GET, url), "alert")
            .await
            .unwrap();

        assert_eq!(response["id"], "42");
    }

    #[tokio::test]
    async fn test_send_empty_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/alert/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": {"result": "OK", "code": 200}
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let url = client.endpoint(&["alert", "42"]).unwrap();
        let result: Result<Value> = client.send(client.request(Method::GET, url), "alert").await;

        assert!(matches!(
            result,
            Err(WavefrontError::EmptyResponse { kind: "alert" })
        ));
    }

    #[tokio::test]
    async fn test_api_error_uses_status_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/alert/42"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": {"result": "ERROR", "message": "Alert 42 does not exist", "code": 404}
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let url = client.endpoint(&["alert", "42"]).unwrap();
        let result: Result<Value> = client.send(client.request(Method::GET, url), "alert").await;

        match result {
            Err(err @ WavefrontError::Api { .. }) => {
                assert!(err.is_not_found());
                assert_eq!(
                    err.to_string(),
                    "Wavefront API error: HTTP 404 - Alert 42 does not exist"
                );
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_plain_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/alert"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service unavailable"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let url = client.endpoint(&["alert"]).unwrap();
        let result = client.execute(client.request(Method::POST, url)).await;

        if let Err(WavefrontError::Api { status, message }) = &result {
            assert_eq!(*status, 503);
            assert_eq!(message, "Service unavailable");
        } else {
            panic!("Expected Api error");
        }
        assert!(result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_send_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/alert/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let url = client.endpoint(&["alert", "42"]).unwrap();
        let result: Result<Value> = client.send(client.request(Method::GET, url), "alert").await;

        assert!(matches!(result, Err(WavefrontError::Decode(_))));
    }
}
