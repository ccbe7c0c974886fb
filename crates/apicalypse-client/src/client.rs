//! Asynchronous Apicalypse client implementation.

use crate::Result;
use apicalypse_core::http::{ClientConfig, RetryPolicy};
use apicalypse_core::request::{self, QueryMode};
use apicalypse_core::{ApicalypseConfig, Error, FilterOption};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("apicalypse-client/", env!("CARGO_PKG_VERSION"));
const CLIENT_ID: HeaderName = HeaderName::from_static("client-id");

/// Executes queries against an endpoint and returns the raw JSON results.
///
/// Implemented by [`ApicalypseClient`]; [`crate::Paginator`] is written
/// against this trait so it can be driven by any executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run the query built from `options` against `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns validation errors from the options or transport errors from
    /// the request.
    async fn execute(
        &self,
        endpoint: &str,
        options: Vec<FilterOption>,
    ) -> Result<Vec<serde_json::Value>>;
}

/// Builder for [`ApicalypseClient`].
#[derive(Debug, Clone)]
pub struct ApicalypseClientBuilder {
    base_url: Url,
    http_config: ClientConfig,
    client_id: Option<String>,
    token: Option<String>,
    query_mode: QueryMode,
}

impl ApicalypseClientBuilder {
    /// Create a builder for the API at `base_url`.
    ///
    /// Endpoints are resolved relative to the base URL, so a missing trailing
    /// slash is added.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let mut url = Url::parse(base_url.as_ref()).map_err(|err| {
            Error::ConfigError(format!("Invalid base URL `{}`: {err}", base_url.as_ref()))
        })?;

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            http_config: ClientConfig::default(),
            client_id: None,
            token: None,
            query_mode: QueryMode::default(),
        })
    }

    /// Create a builder from a validated [`ApicalypseConfig`].
    pub fn from_config(config: &ApicalypseConfig) -> Result<Self> {
        let mut builder = Self::new(&config.base_url)?
            .with_http_config(ClientConfig::from_config(config))
            .with_query_mode(config.query_mode);

        if let Some(client_id) = &config.client_id {
            builder = builder.with_client_id(client_id.clone());
        }
        if let Some(token) = &config.access_token {
            builder = builder.with_token(token.clone());
        }

        Ok(builder)
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry_policy;
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Send a `Client-ID` header with every request.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Send an `Authorization: Bearer` header with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Choose whether queries travel in the body or the URL.
    #[must_use]
    pub const fn with_query_mode(mut self, mode: QueryMode) -> Self {
        self.query_mode = mode;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApicalypseClient> {
        let http = ClientBuilder::new()
            .timeout(self.http_config.timeout)
            .connect_timeout(self.http_config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        let client_id = self
            .client_id
            .as_deref()
            .map(|id| header_value("Client-ID", id))
            .transpose()?;
        let authorization = self
            .token
            .as_deref()
            .map(|token| header_value("Authorization", &format!("Bearer {token}")))
            .transpose()?
            .map(|mut value| {
                value.set_sensitive(true);
                value
            });

        Ok(ApicalypseClient {
            http,
            base_url: self.base_url,
            retry_policy: self.http_config.retry_policy,
            client_id,
            authorization,
            query_mode: self.query_mode,
        })
    }
}

/// Asynchronous client that sends Apicalypse queries.
#[derive(Debug, Clone)]
pub struct ApicalypseClient {
    http: Client,
    base_url: Url,
    retry_policy: RetryPolicy,
    client_id: Option<HeaderValue>,
    authorization: Option<HeaderValue>,
    query_mode: QueryMode,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

impl ApicalypseClient {
    /// Create a client for the given base URL with default settings.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        ApicalypseClientBuilder::new(base_url)?.build()
    }

    /// Create a client from a validated [`ApicalypseConfig`].
    pub fn from_config(config: &ApicalypseConfig) -> Result<Self> {
        ApicalypseClientBuilder::from_config(config)?.build()
    }

    /// Access the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Where queries are placed in outgoing requests.
    #[must_use]
    pub const fn query_mode(&self) -> QueryMode {
        self.query_mode
    }

    /// Run a query against `endpoint` and deserialize the results.
    pub async fn query<R>(&self, endpoint: &str, options: &[FilterOption]) -> Result<Vec<R>>
    where
        R: DeserializeOwned,
    {
        let request = self.prepare(endpoint, options)?;
        self.send(endpoint, &request).await
    }

    /// Count the results matching a query using `<endpoint>/count`.
    pub async fn query_count(&self, endpoint: &str, options: &[FilterOption]) -> Result<u64> {
        let path = format!("{}/count", endpoint.trim_end_matches('/'));
        let request = self.prepare(&path, options)?;
        let response: CountResponse = self.send(&path, &request).await?;
        Ok(response.count)
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        let normalized = path.trim_start_matches('/');

        self.base_url
            .join(normalized)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid endpoint `{path}`: {err}")))
    }

    fn prepare(&self, endpoint: &str, options: &[FilterOption]) -> Result<Request> {
        let mut url = self.build_url(endpoint)?;
        let method = match self.query_mode {
            QueryMode::Body => "POST",
            QueryMode::Url => {
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                "GET"
            }
        };

        let mut request = request::build(
            method,
            url.as_str(),
            options.iter().cloned(),
            self.query_mode,
        )?;

        let headers = request.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(client_id) = &self.client_id {
            headers.insert(CLIENT_ID, client_id.clone());
        }
        if let Some(authorization) = &self.authorization {
            headers.insert(AUTHORIZATION, authorization.clone());
        }

        Ok(request)
    }

    async fn send<R>(&self, endpoint: &str, template: &Request) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let mut attempt = 0;

        loop {
            let request = template.try_clone().ok_or_else(|| {
                Error::HttpError(format!("Request for `{endpoint}` cannot be retried"))
            })?;

            info!(endpoint, attempt, "Apicalypse request");

            let error = match self.http.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<R>().await.map_err(|err| {
                            Error::ParseError(format!(
                                "Failed to parse response for `{endpoint}`: {err}"
                            ))
                        });
                    }

                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    map_status_to_error(status, text)
                }
                Err(err) => Error::from(err),
            };

            attempt += 1;
            if !self.retry_policy.should_retry(attempt, &error) {
                if error.is_retryable() {
                    warn!(
                        endpoint,
                        attempts = attempt,
                        %error,
                        "Apicalypse request failed after retries"
                    );
                }
                return Err(error);
            }

            let delay = self.retry_policy.delay_for_attempt(attempt);
            if !delay.is_zero() {
                debug!("Retrying Apicalypse request after {:?}", delay);
                sleep(delay).await;
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for ApicalypseClient {
    async fn execute(
        &self,
        endpoint: &str,
        options: Vec<FilterOption>,
    ) -> Result<Vec<serde_json::Value>> {
        self.query(endpoint, &options).await
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|err| Error::ConfigError(format!("Invalid {name} header value: {err}")))
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(format!("API authentication failed: {text}"))
        }
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("API temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("API server error {status}: {text}"))
        }
        status if status.is_client_error() => {
            Error::BadRequest(format!("API rejected query with {status}: {text}"))
        }
        _ => Error::UnexpectedStatus(format!("{status}: {text}")),
    }
}
