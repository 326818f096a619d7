//! Overpass HTTP client.
//!
//! Sends Overpass QL as a form-encoded POST, enforces each query's time
//! budget and races the exchange against a cancellation token. There is no
//! retry here; callers decide what a failure means.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::cancel::CancelToken;
use super::error::OverpassError;
use super::query::OverpassQuery;
use super::types::{OverpassElement, OverpassResponse};

/// Default public Overpass endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

const DEFAULT_USER_AGENT: &str = concat!("openlocalmap-server/", env!("CARGO_PKG_VERSION"));

/// Anything that can run an Overpass query.
///
/// The route pipeline only talks to Overpass through this trait, so it can be
/// backed by the HTTP client, a cache, or a canned mock.
pub trait QueryExecutor: Send + Sync + 'static {
    /// Run `query`, giving up when its timeout elapses or `cancel` fires.
    fn execute(
        &self,
        query: &OverpassQuery,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<Vec<OverpassElement>, OverpassError>> + Send;
}

impl<E: QueryExecutor> QueryExecutor for Arc<E> {
    fn execute(
        &self,
        query: &OverpassQuery,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<Vec<OverpassElement>, OverpassError>> + Send {
        (**self).execute(query, cancel)
    }
}

/// Configuration for the Overpass client.
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter URL
    pub endpoint: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
}

impl OverpassConfig {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom endpoint (for testing or a private instance).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Status and body of an HTTP exchange, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// The wire underneath [`OverpassClient`].
pub trait Transport: Send + Sync + 'static {
    /// POST `query` and return whatever came back.
    ///
    /// Only failures to get a response at all are errors here; HTTP error
    /// statuses are returned as responses.
    fn post(&self, query: &str) -> impl Future<Output = Result<RawResponse, OverpassError>> + Send;
}

/// reqwest-backed transport sending `data=<query>` form bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &OverpassConfig) -> Result<Self, OverpassError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn post(&self, query: &str) -> Result<RawResponse, OverpassError> {
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Overpass API client.
///
/// Uses a semaphore to limit concurrent requests; Overpass instances
/// rate-limit per client address.
#[derive(Debug, Clone)]
pub struct OverpassClient<T = HttpTransport> {
    transport: T,
    semaphore: Arc<Semaphore>,
}

impl OverpassClient<HttpTransport> {
    /// Create an HTTP client with the given configuration.
    pub fn new(config: OverpassConfig) -> Result<Self, OverpassError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config.max_concurrent))
    }
}

impl<T: Transport> OverpassClient<T> {
    pub fn with_transport(transport: T, max_concurrent: usize) -> Self {
        Self {
            transport,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    async fn exchange(&self, query: &OverpassQuery) -> Result<Vec<OverpassElement>, OverpassError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| OverpassError::Transport {
                message: "client shut down".to_string(),
            })?;

        let response = self.transport.post(query.text()).await?;
        interpret(response)
    }
}

impl<T: Transport> QueryExecutor for OverpassClient<T> {
    async fn execute(
        &self,
        query: &OverpassQuery,
        cancel: &CancelToken,
    ) -> Result<Vec<OverpassElement>, OverpassError> {
        if cancel.is_cancelled() {
            return Err(OverpassError::Cancelled);
        }

        let started = Instant::now();
        debug!(query = query.text(), timeout = ?query.timeout(), "Overpass query");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OverpassError::Cancelled),
            outcome = tokio::time::timeout(query.timeout(), self.exchange(query)) => {
                outcome.unwrap_or(Err(OverpassError::Timeout { after: query.timeout() }))
            }
        };

        match &result {
            Ok(elements) => debug!(
                elements = elements.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Overpass query finished"
            ),
            Err(OverpassError::Cancelled) => debug!("Overpass query cancelled"),
            Err(e) => warn!(error = %e, "Overpass query failed"),
        }

        result
    }
}

/// Turn a raw exchange into elements or a typed error.
fn interpret(response: RawResponse) -> Result<Vec<OverpassElement>, OverpassError> {
    if response.status != 200 {
        return Err(OverpassError::Status {
            status: response.status,
            body: response.body,
        });
    }

    let parsed: OverpassResponse = serde_json::from_str(&response.body)
        .map_err(|e| OverpassError::parse(&e, &response.body))?;

    Ok(parsed.elements)
}
