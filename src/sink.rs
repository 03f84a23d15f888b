//! Time-series sink.
//!
//! `Sink` is the seam the sampling loop writes through. `InfluxClient`
//! implements it against the InfluxDB 1.x HTTP API (`/ping`, `/query`,
//! `/write`).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::SinkError;
use crate::point::BatchPoints;

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations the sampler needs from the time-series database.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Creates the database unless it already exists.
    async fn ensure_database(&self, name: &str) -> Result<(), SinkError>;

    async fn write(&self, batch: &BatchPoints) -> Result<(), SinkError>;

    /// Releases the session. Called once when the sampler stops.
    async fn close(&self) {}
}

/// Address and credentials of the InfluxDB server.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl SinkConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementResult {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Parses and normalizes a sink address. Only http and https are accepted.
pub fn parse_address(address: &str) -> Result<Url, SinkError> {
    let invalid = |reason: String| SinkError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let mut url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    // Keep a path prefix (reverse proxies) when joining endpoint names
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// HTTP session to an InfluxDB 1.x server.
#[derive(Debug, Clone)]
pub struct InfluxClient {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxClient {
    /// Opens a session and verifies the server answers `/ping`.
    pub async fn connect(config: &SinkConfig) -> Result<Self, SinkError> {
        let base_url = parse_address(&config.address)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::Transport {
                endpoint: "client",
                source: e,
            })?;

        let session = Self {
            client,
            base_url,
            username: config.username.clone().filter(|u| !u.is_empty()),
            password: config.password.clone(),
        };

        let version = session.ping().await?;
        info!(
            "Connected to InfluxDB at {} (version {})",
            session.base_url,
            version.as_deref().unwrap_or("unknown")
        );

        Ok(session)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, name: &'static str) -> Result<Url, SinkError> {
        self.base_url
            .join(name)
            .map_err(|e| SinkError::InvalidAddress {
                address: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_ref()),
            None => request,
        }
    }

    /// Checks the server is reachable; returns the reported version.
    pub async fn ping(&self) -> Result<Option<String>, SinkError> {
        let request = self.authorize(self.client.get(self.endpoint("ping")?));
        let response = send("ping", request).await?;
        let response = check_status("ping", response).await?;

        Ok(response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// Runs an InfluxQL statement and fails on any reported error.
    pub async fn query(&self, statement: &str) -> Result<(), SinkError> {
        debug!("Executing query: {}", statement);

        let request = self
            .authorize(self.client.post(self.endpoint("query")?))
            .form(&[("q", statement)]);
        let response = send("query", request).await?;
        let response = check_status("query", response).await?;

        let body: QueryResponse = response.json().await.map_err(|e| SinkError::Transport {
            endpoint: "query",
            source: e,
        })?;

        if let Some(error) = body.error {
            return Err(SinkError::Response(error));
        }
        if let Some(error) = body.results.into_iter().find_map(|r| r.error) {
            return Err(SinkError::Response(error));
        }

        Ok(())
    }
}

#[async_trait]
impl Sink for InfluxClient {
    async fn ensure_database(&self, name: &str) -> Result<(), SinkError> {
        // CREATE DATABASE is a no-op when the database exists
        self.query(&format!("CREATE DATABASE \"{}\"", name.replace('"', "\\\"")))
            .await
    }

    async fn write(&self, batch: &BatchPoints) -> Result<(), SinkError> {
        if batch.points.is_empty() {
            return Ok(());
        }

        let request = self
            .authorize(self.client.post(self.endpoint("write")?))
            .query(&[
                ("db", batch.database.as_str()),
                ("precision", batch.precision.as_str()),
            ])
            .body(batch.to_body());
        let response = send("write", request).await?;
        check_status("write", response).await?;

        debug!("Wrote {} point(s) to {}", batch.points.len(), batch.database);
        Ok(())
    }

    async fn close(&self) {
        info!("Closing InfluxDB session to {}", self.base_url);
    }
}

async fn send(endpoint: &'static str, request: RequestBuilder) -> Result<Response, SinkError> {
    request
        .send()
        .await
        .map_err(|e| SinkError::Transport { endpoint, source: e })
}

async fn check_status(endpoint: &'static str, response: Response) -> Result<Response, SinkError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SinkError::Unauthorized {
            status: status.as_u16(),
        });
    }
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());

    Err(SinkError::Status {
        endpoint,
        status: status.as_u16(),
        message,
    })
}
