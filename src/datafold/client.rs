use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Request, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_retry::{Action, Condition, RetryIf};

use crate::config::Config;
use crate::datafold::DatafoldError;
use crate::datafold::graphql::GraphQlResponse;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Connection settings for a Datafold GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct DatafoldConfig {
    pub host: String,
    pub api_key: String,
    pub data_source_id: i64,
    pub retries: u32,
    /// Delay before the first retry; the n-th retry waits n times this.
    pub backoff: Duration,
    /// Skip TLS certificate verification.
    pub insecure: bool,
}

impl DatafoldConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            data_source_id: 3,
            retries: 3,
            backoff: RETRY_BACKOFF,
            insecure: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, DatafoldError> {
        match (&config.datafold_url, &config.datafold_api_key) {
            (Some(host), Some(api_key)) if !host.is_empty() && !api_key.is_empty() => Ok(Self {
                host: host.clone(),
                api_key: api_key.clone(),
                data_source_id: config.datafold_data_source_id,
                retries: config.datafold_retries,
                backoff: RETRY_BACKOFF,
                insecure: config.datafold_insecure,
            }),
            _ => Err(DatafoldError::MissingCredentials),
        }
    }

    /// Linear backoff, one delay per allowed retry.
    fn retry_strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        let base = self.backoff;
        (1..).map(move |n: u32| base * n).take(self.retries as usize)
    }
}

pub struct DatafoldClient {
    http: Client,
    config: DatafoldConfig,
}

impl DatafoldClient {
    pub fn new(config: DatafoldConfig) -> Result<Self, DatafoldError> {
        if config.insecure {
            log::warn!("TLS verification disabled for {}", config.host);
        }
        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &DatafoldConfig {
        &self.config
    }

    /// Builds the POST carrying `query`, without sending it.
    pub fn build_request(&self, query: &str) -> Result<Request, DatafoldError> {
        graphql_request(&self.http, &self.config, query)
    }

    /// Runs a GraphQL query and decodes its `data`.
    ///
    /// Connection failures, timeouts and 5xx answers are retried up to
    /// `retries` times; anything else fails straight away.
    pub async fn execute<T: DeserializeOwned>(&self, query: &str) -> Result<T, DatafoldError> {
        let action = SendQuery {
            http: self.http.clone(),
            config: self.config.clone(),
            query: query.to_string(),
        };
        let response =
            RetryIf::spawn(self.config.retry_strategy(), action, TransientFailure).await?;
        let body: GraphQlResponse<T> = response.json().await?;
        into_data(body)
    }
}

fn graphql_request(
    http: &Client,
    config: &DatafoldConfig,
    query: &str,
) -> Result<Request, DatafoldError> {
    let request = http
        .post(&config.host)
        .header(AUTHORIZATION, format!("Key {}", config.api_key))
        .header(CONTENT_TYPE, "application/json")
        .json(&json!({ "query": query }))
        .build()?;
    Ok(request)
}

/// One POST of a query. Non-success answers become `DatafoldError::Status`.
struct SendQuery {
    http: Client,
    config: DatafoldConfig,
    query: String,
}

impl Action for SendQuery {
    type Future = Pin<Box<dyn Future<Output = Result<Self::Item, Self::Error>> + Send>>;
    type Item = Response;
    type Error = DatafoldError;

    fn run(&mut self) -> Self::Future {
        let request = graphql_request(&self.http, &self.config, &self.query);
        Box::pin(send(self.http.clone(), request))
    }
}

async fn send(
    http: Client,
    request: Result<Request, DatafoldError>,
) -> Result<Response, DatafoldError> {
    let response = http.execute(request?).await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DatafoldError::Status { status, body })
}

/// Retries transport failures and 5xx answers only.
struct TransientFailure;

impl Condition<DatafoldError> for TransientFailure {
    fn should_retry(&mut self, error: &DatafoldError) -> bool {
        let transient = match error {
            DatafoldError::Http(e) => is_transient(e),
            DatafoldError::Status { status, .. } => status.is_server_error(),
            _ => false,
        };
        if transient {
            log::warn!("datafold request failed: {error}");
        }
        transient
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request()
}

/// Unwraps the `data` of a GraphQL response, failing on reported errors.
pub fn into_data<T>(response: GraphQlResponse<T>) -> Result<T, DatafoldError> {
    if !response.errors.is_empty() {
        let messages = response
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(DatafoldError::GraphQl(messages));
    }
    response.data.ok_or(DatafoldError::MissingData)
}
