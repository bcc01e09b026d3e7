//! Remote task source speaking the tarkov.dev GraphQL API.
//!
//! One request per fetch, no retries and no caching; the response either
//! becomes a task list or a typed [`FetchError`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::cache::CacheKey;
use crate::config::Config;
use crate::model::Task;

pub const DEFAULT_ENDPOINT: &str = "https://api.tarkov.dev/graphql";

const TASK_FIELDS: &str = r#"
    id
    name
    trader { name normalizedName }
    map { name normalizedName }
    taskRequirements { task { id name } status }
    traderRequirements { trader { name } level }
    kappaRequired
    lightkeeperRequired
    experience
    minPlayerLevel
    wikiLink
    objectives {
      id
      type
      description
      optional
    }
    finishRewards {
      items { item { id name iconLink } quantity }
      traderStanding { trader { name } standing }
    }
"#;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("remote responded with status {status}")]
    Transport { status: u16 },
    #[error("unexpected response shape: {0}")]
    Schema(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http client unavailable: {0}")]
    Client(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait TaskSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    async fn fetch(&self, key: &CacheKey) -> Result<Vec<Task>, FetchError>;
}

pub struct GraphqlTaskSource {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphqlTaskSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| FetchError::Client(error.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FetchError> {
        Self::new(&cfg.endpoint, Duration::from_millis(cfg.request_timeout_ms))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TaskSource for GraphqlTaskSource {
    fn source_name(&self) -> &'static str {
        "graphql"
    }

    async fn fetch(&self, key: &CacheKey) -> Result<Vec<Task>, FetchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body(key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let tasks = parse_response(&body)?;
        tracing::debug!(key = %key, count = tasks.len(), "fetched tasks from remote");
        Ok(tasks)
    }
}

pub fn request_body(key: &CacheKey) -> Value {
    match key.name_filter() {
        None => json!({
            "query": format!("query Tasks {{ tasks {{ {TASK_FIELDS} }} }}"),
        }),
        Some(name) => json!({
            "query": format!(
                "query TasksByName($name: String) {{ tasks(name: $name) {{ {TASK_FIELDS} }} }}"
            ),
            "variables": { "name": name },
        }),
    }
}

/// Extracts `data.tasks` from a GraphQL response body.
pub fn parse_response(body: &str) -> Result<Vec<Task>, FetchError> {
    let mut payload: Value = serde_json::from_str(body)
        .map_err(|error| FetchError::Schema(format!("invalid json: {error}")))?;

    let Some(tasks) = payload
        .get_mut("data")
        .and_then(|data| data.get_mut("tasks"))
        .map(Value::take)
    else {
        return Err(FetchError::Schema(missing_tasks_message(&payload)));
    };

    if !tasks.is_array() {
        return Err(FetchError::Schema("data.tasks is not a list".to_string()));
    }

    let tasks: Vec<Task> = serde_json::from_value(tasks)
        .map_err(|error| FetchError::Schema(format!("malformed task record: {error}")))?;

    if let Some(position) = tasks.iter().position(|task| task.name.trim().is_empty()) {
        return Err(FetchError::Schema(format!(
            "task at index {position} has an empty name"
        )));
    }

    Ok(tasks)
}

fn missing_tasks_message(payload: &Value) -> String {
    let first_error = payload
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str);

    match first_error {
        Some(message) => format!("missing data.tasks (server error: {message})"),
        None => "missing data.tasks".to_string(),
    }
}
