//! Answer engine seam
//!
//! The actual LLM invocation is an external collaborator: the orchestrator
//! only sees an opaque async call that succeeds or fails per unit of work.
//! The trait exists so tests can substitute scripted engines.

use crate::config::EngineEntry;
use crate::ConfigError;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Classified failure of a single engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineFailure {
    /// The engine call exceeded its timeout
    #[error("engine call timed out")]
    Timeout,

    /// The engine answered with a non-2xx status
    #[error("engine returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Transport-level failure reaching the engine
    #[error("engine call failed: {message}")]
    Request { message: String },

    /// The cell was never invoked because the batch was cancelled
    #[error("batch cancelled before engine call")]
    Cancelled,
}

/// A successful answer from one engine for one variation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineAnswer {
    /// Name of the engine that produced the answer
    pub engine: String,

    /// The engine's answer text
    pub answer: String,
}

/// An external answer engine (to allow mocking)
#[async_trait::async_trait]
pub trait AnswerEngine: Send + Sync {
    /// Engine name as shown in progress snapshots and reports
    fn name(&self) -> &str;

    /// Analyzes one query variation
    async fn analyze(&self, base_query: &str, variation: &str)
        -> Result<EngineAnswer, EngineFailure>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineCallBody<'a> {
    base_query: &'a str,
    variation: &'a str,
}

/// An answer engine behind a plain HTTP endpoint
///
/// Posts `{ baseQuery, variation }` as JSON and treats the response body as
/// the answer text.
pub struct HttpEngine {
    name: String,
    endpoint: Url,
    client: Client,
    timeout: Duration,
}

impl HttpEngine {
    /// Builds an engine from a config entry and the shared HTTP client
    pub fn from_entry(client: Client, entry: &EngineEntry) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(&entry.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("engine '{}' endpoint: {}", entry.name, e))
        })?;
        Ok(Self {
            name: entry.name.clone(),
            endpoint,
            client,
            timeout: Duration::from_secs(entry.timeout_secs),
        })
    }
}

#[async_trait::async_trait]
impl AnswerEngine for HttpEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        base_query: &str,
        variation: &str,
    ) -> Result<EngineAnswer, EngineFailure> {
        let body = EngineCallBody {
            base_query,
            variation,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineFailure::Timeout
                } else {
                    EngineFailure::Request {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineFailure::HttpStatus {
                status: status.as_u16(),
            });
        }

        let answer = response.text().await.map_err(|e| EngineFailure::Request {
            message: e.to_string(),
        })?;

        Ok(EngineAnswer {
            engine: self.name.clone(),
            answer,
        })
    }
}
