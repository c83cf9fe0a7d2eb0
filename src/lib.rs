//! Queryscope: compliance-aware batch crawling and answer-engine analysis
//!
//! This crate checks each site's published crawl policy before fetching,
//! classifies fetch failures instead of throwing them, and drives bounded
//! batches of per-URL crawls and per-variation answer-engine analyses while
//! publishing monotonic progress snapshots.

pub mod analysis;
pub mod config;
pub mod crawler;
pub mod progress;
pub mod robots;
pub mod store;

use thiserror::Error;

/// Main error type for queryscope operations
///
/// Unit-level failures (a single fetch, a single engine call) are not errors:
/// they are recorded as typed outcomes inside batch reports. This type covers
/// request-level failures only.
#[derive(Debug, Error)]
pub enum QueryscopeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Record store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Request-level input validation failures
///
/// These are surfaced immediately, before any network activity is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("urls must contain between 1 and {max} entries, got {got}")]
    BatchSize { got: usize, max: usize },

    #[error("analysisId cannot be empty")]
    MissingAnalysisId,

    #[error("baseQuery cannot be empty")]
    MissingBaseQuery,

    #[error("count must be between {min} and {max}, got {got}")]
    CountOutOfRange { got: u32, min: u32, max: u32 },

    #[error("no answer engines configured")]
    NoEngines,
}

/// Result type alias for queryscope operations
pub type Result<T> = std::result::Result<T, QueryscopeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use analysis::{AnalysisBatchReport, AnalysisOrchestrator, AnalysisRequest, AnswerEngine};
pub use config::Config;
pub use crawler::{CrawlBatchReport, CrawlBatchRequest, CrawlCoordinator, CrawlOutcome};
pub use progress::{AnalysisProgress, AnalysisStage, CrawlProgress, CrawlStage};
pub use robots::PolicyDecision;
