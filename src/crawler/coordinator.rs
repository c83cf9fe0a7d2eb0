//! Batch crawl coordination
//!
//! Fans a batch of URLs through policy checking and page fetching under a
//! bounded worker pool, aggregating one terminal outcome per input URL. The
//! coordinator is the sole mutator of batch state: each unit's result lands
//! in the slot matching its input position, so completion order never
//! disturbs result order.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_page, FetchFailure, FetchOutcome};
use crate::progress::{CrawlProgress, CrawlProgressTracker, CrawlStage};
use crate::robots::check_policy_batch;
use crate::ValidationError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Maximum number of URLs accepted in a single crawl batch
pub const MAX_BATCH_SIZE: usize = 10;

/// A request to crawl a batch of URLs for one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlBatchRequest {
    /// URLs to crawl, 1 to [`MAX_BATCH_SIZE`] entries
    pub urls: Vec<String>,

    /// Identifier of the analysis this batch belongs to
    pub analysis_id: String,
}

impl CrawlBatchRequest {
    /// Validates the request shape
    ///
    /// Called before any network activity; a violation fails the whole
    /// request immediately.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.urls.is_empty() || self.urls.len() > MAX_BATCH_SIZE {
            return Err(ValidationError::BatchSize {
                got: self.urls.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        if self.analysis_id.trim().is_empty() {
            return Err(ValidationError::MissingAnalysisId);
        }
        Ok(())
    }
}

/// Terminal outcome for one URL in a crawl batch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CrawlOutcome {
    /// Page fetched successfully
    #[serde(rename_all = "camelCase")]
    Fetched {
        url: String,
        status_code: u16,
        title: Option<String>,
        content: String,
    },

    /// Fetch skipped because the site's crawl policy disallows the path
    #[serde(rename_all = "camelCase")]
    SkippedByPolicy { url: String, reason: String },

    /// Fetch failed; the failure is classified, recorded, and isolated
    #[serde(rename_all = "camelCase")]
    Failed {
        url: String,
        failure: FetchFailure,
    },
}

impl CrawlOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Fetched { url, .. } | Self::SkippedByPolicy { url, .. } | Self::Failed { url, .. } => url,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedByPolicy { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Aggregated result of a crawl batch
///
/// Contains exactly one outcome per input URL, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlBatchReport {
    pub analysis_id: String,
    pub outcomes: Vec<CrawlOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlBatchReport {
    pub fn fetched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fetched()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }
}

/// Cooperative cancellation handle for a running batch
///
/// Cancelling stops scheduling new units; in-flight units run to completion
/// or time out, and the batch still reports a terminal state covering every
/// input unit.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Coordinates a single crawl batch
///
/// Constructed per batch; validation happens in [`CrawlCoordinator::new`] so
/// a malformed request never reaches the network. Progress can be observed
/// through [`CrawlCoordinator::subscribe`] before the batch is started.
pub struct CrawlCoordinator {
    client: Client,
    config: CrawlerConfig,
    request: CrawlBatchRequest,
    tracker: CrawlProgressTracker,
    cancel: CancelHandle,
}

impl CrawlCoordinator {
    /// Creates a coordinator for a validated request
    pub fn new(
        client: Client,
        config: CrawlerConfig,
        request: CrawlBatchRequest,
    ) -> Result<Self, ValidationError> {
        request.validate()?;
        let tracker = CrawlProgressTracker::new(request.urls.len());
        Ok(Self {
            client,
            config,
            request,
            tracker,
            cancel: CancelHandle::new(),
        })
    }

    /// Subscribe to progress snapshots for this batch
    pub fn subscribe(&self) -> watch::Receiver<CrawlProgress> {
        self.tracker.subscribe()
    }

    /// Returns a handle that can cancel this batch from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the batch to completion
    ///
    /// Stage machine: `extracting` → `checking_robots` → `crawling` →
    /// `completed`. Per-URL failures are isolated; the report always maps
    /// every input URL to exactly one outcome.
    pub async fn run(mut self) -> CrawlBatchReport {
        let started_at = Utc::now();
        let urls = self.request.urls.clone();
        let total = urls.len();

        tracing::info!(
            analysis_id = %self.request.analysis_id,
            urls = total,
            "starting crawl batch"
        );

        // Stage: checking_robots. Policy fetches run uncapped; one fetch per
        // distinct origin, each URL gets its own decision. The unit counter
        // stays at zero until crawling so the observed percentage never
        // regresses across the stage transition.
        self.tracker.enter_stage(CrawlStage::CheckingRobots);
        let decisions = check_policy_batch(&self.client, &self.config, &urls).await;

        // Stage: crawling. Fetches run under the bounded worker pool; each
        // result is written to the slot matching its input position.
        self.tracker.enter_stage(CrawlStage::Crawling);
        let mut slots: Vec<Option<CrawlOutcome>> = (0..total).map(|_| None).collect();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches));
        let mut tasks: JoinSet<(usize, String, FetchOutcome)> = JoinSet::new();

        for (index, url) in urls.iter().enumerate() {
            if let Some(decision) = decisions.get(url) {
                if !decision.allowed {
                    let reason = decision
                        .reason
                        .clone()
                        .unwrap_or_else(|| "disallowed by robots.txt".to_string());
                    tracing::info!(url = %url, %reason, "skipping URL disallowed by policy");
                    slots[index] = Some(CrawlOutcome::SkippedByPolicy {
                        url: url.clone(),
                        reason,
                    });
                    self.tracker.record_unit();
                    continue;
                }
            }

            if self.cancel.is_cancelled() {
                slots[index] = Some(CrawlOutcome::Failed {
                    url: url.clone(),
                    failure: FetchFailure::Cancelled,
                });
                self.tracker.record_unit();
                continue;
            }

            let client = self.client.clone();
            let config = self.config.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let url = url.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            index,
                            url,
                            FetchOutcome::Failed(FetchFailure::Internal {
                                message: "worker pool closed".to_string(),
                            }),
                        );
                    }
                };
                // Re-check after waiting for a permit: cancellation stops
                // scheduling, it does not abort in-flight fetches.
                if cancel.is_cancelled() {
                    return (index, url, FetchOutcome::Failed(FetchFailure::Cancelled));
                }
                let outcome = fetch_page(&client, &config, &url).await;
                (index, url, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, url, outcome)) => {
                    let outcome = match outcome {
                        FetchOutcome::Fetched {
                            content,
                            status_code,
                            title,
                        } => CrawlOutcome::Fetched {
                            url,
                            status_code,
                            title,
                            content,
                        },
                        FetchOutcome::Failed(failure) => {
                            tracing::warn!(url = %url, %failure, "page fetch failed");
                            CrawlOutcome::Failed { url, failure }
                        }
                    };
                    slots[index] = Some(outcome);
                    self.tracker.record_unit();
                }
                Err(e) => {
                    tracing::error!(error = %e, "crawl worker task failed");
                    // The slot stays empty here and is reconciled below so
                    // the URL still maps to an outcome.
                }
            }
        }

        let outcomes: Vec<CrawlOutcome> = slots
            .into_iter()
            .zip(urls.iter())
            .map(|(slot, url)| {
                slot.unwrap_or_else(|| CrawlOutcome::Failed {
                    url: url.clone(),
                    failure: FetchFailure::Internal {
                        message: "worker task failed".to_string(),
                    },
                })
            })
            .collect();

        self.tracker.enter_stage(CrawlStage::Completed);

        let report = CrawlBatchReport {
            analysis_id: self.request.analysis_id.clone(),
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            analysis_id = %report.analysis_id,
            fetched = report.fetched_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "crawl batch completed"
        );

        report
    }
}

/// Convenience wrapper: validate, run, and return the aggregated report
pub async fn crawl_batch(
    client: &Client,
    config: &CrawlerConfig,
    request: CrawlBatchRequest,
) -> Result<CrawlBatchReport, ValidationError> {
    let coordinator = CrawlCoordinator::new(client.clone(), config.clone(), request)?;
    Ok(coordinator.run().await)
}
