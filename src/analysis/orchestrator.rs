//! Batch analysis orchestration
//!
//! Structurally parallel to the crawl coordinator, but keyed on
//! (variation × engine) cells: every variation is run through every
//! configured answer engine, failures are recorded per cell, and progress is
//! computed over cells so a partially processed variation contributes
//! fractional progress.

use crate::analysis::engine::{AnswerEngine, EngineAnswer, EngineFailure};
use crate::analysis::variations::{generate_variations, AnalysisRequest};
use crate::crawler::CancelHandle;
use crate::progress::{AnalysisProgress, AnalysisProgressTracker, AnalysisStage};
use crate::store::RecordStore;
use crate::{QueryscopeError, ValidationError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::watch;

/// A failed engine invocation for one variation
#[derive(Debug, Clone, Serialize)]
pub struct EngineCellFailure {
    /// Name of the engine that failed
    pub engine: String,

    /// The classified failure
    pub failure: EngineFailure,
}

/// Terminal outcome for one variation across all engines
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationOutcome {
    /// The query variation that was analyzed
    pub variation: String,

    /// Stable id for external record keeping
    pub record_id: String,

    /// Successful engine answers, in configured engine order
    pub answers: Vec<EngineAnswer>,

    /// Failed engine invocations, in configured engine order
    pub failures: Vec<EngineCellFailure>,
}

impl VariationOutcome {
    /// Names of engines that produced an answer
    pub fn succeeded_engines(&self) -> Vec<&str> {
        self.answers.iter().map(|a| a.engine.as_str()).collect()
    }

    /// Names of engines that failed
    pub fn failed_engines(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.engine.as_str()).collect()
    }

    /// True when every engine resolved successfully
    pub fn fully_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated result of a batch analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBatchReport {
    pub analysis_id: String,
    pub base_query: String,
    pub variations: Vec<VariationOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl AnalysisBatchReport {
    /// Number of (variation × engine) cells that succeeded
    pub fn succeeded_cell_count(&self) -> usize {
        self.variations.iter().map(|v| v.answers.len()).sum()
    }

    /// Number of (variation × engine) cells that failed
    pub fn failed_cell_count(&self) -> usize {
        self.variations.iter().map(|v| v.failures.len()).sum()
    }
}

/// Derives a stable record id for a variation within an analysis
///
/// External stores key per-variation records by this id, so it must not
/// depend on processing order.
pub fn variation_record_id(analysis_id: &str, variation: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(analysis_id.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(variation.as_bytes());
    hex::encode(hasher.finalize())
}

/// Coordinates a single analysis batch
///
/// Stage machine: `variations` (register the generated set with the record
/// store, no engine calls) → `llm_analysis` (invoke each engine per
/// variation, input order) → `completed`.
pub struct AnalysisOrchestrator {
    engines: Vec<Arc<dyn AnswerEngine>>,
    store: Arc<dyn RecordStore>,
    analysis_id: String,
    base_query: String,
    variations: Vec<String>,
    tracker: AnalysisProgressTracker,
    cancel: CancelHandle,
}

impl AnalysisOrchestrator {
    /// Creates an orchestrator for a validated request
    ///
    /// Variations are generated here, so the caller can inspect the set
    /// (and a malformed request fails before any engine sees it).
    pub fn new(
        engines: Vec<Arc<dyn AnswerEngine>>,
        store: Arc<dyn RecordStore>,
        analysis_id: String,
        request: AnalysisRequest,
    ) -> Result<Self, ValidationError> {
        request.validate()?;
        if engines.is_empty() {
            return Err(ValidationError::NoEngines);
        }

        let variations = generate_variations(&request);
        let tracker = AnalysisProgressTracker::new(variations.len(), engines.len());

        Ok(Self {
            engines,
            store,
            analysis_id,
            base_query: request.base_query,
            variations,
            tracker,
            cancel: CancelHandle::new(),
        })
    }

    /// The generated variation set, in processing order
    pub fn variations(&self) -> &[String] {
        &self.variations
    }

    /// Subscribe to progress snapshots for this batch
    pub fn subscribe(&self) -> watch::Receiver<AnalysisProgress> {
        self.tracker.subscribe()
    }

    /// Returns a handle that can cancel this batch from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the batch to completion
    ///
    /// An engine failure for one cell never halts the remaining engines or
    /// variations. Only record-store failures — infrastructure, not units —
    /// propagate as request-level errors.
    pub async fn run(mut self) -> Result<AnalysisBatchReport, QueryscopeError> {
        let started_at = Utc::now();

        tracing::info!(
            analysis_id = %self.analysis_id,
            variations = self.variations.len(),
            engines = self.engines.len(),
            "starting analysis batch"
        );

        // Stage: variations. Register the set before any engine call so the
        // external store can key incoming results.
        self.store
            .save_variation_set(&self.analysis_id, &self.variations)
            .await?;

        // Stage: llm_analysis. Variations in input order, engines in
        // configured order; current_llm names the engine in flight.
        self.tracker.enter_stage(AnalysisStage::LlmAnalysis);

        let mut outcomes = Vec::with_capacity(self.variations.len());
        for (index, variation) in self.variations.iter().enumerate() {
            self.tracker.begin_variation(index + 1);

            let mut answers = Vec::new();
            let mut failures = Vec::new();

            for engine in &self.engines {
                if self.cancel.is_cancelled() {
                    failures.push(EngineCellFailure {
                        engine: engine.name().to_string(),
                        failure: EngineFailure::Cancelled,
                    });
                    self.tracker.record_cell();
                    continue;
                }

                self.tracker.set_current_llm(Some(engine.name().to_string()));
                match engine.analyze(&self.base_query, variation).await {
                    Ok(answer) => answers.push(answer),
                    Err(failure) => {
                        tracing::warn!(
                            engine = engine.name(),
                            variation = %variation,
                            %failure,
                            "engine invocation failed"
                        );
                        failures.push(EngineCellFailure {
                            engine: engine.name().to_string(),
                            failure,
                        });
                    }
                }
                self.tracker.record_cell();
            }
            self.tracker.set_current_llm(None);

            outcomes.push(VariationOutcome {
                variation: variation.clone(),
                record_id: variation_record_id(&self.analysis_id, variation),
                answers,
                failures,
            });
        }

        self.tracker.enter_stage(AnalysisStage::Completed);

        let report = AnalysisBatchReport {
            analysis_id: self.analysis_id.clone(),
            base_query: self.base_query.clone(),
            variations: outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        self.store.save_analysis_report(&report).await?;

        tracing::info!(
            analysis_id = %report.analysis_id,
            succeeded_cells = report.succeeded_cell_count(),
            failed_cells = report.failed_cell_count(),
            "analysis batch completed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_is_stable_and_distinct() {
        let a = variation_record_id("analysis-1", "best crm");
        let b = variation_record_id("analysis-1", "best crm");
        let c = variation_record_id("analysis-1", "crm reviews");
        let d = variation_record_id("analysis-2", "best crm");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.len(), 64);
    }
}
