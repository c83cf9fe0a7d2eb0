//! Record store seam
//!
//! The pipeline owns no persisted state: reports are handed to an external
//! store keyed by analysis id. The trait keeps the coordinators decoupled
//! from any storage technology; [`MemoryStore`] backs tests and the CLI.

use crate::analysis::AnalysisBatchReport;
use crate::crawler::CrawlBatchReport;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur talking to the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// External record store, keyed by analysis id
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Registers the variation set for an analysis before engines run
    async fn save_variation_set(&self, analysis_id: &str, variations: &[String])
        -> StoreResult<()>;

    /// Persists a finished analysis report
    async fn save_analysis_report(&self, report: &AnalysisBatchReport) -> StoreResult<()>;

    /// Persists a finished crawl report
    async fn save_crawl_report(&self, report: &CrawlBatchReport) -> StoreResult<()>;
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryStore {
    variation_sets: Mutex<HashMap<String, Vec<String>>>,
    analysis_reports: Mutex<HashMap<String, AnalysisBatchReport>>,
    crawl_reports: Mutex<HashMap<String, CrawlBatchReport>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variation_set(&self, analysis_id: &str) -> Option<Vec<String>> {
        self.variation_sets
            .lock()
            .expect("store mutex poisoned")
            .get(analysis_id)
            .cloned()
    }

    pub fn analysis_report(&self, analysis_id: &str) -> Option<AnalysisBatchReport> {
        self.analysis_reports
            .lock()
            .expect("store mutex poisoned")
            .get(analysis_id)
            .cloned()
    }

    pub fn crawl_report(&self, analysis_id: &str) -> Option<CrawlBatchReport> {
        self.crawl_reports
            .lock()
            .expect("store mutex poisoned")
            .get(analysis_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn save_variation_set(
        &self,
        analysis_id: &str,
        variations: &[String],
    ) -> StoreResult<()> {
        self.variation_sets
            .lock()
            .expect("store mutex poisoned")
            .insert(analysis_id.to_string(), variations.to_vec());
        Ok(())
    }

    async fn save_analysis_report(&self, report: &AnalysisBatchReport) -> StoreResult<()> {
        self.analysis_reports
            .lock()
            .expect("store mutex poisoned")
            .insert(report.analysis_id.clone(), report.clone());
        Ok(())
    }

    async fn save_crawl_report(&self, report: &CrawlBatchReport) -> StoreResult<()> {
        self.crawl_reports
            .lock()
            .expect("store mutex poisoned")
            .insert(report.analysis_id.clone(), report.clone());
        Ok(())
    }
}
