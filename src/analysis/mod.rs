//! Answer-engine analysis module
//!
//! Generates query variations and drives each one through the configured
//! answer engines, mirroring the per-unit outcome discipline of the crawl
//! coordinator.

mod engine;
mod orchestrator;
mod variations;

pub use engine::{AnswerEngine, EngineAnswer, EngineFailure, HttpEngine};
pub use orchestrator::{
    variation_record_id, AnalysisBatchReport, AnalysisOrchestrator, EngineCellFailure,
    VariationOutcome,
};
pub use variations::{
    generate_variations, AnalysisRequest, MAX_VARIATIONS, MIN_VARIATIONS,
};
