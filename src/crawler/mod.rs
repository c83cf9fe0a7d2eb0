//! Crawler module for compliance-aware page fetching
//!
//! This module contains the crawl side of the pipeline:
//! - HTTP fetching with timeout and failure classification
//! - Page title extraction
//! - Batch coordination under a bounded worker pool

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{
    crawl_batch, CancelHandle, CrawlBatchReport, CrawlBatchRequest, CrawlCoordinator,
    CrawlOutcome, MAX_BATCH_SIZE,
};
pub use fetcher::{build_http_client, fetch_page, FetchFailure, FetchOutcome};
pub use parser::extract_title;
