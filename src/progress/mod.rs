//! Progress reporting for batch operations
//!
//! Both coordinators publish immutable progress snapshots through a
//! `tokio::sync::watch` channel: the owning coordinator is the sole mutator,
//! observers only ever see derived snapshots. Stages advance in a fixed
//! order; a backward transition is a logic error, clamped and logged rather
//! than surfaced to the observer.

use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

/// Stages of a batch crawl, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStage {
    /// Batch accepted, bookkeeping in progress
    Extracting,
    /// Crawl policies are being checked per URL
    CheckingRobots,
    /// Allowed pages are being fetched
    Crawling,
    /// Every unit has a terminal outcome
    Completed,
}

impl CrawlStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::CheckingRobots => "checking_robots",
            Self::Crawling => "crawling",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stages of a batch analysis, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Variation set is being registered
    Variations,
    /// Answer engines are being invoked per variation
    LlmAnalysis,
    /// Every cell has a terminal outcome
    Completed,
}

impl AnalysisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Variations => "variations",
            Self::LlmAnalysis => "llm_analysis",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress snapshot for a batch crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlProgress {
    pub stage: CrawlStage,
    pub current: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Progress snapshot for a batch analysis
///
/// `percentage` is computed from completed (variation × engine) cells, so a
/// partially processed variation contributes fractional progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisProgress {
    pub stage: AnalysisStage,
    #[serde(rename = "currentVariation")]
    pub current_variation: usize,
    #[serde(rename = "totalVariations")]
    pub total_variations: usize,
    #[serde(rename = "currentLLM")]
    pub current_llm: Option<String>,
    pub percentage: f64,
}

/// Derives a percentage from counters, clamped to [0, 100]
fn percentage(current: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (current as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Tracks and publishes progress for a batch crawl
///
/// Owned exclusively by the crawl coordinator; everyone else observes
/// through [`CrawlProgressTracker::subscribe`].
pub struct CrawlProgressTracker {
    stage: CrawlStage,
    current: usize,
    total: usize,
    tx: watch::Sender<CrawlProgress>,
    rx: watch::Receiver<CrawlProgress>,
}

impl CrawlProgressTracker {
    pub fn new(total: usize) -> Self {
        let initial = CrawlProgress {
            stage: CrawlStage::Extracting,
            current: 0,
            total,
            percentage: 0.0,
        };
        let (tx, rx) = watch::channel(initial);
        Self {
            stage: CrawlStage::Extracting,
            current: 0,
            total,
            tx,
            rx,
        }
    }

    /// Subscribe to progress snapshots
    pub fn subscribe(&self) -> watch::Receiver<CrawlProgress> {
        self.rx.clone()
    }

    /// Advances to a later stage
    ///
    /// A backward transition is clamped (the later stage is kept) and logged
    /// as a logic error. The unit counter resets on the transition into
    /// `Crawling` and snaps to `total` on `Completed`.
    pub fn enter_stage(&mut self, stage: CrawlStage) {
        if stage < self.stage {
            tracing::error!(
                from = %self.stage,
                to = %stage,
                "backward crawl stage transition clamped"
            );
            return;
        }
        if stage == CrawlStage::Crawling && self.stage < CrawlStage::Crawling {
            self.current = 0;
        }
        if stage == CrawlStage::Completed {
            self.current = self.total;
        }
        self.stage = stage;
        self.publish();
    }

    /// Records one finished unit within the current stage
    pub fn record_unit(&mut self) {
        self.current = (self.current + 1).min(self.total);
        self.publish();
    }

    /// Current snapshot
    pub fn snapshot(&self) -> CrawlProgress {
        CrawlProgress {
            stage: self.stage,
            current: self.current,
            total: self.total,
            percentage: if self.stage.is_terminal() {
                100.0
            } else {
                percentage(self.current, self.total)
            },
        }
    }

    fn publish(&self) {
        // Observers must see 100% only alongside the terminal stage; the
        // fully-counted snapshot is folded into the Completed one that
        // immediately follows.
        if !self.stage.is_terminal() && self.total > 0 && self.current == self.total {
            return;
        }
        let _ = self.tx.send(self.snapshot());
    }
}

/// Tracks and publishes progress for a batch analysis
pub struct AnalysisProgressTracker {
    stage: AnalysisStage,
    cells_done: usize,
    total_cells: usize,
    current_variation: usize,
    total_variations: usize,
    current_llm: Option<String>,
    tx: watch::Sender<AnalysisProgress>,
    rx: watch::Receiver<AnalysisProgress>,
}

impl AnalysisProgressTracker {
    pub fn new(total_variations: usize, engine_count: usize) -> Self {
        let total_cells = total_variations * engine_count;
        let initial = AnalysisProgress {
            stage: AnalysisStage::Variations,
            current_variation: 0,
            total_variations,
            current_llm: None,
            percentage: 0.0,
        };
        let (tx, rx) = watch::channel(initial);
        Self {
            stage: AnalysisStage::Variations,
            cells_done: 0,
            total_cells,
            current_variation: 0,
            total_variations,
            current_llm: None,
            tx,
            rx,
        }
    }

    /// Subscribe to progress snapshots
    pub fn subscribe(&self) -> watch::Receiver<AnalysisProgress> {
        self.rx.clone()
    }

    /// Advances to a later stage; backward transitions are clamped and logged
    pub fn enter_stage(&mut self, stage: AnalysisStage) {
        if stage < self.stage {
            tracing::error!(
                from = %self.stage,
                to = %stage,
                "backward analysis stage transition clamped"
            );
            return;
        }
        if stage == AnalysisStage::Completed {
            self.cells_done = self.total_cells;
            self.current_variation = self.total_variations;
            self.current_llm = None;
        }
        self.stage = stage;
        self.publish();
    }

    /// Marks the variation currently being processed (1-based, input order)
    pub fn begin_variation(&mut self, index: usize) {
        self.current_variation = self.current_variation.max(index);
        self.publish();
    }

    /// Names the engine currently in flight, or clears it
    pub fn set_current_llm(&mut self, engine: Option<String>) {
        self.current_llm = engine;
        self.publish();
    }

    /// Records one resolved (variation × engine) cell
    pub fn record_cell(&mut self) {
        self.cells_done = (self.cells_done + 1).min(self.total_cells);
        self.publish();
    }

    /// Current snapshot
    pub fn snapshot(&self) -> AnalysisProgress {
        AnalysisProgress {
            stage: self.stage,
            current_variation: self.current_variation,
            total_variations: self.total_variations,
            current_llm: self.current_llm.clone(),
            percentage: if self.stage.is_terminal() {
                100.0
            } else {
                percentage(self.cells_done, self.total_cells)
            },
        }
    }

    fn publish(&self) {
        // Same rule as the crawl tracker: 100% is only ever observed on the
        // terminal snapshot.
        if !self.stage.is_terminal() && self.total_cells > 0 && self.cells_done == self.total_cells
        {
            return;
        }
        let _ = self.tx.send(self.snapshot());
    }
}
