//! Progress and result records produced while a search runs.

use serde::{Deserialize, Serialize};

use super::{FeatureId, StrategyKind};

/// One recorded row of search history.
///
/// For the evolutionary variant every scored candidate is a level; for the
/// sequential variants a level is the best subset found after one feature
/// was added or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLevel {
    /// Features of the recorded subset.
    pub features: Vec<FeatureId>,
    /// Score of the recorded subset.
    pub score: f64,
    /// Feature added or removed to reach this level (sequential variants only).
    pub changed_feature: Option<FeatureId>,
}

/// Progress update delivered after each scored candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Strategy variant.
    pub strategy: StrategyKind,
    /// Generation (evolutionary) or level (sequential) counter.
    pub generation: usize,
    /// Planned number of generations/levels.
    pub total_iterations: usize,
    /// Oracle calls so far.
    pub evaluations: u64,
    /// Best score seen so far.
    pub best_score: f64,
    /// Score just recorded.
    pub last_score: f64,
    /// Features of the candidate just scored.
    pub last_features: Vec<FeatureId>,
    /// Distinct subsets with a known score.
    pub cached_subsets: usize,
}

/// Final result of a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best-scoring subset seen during the run.
    pub best_features: Vec<FeatureId>,
    /// Its score.
    pub best_score: f64,
    /// Rows recorded whenever the strategy completed a level.
    pub levels: Vec<FeatureLevel>,
    /// Column label describing what each level changed.
    pub change_label: String,
    /// Statistics from the run.
    pub stats: SearchStats,
}

/// Statistics from a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    /// Generations (or levels) reached.
    pub generations: usize,
    /// Oracle invocations.
    pub evaluations: u64,
    /// Distinct subsets with a known score.
    pub cached_subsets: usize,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason a search stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Configured generation count reached.
    MaxGenerations,
    /// Evolution produced only already-scored individuals.
    Converged,
    /// Sequential search reached the target subset size.
    SubsetSizeReached,
    /// Sequential search has no feature left to add or remove.
    FeaturesExhausted,
    /// Cancelled through the driver's handle.
    Cancelled,
}
