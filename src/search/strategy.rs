//! Strategy facade dispatching over the closed set of search variants.

use crate::schema::{
    FeatureId, FeatureLevel, Genotype, Objective, SearchConfig, StopReason, StrategyKind,
};

use super::error::SearchError;
use super::evolutionary::EvolutionaryStrategy;
use super::sequential::{Direction, SequentialStrategy};

/// Where a strategy stands in the score/advance protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// A candidate was handed out and the driver owes its score.
    AwaitingScore,
    /// The candidate is scored; the driver must call `prepare_new_round`.
    Scored,
    /// A termination condition fired. Terminal.
    Terminated,
}

/// Any search variant behind one contract.
///
/// Drivers only use the methods below and never match on the variant.
pub enum SearchStrategy {
    Evolutionary(EvolutionaryStrategy),
    SequentialForward(SequentialStrategy),
    SequentialBackward(SequentialStrategy),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            SearchStrategy::Evolutionary($s) => $body,
            SearchStrategy::SequentialForward($s) => $body,
            SearchStrategy::SequentialBackward($s) => $body,
        }
    };
}

impl SearchStrategy {
    /// Build the variant named by `config.strategy`.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(match config.strategy {
            StrategyKind::Evolutionary => Self::Evolutionary(EvolutionaryStrategy::new(config)?),
            StrategyKind::SequentialForward => {
                Self::SequentialForward(SequentialStrategy::new(config, Direction::Forward)?)
            }
            StrategyKind::SequentialBackward => {
                Self::SequentialBackward(SequentialStrategy::new(config, Direction::Backward)?)
            }
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Evolutionary(_) => StrategyKind::Evolutionary,
            Self::SequentialForward(_) => StrategyKind::SequentialForward,
            Self::SequentialBackward(_) => StrategyKind::SequentialBackward,
        }
    }

    pub fn continue_loop(&self) -> bool {
        dispatch!(self, s => s.continue_loop())
    }

    pub fn round_state(&self) -> RoundState {
        dispatch!(self, s => s.round_state())
    }

    pub fn current_candidate(&self) -> &Genotype {
        dispatch!(self, s => s.current_candidate())
    }

    pub fn included_features(&self) -> Vec<FeatureId> {
        dispatch!(self, s => s.included_features())
    }

    pub fn add_score(&mut self, score: f64) -> Result<(), SearchError> {
        dispatch!(self, s => s.add_score(score))
    }

    pub fn prepare_new_round(&mut self) -> Result<(), SearchError> {
        dispatch!(self, s => s.prepare_new_round())
    }

    pub fn set_objective(&mut self, objective: Objective) -> Result<(), SearchError> {
        dispatch!(self, s => s.set_objective(objective))
    }

    /// `set_objective` taking the minimize flag directly.
    pub fn set_minimize(&mut self, minimize: bool) -> Result<(), SearchError> {
        self.set_objective(Objective::from_minimize(minimize))
    }

    pub fn objective(&self) -> Objective {
        dispatch!(self, s => s.objective())
    }

    pub fn current_best_score(&self) -> f64 {
        dispatch!(self, s => s.current_best_score())
    }

    pub fn best_features(&self) -> Option<Vec<FeatureId>> {
        dispatch!(self, s => s.best_features())
    }

    /// Row the driver should record before calling `prepare_new_round`.
    pub fn completed_level(&self) -> Option<FeatureLevel> {
        dispatch!(self, s => s.completed_level())
    }

    pub fn name_for_last_change(&self) -> &'static str {
        match self {
            Self::Evolutionary(_) => "Selected features",
            Self::SequentialForward(s) | Self::SequentialBackward(s) => s.name_for_last_change(),
        }
    }

    pub fn last_best_features(&self) -> Vec<FeatureId> {
        dispatch!(self, s => s.last_best_features())
    }

    pub fn number_of_iterations(&self) -> usize {
        dispatch!(self, s => s.number_of_iterations())
    }

    pub fn current_feature(&self) -> Option<FeatureId> {
        match self {
            Self::Evolutionary(_) => None,
            Self::SequentialForward(s) | Self::SequentialBackward(s) => s.current_feature(),
        }
    }

    /// Candidates whose scores the driver may compute ahead of time.
    pub fn pending_candidates(&self) -> Vec<Vec<FeatureId>> {
        dispatch!(self, s => s.pending_candidates())
    }

    /// Generation (evolutionary) or level (sequential) counter.
    pub fn generation(&self) -> usize {
        match self {
            Self::Evolutionary(s) => s.generation(),
            Self::SequentialForward(s) | Self::SequentialBackward(s) => s.level(),
        }
    }

    pub fn evaluations(&self) -> u64 {
        dispatch!(self, s => s.evaluations())
    }

    /// Distinct subsets with a known score.
    pub fn cached_subsets(&self) -> usize {
        match self {
            Self::Evolutionary(s) => s.cache().len(),
            Self::SequentialForward(s) | Self::SequentialBackward(s) => s.evaluations() as usize,
        }
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        dispatch!(self, s => s.stop_reason())
    }
}

impl From<EvolutionaryStrategy> for SearchStrategy {
    fn from(strategy: EvolutionaryStrategy) -> Self {
        Self::Evolutionary(strategy)
    }
}

impl From<SequentialStrategy> for SearchStrategy {
    fn from(strategy: SequentialStrategy) -> Self {
        match strategy.direction() {
            Direction::Forward => Self::SequentialForward(strategy),
            Direction::Backward => Self::SequentialBackward(strategy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_selects_variant() {
        for kind in [
            StrategyKind::Evolutionary,
            StrategyKind::SequentialForward,
            StrategyKind::SequentialBackward,
        ] {
            let config = SearchConfig::with_feature_count(3)
                .with_strategy(kind)
                .with_seed(1);
            let strategy = SearchStrategy::from_config(&config).unwrap();
            assert_eq!(strategy.kind(), kind);
            assert!(strategy.continue_loop());
            assert_eq!(strategy.round_state(), RoundState::AwaitingScore);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig::new(vec![]);
        assert!(matches!(
            SearchStrategy::from_config(&config),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_set_minimize_resets_best() {
        let config = SearchConfig::with_feature_count(3).with_seed(2);
        let mut strategy = SearchStrategy::from_config(&config).unwrap();
        strategy.set_minimize(true).unwrap();
        assert_eq!(strategy.objective(), Objective::Minimize);
        assert_eq!(strategy.current_best_score(), f64::INFINITY);
    }

    #[test]
    fn test_change_labels() {
        let config = SearchConfig::with_feature_count(2).with_seed(3);
        let evolutionary = SearchStrategy::from_config(&config).unwrap();
        assert_eq!(evolutionary.name_for_last_change(), "Selected features");
        assert_eq!(evolutionary.current_feature(), None);

        let forward = SearchStrategy::from_config(
            &config.clone().with_strategy(StrategyKind::SequentialForward),
        )
        .unwrap();
        assert_eq!(forward.name_for_last_change(), "Added feature");
        assert_eq!(forward.current_feature(), Some(0));
    }
}
