//! Sequential forward/backward feature selection.
//!
//! Each level tries every single-feature change of the committed subset
//! (adding one missing feature, or removing one present feature), then commits
//! the change with the best score. No population is kept.

use crate::schema::{FeatureId, FeatureLevel, Genotype, Objective, SearchConfig, StopReason};

use super::error::SearchError;
use super::strategy::RoundState;

/// Whether features are added to or removed from the committed subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Stepwise search sharing the evolutionary strategy's round protocol.
pub struct SequentialStrategy {
    features: Vec<FeatureId>,
    direction: Direction,
    target_size: Option<usize>,
    objective: Objective,
    selected: Vec<bool>,
    candidates: Vec<usize>,
    position: usize,
    current: Genotype,
    current_change: Option<usize>,
    level: usize,
    level_best: Option<(Option<usize>, f64)>,
    completed: Option<FeatureLevel>,
    round: RoundState,
    best_score: f64,
    best: Option<Genotype>,
    evaluations: u64,
    stop_reason: Option<StopReason>,
}

impl SequentialStrategy {
    pub fn new(config: &SearchConfig, direction: Direction) -> Result<Self, SearchError> {
        config.validate()?;
        let k = config.features.len();

        // Backward search scores the full set first as its own level.
        let (selected, candidates) = match direction {
            Direction::Forward => (vec![false; k], (0..k).collect()),
            Direction::Backward => (vec![true; k], Vec::new()),
        };

        log::info!(
            "sequential {:?} search over {} features, target size {:?}",
            direction,
            k,
            config.subset_size
        );

        let mut strategy = Self {
            features: config.features.clone(),
            direction,
            target_size: config.subset_size,
            objective: config.objective,
            current: Genotype::new(selected.clone()),
            selected,
            candidates,
            position: 0,
            current_change: None,
            level: 0,
            level_best: None,
            completed: None,
            round: RoundState::AwaitingScore,
            best_score: config.objective.worst_score(),
            best: None,
            evaluations: 0,
            stop_reason: None,
        };
        strategy.load_candidate();
        Ok(strategy)
    }

    /// Point `current` at the candidate under `position`.
    fn load_candidate(&mut self) {
        let mut bits = self.selected.clone();
        self.current_change = self.candidates.get(self.position).copied();
        if let Some(i) = self.current_change {
            bits[i] = !bits[i];
        }
        self.current = Genotype::new(bits);
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn continue_loop(&self) -> bool {
        self.round != RoundState::Terminated
    }

    pub fn round_state(&self) -> RoundState {
        self.round
    }

    pub fn current_candidate(&self) -> &Genotype {
        &self.current
    }

    pub fn included_features(&self) -> Vec<FeatureId> {
        self.current.included_features(&self.features)
    }

    pub fn set_objective(&mut self, objective: Objective) -> Result<(), SearchError> {
        if self.evaluations > 0 {
            return Err(SearchError::ObjectiveLocked);
        }
        self.objective = objective;
        self.best_score = objective.worst_score();
        Ok(())
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn add_score(&mut self, score: f64) -> Result<(), SearchError> {
        match self.round {
            RoundState::Terminated => return Err(SearchError::Terminated),
            RoundState::Scored => return Err(SearchError::ScoreWithoutCandidate),
            RoundState::AwaitingScore => {}
        }
        if !score.is_finite() {
            return Err(SearchError::NonFiniteScore(score));
        }

        log::trace!("level {}: {} scored {}", self.level, self.current, score);

        self.current.set_fitness(score);
        self.evaluations += 1;
        if self.objective.is_better(score, self.best_score) {
            self.best_score = score;
            self.best = Some(self.current.clone());
        }

        let improves = match self.level_best {
            Some((_, incumbent)) => self.objective.is_better(score, incumbent),
            None => true,
        };
        if improves {
            self.level_best = Some((self.current_change, score));
        }

        if self.position + 1 >= self.candidates.len() {
            self.completed = self.level_best.map(|(change, score)| {
                let mut bits = self.selected.clone();
                if let Some(i) = change {
                    bits[i] = !bits[i];
                }
                FeatureLevel {
                    features: Genotype::new(bits).included_features(&self.features),
                    score,
                    changed_feature: change.map(|i| self.features[i]),
                }
            });
        }

        self.round = RoundState::Scored;
        Ok(())
    }

    pub fn prepare_new_round(&mut self) -> Result<(), SearchError> {
        match self.round {
            RoundState::Terminated => return Err(SearchError::Terminated),
            RoundState::AwaitingScore => return Err(SearchError::RoundNotScored),
            RoundState::Scored => {}
        }

        if self.completed.take().is_none() {
            self.position += 1;
            self.load_candidate();
            self.round = RoundState::AwaitingScore;
            return Ok(());
        }

        if let Some((Some(change), _)) = self.level_best {
            self.selected[change] = !self.selected[change];
        }
        log::info!(
            "level {} complete: {} features selected, level best {:?}",
            self.level,
            self.selected_count(),
            self.level_best.map(|(_, score)| score)
        );
        self.level += 1;
        self.level_best = None;

        if let Some(reason) = self.should_stop() {
            log::debug!("sequential search stopped: {:?}", reason);
            self.round = RoundState::Terminated;
            self.stop_reason = Some(reason);
            return Ok(());
        }

        let adding = self.direction == Direction::Forward;
        self.candidates = (0..self.selected.len())
            .filter(|&i| self.selected[i] != adding)
            .collect();
        self.position = 0;
        self.load_candidate();
        self.round = RoundState::AwaitingScore;
        Ok(())
    }

    fn selected_count(&self) -> usize {
        self.selected.iter().filter(|&&b| b).count()
    }

    fn should_stop(&self) -> Option<StopReason> {
        let count = self.selected_count();
        match self.direction {
            Direction::Forward => {
                if self.target_size.is_some_and(|t| count >= t) {
                    Some(StopReason::SubsetSizeReached)
                } else if count == self.selected.len() {
                    Some(StopReason::FeaturesExhausted)
                } else {
                    None
                }
            }
            Direction::Backward => {
                if self.target_size.is_some_and(|t| count <= t) {
                    Some(StopReason::SubsetSizeReached)
                } else if count <= 1 {
                    Some(StopReason::FeaturesExhausted)
                } else {
                    None
                }
            }
        }
    }

    pub fn current_best_score(&self) -> f64 {
        self.best_score
    }

    pub fn best_features(&self) -> Option<Vec<FeatureId>> {
        self.best
            .as_ref()
            .map(|g| g.included_features(&self.features))
    }

    pub fn completed_level(&self) -> Option<FeatureLevel> {
        if self.round != RoundState::Scored {
            return None;
        }
        self.completed.clone()
    }

    pub fn name_for_last_change(&self) -> &'static str {
        match self.direction {
            Direction::Forward => "Added feature",
            Direction::Backward => "Removed feature",
        }
    }

    /// Subset committed at the last completed level.
    pub fn last_best_features(&self) -> Vec<FeatureId> {
        Genotype::new(self.selected.clone()).included_features(&self.features)
    }

    /// Number of levels this search performs when it runs to completion.
    pub fn number_of_iterations(&self) -> usize {
        let k = self.features.len();
        match self.direction {
            Direction::Forward => self.target_size.unwrap_or(k),
            Direction::Backward => 1 + k - self.target_size.unwrap_or(1),
        }
    }

    /// Feature added or removed by the current candidate.
    pub fn current_feature(&self) -> Option<FeatureId> {
        self.current_change.map(|i| self.features[i])
    }

    pub fn pending_candidates(&self) -> Vec<Vec<FeatureId>> {
        if self.round != RoundState::AwaitingScore {
            return Vec::new();
        }
        let mut pending = vec![self.included_features()];
        for &i in self.candidates.iter().skip(self.position + 1) {
            let mut bits = self.selected.clone();
            bits[i] = !bits[i];
            pending.push(Genotype::new(bits).included_features(&self.features));
        }
        pending
    }

    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }
}
