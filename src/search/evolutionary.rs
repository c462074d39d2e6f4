//! Evolutionary feature-subset search.

use crate::schema::{
    EvolutionParams, FeatureId, FeatureLevel, Genotype, Objective, SearchConfig, StopReason,
};

use super::cache::FitnessCache;
use super::error::SearchError;
use super::evolution::RankEvolution;
use super::genome::GenomeRng;
use super::population::Population;
use super::strategy::RoundState;

/// Generational genetic search over feature bit-vectors.
///
/// The driver alternates `current_candidate` → oracle → `add_score` →
/// `prepare_new_round` until `continue_loop` turns false. Every score goes
/// into the fitness cache; individuals reintroduced by evolution are resolved
/// from it and never handed to the oracle again.
pub struct EvolutionaryStrategy {
    features: Vec<FeatureId>,
    max_generations: usize,
    params: EvolutionParams,
    objective: Objective,
    rng: GenomeRng,
    cache: FitnessCache,
    population: Population,
    current: Genotype,
    round: RoundState,
    generation: usize,
    best_score: f64,
    best: Option<Genotype>,
    evaluations: u64,
    parent_sizes: Vec<usize>,
    stop_reason: Option<StopReason>,
}

impl EvolutionaryStrategy {
    /// Create a strategy with a random initial population.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let mut rng = GenomeRng::from_seed_option(config.random_seed);
        let initial = rng.initial_population(config.features.len(), config.population.size);
        Self::build(config, rng, initial)
    }

    /// Create a strategy starting from a caller-supplied population.
    pub fn with_initial_population(
        config: &SearchConfig,
        initial: Vec<Genotype>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = GenomeRng::from_seed_option(config.random_seed);
        Self::build(config, rng, initial)
    }

    fn build(
        config: &SearchConfig,
        rng: GenomeRng,
        initial: Vec<Genotype>,
    ) -> Result<Self, SearchError> {
        let k = config.features.len();
        if let Some(bad) = initial.iter().find(|g| g.len() != k) {
            return Err(SearchError::GenotypeLength {
                expected: k,
                actual: bad.len(),
            });
        }

        let mut population = Population::new();
        for genotype in initial {
            population.enqueue(genotype.unscored());
        }
        let current = population.pop_next().ok_or(SearchError::EmptyPopulation)?;

        log::info!(
            "evolutionary search over {} features: population {}, {} generations",
            k,
            config.population.size,
            config.population.max_generations
        );

        Ok(Self {
            features: config.features.clone(),
            max_generations: config.population.max_generations,
            params: config.evolution.clone(),
            objective: config.objective,
            rng,
            cache: FitnessCache::new(),
            population,
            current,
            round: RoundState::AwaitingScore,
            generation: 0,
            best_score: config.objective.worst_score(),
            best: None,
            evaluations: 0,
            parent_sizes: Vec::new(),
            stop_reason: None,
        })
    }

    /// False once a termination condition has fired; never turns true again.
    pub fn continue_loop(&self) -> bool {
        self.round != RoundState::Terminated
    }

    pub fn round_state(&self) -> RoundState {
        self.round
    }

    /// Candidate the driver must evaluate next.
    pub fn current_candidate(&self) -> &Genotype {
        &self.current
    }

    /// Feature ids selected by the current candidate.
    pub fn included_features(&self) -> Vec<FeatureId> {
        self.current.included_features(&self.features)
    }

    /// Set the objective direction. Only allowed before the first score.
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

    /// Record the oracle's score for the current candidate.
    pub fn add_score(&mut self, score: f64) -> Result<(), SearchError> {
        match self.round {
            RoundState::Terminated => return Err(SearchError::Terminated),
            RoundState::Scored => return Err(SearchError::ScoreWithoutCandidate),
            RoundState::AwaitingScore => {}
        }
        if !score.is_finite() {
            return Err(SearchError::NonFiniteScore(score));
        }

        log::trace!("generation {}: {} scored {}", self.generation, self.current, score);

        self.current.set_fitness(score);
        self.cache.insert(&self.current, score);
        self.evaluations += 1;
        if self.objective.is_better(score, self.best_score) {
            self.best_score = score;
            self.best = Some(self.current.clone());
        }
        self.round = RoundState::Scored;
        Ok(())
    }

    /// Commit the scored candidate and move to the next one, evolving a new
    /// generation when the current one is exhausted.
    pub fn prepare_new_round(&mut self) -> Result<(), SearchError> {
        match self.round {
            RoundState::Terminated => return Err(SearchError::Terminated),
            RoundState::AwaitingScore => return Err(SearchError::RoundNotScored),
            RoundState::Scored => {}
        }

        self.population.commit(self.current.clone());
        self.population.resolve_held(&self.cache);

        if let Some(next) = self.next_queued() {
            self.current = next;
            self.round = RoundState::AwaitingScore;
            return Ok(());
        }

        self.generation += 1;
        log::info!(
            "generation {} complete: best score {}, {} cached subsets",
            self.generation - 1,
            self.best_score,
            self.cache.len()
        );

        if self.generation >= self.max_generations {
            self.terminate(StopReason::MaxGenerations);
            return Ok(());
        }

        let parents = self.population.take_evaluated();
        self.parent_sizes.push(parents.len());
        let evolution = RankEvolution::new(self.objective, &self.params);
        let children = evolution.evolve(parents, &mut self.rng);

        let mut hits = 0;
        for mut child in children {
            if self.cache.resolve(&mut child) {
                hits += 1;
                self.observe(&child);
                self.population.commit(child);
            } else {
                self.population.enqueue(child);
            }
        }
        log::debug!(
            "generation {}: {} cache hits, {} queued, {} held",
            self.generation,
            hits,
            self.population.pending_len(),
            self.population.held_len()
        );

        match self.next_queued() {
            Some(next) => {
                self.current = next;
                self.round = RoundState::AwaitingScore;
            }
            None => self.terminate(StopReason::Converged),
        }
        Ok(())
    }

    /// Pop the next queued individual the oracle has not scored yet.
    fn next_queued(&mut self) -> Option<Genotype> {
        while let Some(mut next) = self.population.pop_next() {
            if self.cache.resolve(&mut next) {
                self.observe(&next);
                self.population.commit(next);
                self.population.resolve_held(&self.cache);
                continue;
            }
            return Some(next);
        }
        None
    }

    fn observe(&mut self, genotype: &Genotype) {
        if let Some(score) = genotype.fitness()
            && self.objective.is_better(score, self.best_score)
        {
            self.best_score = score;
            self.best = Some(genotype.clone());
        }
    }

    fn terminate(&mut self, reason: StopReason) {
        log::debug!("evolutionary search stopped: {:?}", reason);
        self.round = RoundState::Terminated;
        self.stop_reason = Some(reason);
    }

    pub fn current_best_score(&self) -> f64 {
        self.best_score
    }

    /// Features of the best-scoring subset so far.
    pub fn best_features(&self) -> Option<Vec<FeatureId>> {
        self.best
            .as_ref()
            .map(|g| g.included_features(&self.features))
    }

    /// Row to record for the candidate just scored.
    pub fn completed_level(&self) -> Option<FeatureLevel> {
        if self.round != RoundState::Scored {
            return None;
        }
        Some(FeatureLevel {
            features: self.included_features(),
            score: self.current.fitness()?,
            changed_feature: None,
        })
    }

    pub fn last_best_features(&self) -> Vec<FeatureId> {
        self.included_features()
    }

    pub fn number_of_iterations(&self) -> usize {
        self.max_generations
    }

    /// Feature subsets the driver is known to owe scores for in this
    /// generation, in hand-out order.
    pub fn pending_candidates(&self) -> Vec<Vec<FeatureId>> {
        let current = (self.round == RoundState::AwaitingScore).then_some(&self.current);
        current
            .into_iter()
            .chain(self.population.pending())
            .map(|g| g.included_features(&self.features))
            .collect()
    }

    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn cache(&self) -> &FitnessCache {
        &self.cache
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Size of each generation handed to the evolution operator so far.
    pub fn parent_sizes(&self) -> &[usize] {
        &self.parent_sizes
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PopulationConfig;

    fn config(k: usize, size: usize, generations: usize) -> SearchConfig {
        SearchConfig {
            population: PopulationConfig {
                size,
                max_generations: generations,
            },
            ..SearchConfig::with_feature_count(k).with_seed(17)
        }
    }

    #[test]
    fn test_initial_candidate_available() {
        let strategy = EvolutionaryStrategy::new(&config(6, 5, 2)).unwrap();
        assert!(strategy.continue_loop());
        assert_eq!(strategy.current_candidate().len(), 6);
        assert_eq!(strategy.round_state(), RoundState::AwaitingScore);
        assert_eq!(strategy.current_best_score(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_protocol_violations_rejected() {
        let mut strategy = EvolutionaryStrategy::new(&config(4, 3, 2)).unwrap();

        assert!(matches!(
            strategy.prepare_new_round(),
            Err(SearchError::RoundNotScored)
        ));

        strategy.add_score(1.0).unwrap();
        assert!(matches!(
            strategy.add_score(2.0),
            Err(SearchError::ScoreWithoutCandidate)
        ));
        assert_eq!(strategy.current_best_score(), 1.0);
    }

    #[test]
    fn test_non_finite_scores_rejected() {
        let mut strategy = EvolutionaryStrategy::new(&config(4, 3, 2)).unwrap();
        assert!(matches!(
            strategy.add_score(f64::NAN),
            Err(SearchError::NonFiniteScore(_))
        ));
        assert!(matches!(
            strategy.add_score(f64::INFINITY),
            Err(SearchError::NonFiniteScore(_))
        ));
        assert_eq!(strategy.round_state(), RoundState::AwaitingScore);
        assert!(strategy.add_score(0.5).is_ok());
    }

    #[test]
    fn test_objective_locked_after_first_score() {
        let mut strategy = EvolutionaryStrategy::new(&config(4, 3, 2)).unwrap();
        strategy.set_objective(Objective::Minimize).unwrap();
        assert_eq!(strategy.current_best_score(), f64::INFINITY);

        strategy.add_score(3.0).unwrap();
        assert!(matches!(
            strategy.set_objective(Objective::Maximize),
            Err(SearchError::ObjectiveLocked)
        ));
    }

    #[test]
    fn test_best_score_follows_direction() {
        let initial = (0..4).map(|i| Genotype::from_indices(8, [i])).collect();
        let mut strategy =
            EvolutionaryStrategy::with_initial_population(&config(8, 4, 1), initial).unwrap();
        strategy.set_objective(Objective::Minimize).unwrap();

        for score in [3.0, 1.0, 2.0, 5.0] {
            strategy.add_score(score).unwrap();
            strategy.prepare_new_round().unwrap();
        }
        assert_eq!(strategy.current_best_score(), 1.0);
    }

    #[test]
    fn test_terminated_search_rejects_calls() {
        let initial = vec![Genotype::from_indices(3, [0])];
        let mut strategy =
            EvolutionaryStrategy::with_initial_population(&config(3, 1, 1), initial).unwrap();

        strategy.add_score(1.0).unwrap();
        strategy.prepare_new_round().unwrap();
        assert!(!strategy.continue_loop());
        assert_eq!(strategy.stop_reason(), Some(StopReason::MaxGenerations));
        assert!(matches!(strategy.add_score(1.0), Err(SearchError::Terminated)));
        assert!(matches!(
            strategy.prepare_new_round(),
            Err(SearchError::Terminated)
        ));
    }

    #[test]
    fn test_initial_population_length_checked() {
        let initial = vec![Genotype::empty(2)];
        assert!(matches!(
            EvolutionaryStrategy::with_initial_population(&config(3, 1, 1), initial),
            Err(SearchError::GenotypeLength {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            EvolutionaryStrategy::with_initial_population(&config(3, 1, 1), vec![]),
            Err(SearchError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_completed_level_only_after_score() {
        let initial = vec![Genotype::from_indices(3, [0, 2])];
        let mut strategy =
            EvolutionaryStrategy::with_initial_population(&config(3, 1, 2), initial).unwrap();
        assert!(strategy.completed_level().is_none());

        strategy.add_score(0.25).unwrap();
        let level = strategy.completed_level().unwrap();
        assert_eq!(level.features, vec![0, 2]);
        assert_eq!(level.score, 0.25);
    }

    #[test]
    fn test_pending_candidates_lists_current_first() {
        let initial = vec![
            Genotype::from_indices(3, [0]),
            Genotype::from_indices(3, [1]),
            Genotype::from_indices(3, [2]),
        ];
        let strategy =
            EvolutionaryStrategy::with_initial_population(&config(3, 3, 2), initial).unwrap();
        assert_eq!(
            strategy.pending_candidates(),
            vec![vec![0], vec![1], vec![2]]
        );
    }
}
