//! Search configuration types.
//!
//! Everything is serde-serializable with defaults, so a minimal JSON document
//! containing only `features` is a valid configuration.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::FeatureId;

/// Top-level configuration for a feature-subset search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Feature universe, fixed for the lifetime of a search.
    pub features: Vec<FeatureId>,
    /// Strategy variant to run.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Whether lower or higher scores are better.
    #[serde(default)]
    pub objective: Objective,
    /// Target subset size. Only the sequential variants stop on it.
    #[serde(default)]
    pub subset_size: Option<usize>,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Evolution operator parameters.
    #[serde(default)]
    pub evolution: EvolutionParams,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl SearchConfig {
    /// Configuration over `features` with every other setting at its default.
    pub fn new(features: Vec<FeatureId>) -> Self {
        Self {
            features,
            strategy: StrategyKind::default(),
            objective: Objective::default(),
            subset_size: None,
            population: PopulationConfig::default(),
            evolution: EvolutionParams::default(),
            random_seed: None,
        }
    }

    /// Universe of `k` features with ids `0..k`.
    pub fn with_feature_count(k: usize) -> Self {
        Self::new((0..k as FeatureId).collect())
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.is_empty() {
            return Err(ConfigError::EmptyFeatureUniverse);
        }
        let mut seen = HashSet::with_capacity(self.features.len());
        for &id in &self.features {
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateFeature(id));
            }
        }
        if self.population.size == 0 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if self.population.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        let rate = self.evolution.mutation_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidMutationRate(rate));
        }
        if self.evolution.elitism > self.population.size {
            return Err(ConfigError::ElitismTooLarge {
                elitism: self.evolution.elitism,
                population: self.population.size,
            });
        }
        if let Some(size) = self.subset_size
            && (size == 0 || size > self.features.len())
        {
            return Err(ConfigError::InvalidSubsetSize {
                size,
                universe: self.features.len(),
            });
        }
        Ok(())
    }
}

/// Strategy variant behind the search facade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type")]
pub enum StrategyKind {
    /// Generational genetic algorithm over feature bit-vectors.
    #[default]
    Evolutionary,
    /// Add one feature per level, starting from the empty set.
    SequentialForward,
    /// Remove one feature per level, starting from the full set.
    SequentialBackward,
}

/// Objective direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Objective {
    /// Lower scores are better (e.g. error rates).
    Minimize,
    /// Higher scores are better (e.g. accuracy).
    #[default]
    Maximize,
}

impl Objective {
    pub fn from_minimize(minimize: bool) -> Self {
        if minimize {
            Self::Minimize
        } else {
            Self::Maximize
        }
    }

    /// Sentinel that any finite score improves upon.
    pub fn worst_score(self) -> f64 {
        match self {
            Self::Minimize => f64::INFINITY,
            Self::Maximize => f64::NEG_INFINITY,
        }
    }

    /// Whether `candidate` strictly improves on `incumbent`.
    #[inline]
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate < incumbent,
            Self::Maximize => candidate > incumbent,
        }
    }

    /// Ordering that sorts better scores first.
    pub fn rank_cmp(self, a: f64, b: f64) -> std::cmp::Ordering {
        match self {
            Self::Minimize => a.total_cmp(&b),
            Self::Maximize => b.total_cmp(&a),
        }
    }
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals per generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to evaluate.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
        }
    }
}

fn default_population_size() -> usize {
    10
}
fn default_max_generations() -> usize {
    3
}

/// Parameters of the generational evolution operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionParams {
    /// Number of top-ranked individuals carried unchanged into the next generation.
    #[serde(default)]
    pub elitism: usize,
    /// Per-bit flip probability applied to every child.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            elitism: 0,
            mutation_rate: default_mutation_rate(),
        }
    }
}

fn default_mutation_rate() -> f64 {
    0.05
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Feature universe must not be empty")]
    EmptyFeatureUniverse,
    #[error("Feature {0} appears more than once in the universe")]
    DuplicateFeature(FeatureId),
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("Maximum generation count must be at least 1")]
    NoGenerations,
    #[error("Mutation rate {0} must be within [0, 1]")]
    InvalidMutationRate(f64),
    #[error("Elitism {elitism} exceeds population size {population}")]
    ElitismTooLarge { elitism: usize, population: usize },
    #[error("Subset size {size} must be within 1..={universe}")]
    InvalidSubsetSize { size: usize, universe: usize },
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SearchConfig::with_feature_count(4);
        assert!(config.validate().is_ok());
        assert_eq!(config.population.size, 10);
        assert_eq!(config.population.max_generations, 3);
        assert_eq!(config.evolution.elitism, 0);
    }

    #[test]
    fn test_degenerate_configs_rejected() {
        assert!(matches!(
            SearchConfig::new(vec![]).validate(),
            Err(ConfigError::EmptyFeatureUniverse)
        ));

        let mut config = SearchConfig::with_feature_count(3);
        config.population.size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::PopulationTooSmall)));

        let mut config = SearchConfig::with_feature_count(3);
        config.population.max_generations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoGenerations)));

        let mut config = SearchConfig::with_feature_count(3);
        config.evolution.mutation_rate = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMutationRate(_))
        ));

        let mut config = SearchConfig::with_feature_count(3);
        config.subset_size = Some(4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSubsetSize { size: 4, universe: 3 })
        ));

        assert!(matches!(
            SearchConfig::new(vec![1, 2, 1]).validate(),
            Err(ConfigError::DuplicateFeature(1))
        ));
    }

    #[test]
    fn test_objective_ordering() {
        assert!(Objective::Minimize.is_better(1.0, 2.0));
        assert!(Objective::Maximize.is_better(2.0, 1.0));
        assert!(!Objective::Maximize.is_better(1.0, 1.0));
        assert!(Objective::Maximize.is_better(-1e300, Objective::Maximize.worst_score()));
        assert_eq!(
            Objective::Minimize.rank_cmp(1.0, 2.0),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn test_minimal_json() {
        let config: SearchConfig = serde_json::from_str(r#"{ "features": [3, 5, 8] }"#).unwrap();
        assert_eq!(config.features, vec![3, 5, 8]);
        assert_eq!(config.strategy, StrategyKind::Evolutionary);
        assert_eq!(config.objective, Objective::Maximize);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_tagged_json() {
        let config: SearchConfig = serde_json::from_str(
            r#"{ "features": [0, 1], "strategy": { "type": "SequentialBackward" }, "objective": "Minimize" }"#,
        )
        .unwrap();
        assert_eq!(config.strategy, StrategyKind::SequentialBackward);
        assert_eq!(config.objective, Objective::Minimize);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        std::fs::write(&path, r#"{ "features": [1, 2], "population": { "size": 4 } }"#).unwrap();

        let config = SearchConfig::from_json_file(&path).unwrap();
        assert_eq!(config.population.size, 4);
        assert_eq!(config.population.max_generations, 3);

        std::fs::write(&path, r#"{ "features": [] }"#).unwrap();
        assert!(matches!(
            SearchConfig::from_json_file(&path),
            Err(ConfigError::EmptyFeatureUniverse)
        ));
    }
}
