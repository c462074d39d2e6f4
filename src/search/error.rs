use crate::schema::ConfigError;

/// Errors raised by a search strategy.
///
/// Apart from `Config`, these are caller contract violations: the strategy
/// state is left untouched when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Score recorded without a pending candidate")]
    ScoreWithoutCandidate,
    #[error("New round requested before the current candidate was scored")]
    RoundNotScored,
    #[error("Search has already terminated")]
    Terminated,
    #[error("Score {0} is not finite")]
    NonFiniteScore(f64),
    #[error("Objective direction cannot change once scores are recorded")]
    ObjectiveLocked,
    #[error("Genotype has {actual} bits but the feature universe has {expected}")]
    GenotypeLength { expected: usize, actual: usize },
    #[error("Initial population must not be empty")]
    EmptyPopulation,
}
