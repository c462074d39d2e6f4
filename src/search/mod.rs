//! Search module for finding the best-scoring feature subset.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Fitness Cache** (`cache`): Scores keyed by the full genotype bit-vector
//! - **Population** (`population`): Work queue and accumulator for one generation
//! - **Genome Operations** (`genome`): Random generation, crossover, and mutation
//! - **Evolution Operator** (`evolution`): Rank-based generational reproduction
//! - **Strategies** (`evolutionary`, `sequential`): Round-based state machines
//! - **Facade** (`strategy`): One contract over every strategy variant
//! - **Driver** (`driver`): The outer loop calling the scoring oracle
//!
//! # Example
//!
//! ```rust,no_run
//! use std::convert::Infallible;
//!
//! use feature_search::schema::{FeatureId, Objective, SearchConfig};
//! use feature_search::search::{SearchDriver, SearchStrategy};
//!
//! let config = SearchConfig::new(vec![3, 4, 7, 9])
//!     .with_objective(Objective::Minimize)
//!     .with_seed(42);
//! let mut strategy = SearchStrategy::from_config(&config).unwrap();
//!
//! // Stand-in for training a model on the selected columns.
//! let error_rate = |features: &[FeatureId]| Ok::<_, Infallible>(1.0 / (1.0 + features.len() as f64));
//!
//! let result = SearchDriver::new().run(&mut strategy, &error_rate).unwrap();
//! println!("best subset {:?} scored {:.3}", result.best_features, result.best_score);
//! ```
//!
//! # Round protocol
//!
//! Every strategy follows the same cycle, which drivers may also run by hand:
//!
//! 1. `continue_loop()`: stop once it returns false (it never turns true again)
//! 2. `included_features()`: the subset to score
//! 3. `add_score(score)`: exactly once per candidate, finite scores only
//! 4. `prepare_new_round()`: advance, evolving a new generation if needed
//!
//! Calls out of order are rejected with a [`SearchError`].

mod cache;
mod driver;
mod error;
mod evolution;
mod evolutionary;
mod genome;
mod population;
mod sequential;
mod strategy;

pub use cache::FitnessCache;
pub use driver::{DriverError, Oracle, SearchDriver};
pub use error::SearchError;
pub use evolution::RankEvolution;
pub use evolutionary::EvolutionaryStrategy;
pub use genome::GenomeRng;
pub use population::Population;
pub use sequential::{Direction, SequentialStrategy};
pub use strategy::{RoundState, SearchStrategy};
