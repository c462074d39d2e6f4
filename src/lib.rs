//! Feature search - Iterative feature-subset selection against an expensive oracle.
//!
//! Given a fixed universe of candidate features and an external oracle that
//! scores any subset (typically by training and validating a model), the
//! engine proposes subsets, collects their scores and converges toward the
//! subset that minimizes or maximizes the score.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, genotype, and result types
//! - `search`: Fitness cache, evolution operator, strategies, and driver
//!
//! # Example
//!
//! ```rust,no_run
//! use std::convert::Infallible;
//!
//! use feature_search::{FeatureId, SearchConfig, SearchDriver, SearchStrategy};
//!
//! let config = SearchConfig::with_feature_count(12).with_seed(7);
//! let mut strategy = SearchStrategy::from_config(&config).unwrap();
//!
//! let oracle = |features: &[FeatureId]| Ok::<_, Infallible>(features.len() as f64);
//! let result = SearchDriver::new().run(&mut strategy, &oracle).unwrap();
//!
//! println!("Best subset: {:?} ({})", result.best_features, result.best_score);
//! ```

pub mod schema;
pub mod search;

// Re-export commonly used types
pub use schema::{FeatureId, Genotype, Objective, SearchConfig, SearchResult, StrategyKind};
pub use search::{Oracle, SearchDriver, SearchError, SearchStrategy};
