//! Schema module - Configuration, genotype, and result types for feature search.

mod config;
mod genotype;
mod progress;

pub use config::*;
pub use genotype::*;
pub use progress::*;
