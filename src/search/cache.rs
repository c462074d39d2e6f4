//! Fitness cache keyed by genotype value.

use std::collections::HashMap;

use crate::schema::Genotype;

/// Scores observed during a search, keyed by the full bit-vector.
///
/// The hash of the bits only selects a bucket; lookups compare the bits for
/// equality, so distinct subsets can never share a score. Entries are never
/// evicted while the search runs.
#[derive(Debug, Default, Clone)]
pub struct FitnessCache {
    scores: HashMap<Box<[bool]>, f64>,
}

impl FitnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached score for a genotype, if any.
    #[inline]
    pub fn get(&self, genotype: &Genotype) -> Option<f64> {
        self.scores.get(genotype.bits()).copied()
    }

    #[inline]
    pub fn contains(&self, genotype: &Genotype) -> bool {
        self.scores.contains_key(genotype.bits())
    }

    /// Record a score. Returns the previous score if one was present.
    pub fn insert(&mut self, genotype: &Genotype, score: f64) -> Option<f64> {
        self.scores.insert(genotype.bits().into(), score)
    }

    /// Fill in the genotype's fitness from the cache. Returns whether it hit.
    pub fn resolve(&self, genotype: &mut Genotype) -> bool {
        match self.get(genotype) {
            Some(score) => {
                genotype.set_fitness(score);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
