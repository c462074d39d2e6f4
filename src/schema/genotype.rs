//! Bit-vector genotype encoding a feature subset.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identifier of a candidate feature (e.g. a column index in the caller's table).
pub type FeatureId = u32;

/// Feature-inclusion bit-vector plus its (optional) fitness.
///
/// Bit `i` set means feature `i` of the universe is included. The bits are
/// immutable once constructed; only the fitness slot changes. Equality and
/// hashing look at the bits alone, so two genotypes with the same subset are
/// the same individual regardless of whether either has been scored.
#[derive(Clone, Serialize, Deserialize)]
pub struct Genotype {
    bits: Box<[bool]>,
    fitness: Option<f64>,
}

impl Genotype {
    /// Create an unscored genotype from its bits.
    pub fn new(bits: impl Into<Box<[bool]>>) -> Self {
        Self {
            bits: bits.into(),
            fitness: None,
        }
    }

    /// Genotype with no feature included.
    pub fn empty(len: usize) -> Self {
        Self::new(vec![false; len])
    }

    /// Genotype with every feature included.
    pub fn full(len: usize) -> Self {
        Self::new(vec![true; len])
    }

    /// Genotype including exactly the given bit positions.
    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut bits = vec![false; len];
        for i in indices {
            bits[i] = true;
        }
        Self::new(bits)
    }

    /// The raw bit-vector.
    #[inline]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of bits (size of the feature universe).
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Number of included features.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Positions of the included features, ascending.
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
    }

    /// Map the set bits onto the feature universe.
    pub fn included_features(&self, universe: &[FeatureId]) -> Vec<FeatureId> {
        debug_assert_eq!(universe.len(), self.bits.len());
        self.selected_indices().map(|i| universe[i]).collect()
    }

    /// Fitness, if this genotype has been scored.
    #[inline]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    #[inline]
    pub fn is_scored(&self) -> bool {
        self.fitness.is_some()
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Copy of the bits without fitness.
    pub fn unscored(&self) -> Self {
        Self::new(self.bits.clone())
    }
}

impl PartialEq for Genotype {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Genotype {}

impl Hash for Genotype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl fmt::Debug for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genotype({self}")?;
        match self.fitness {
            Some(fitness) => write!(f, ", fitness={fitness})"),
            None => write!(f, ")"),
        }
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.bits.iter() {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}
