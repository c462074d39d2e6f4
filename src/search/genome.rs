//! Genotype manipulation utilities for evolutionary search.
//!
//! Provides random generation, uniform crossover, and bit-flip mutation.

use rand::prelude::*;

use crate::schema::Genotype;

/// Random number generator wrapper for genotype operations.
///
/// A search owns exactly one of these; seeding it identically replays the
/// same sequence of candidates.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when a seed is configured, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::random, Self::new)
    }

    /// Genotype with each bit drawn from a fair coin.
    pub fn random_genotype(&mut self, len: usize) -> Genotype {
        let bits: Vec<bool> = (0..len).map(|_| self.rng.gen_bool(0.5)).collect();
        Genotype::new(bits)
    }

    /// Starting population of `size` random genotypes. Duplicates are kept.
    pub fn initial_population(&mut self, len: usize, size: usize) -> Vec<Genotype> {
        (0..size).map(|_| self.random_genotype(len)).collect()
    }

    /// Uniform crossover: every bit comes from either parent with equal odds.
    pub fn crossover(&mut self, parent1: &Genotype, parent2: &Genotype) -> Vec<bool> {
        parent1
            .bits()
            .iter()
            .zip(parent2.bits())
            .map(|(&a, &b)| if self.rng.gen_bool(0.5) { a } else { b })
            .collect()
    }

    /// Flip each bit independently with probability `rate`.
    pub fn mutate(&mut self, bits: &mut [bool], rate: f64) {
        for bit in bits.iter_mut() {
            if self.rng.r#gen::<f64>() < rate {
                *bit = !*bit;
            }
        }
    }

    /// Draw a sample from `dist` using this generator.
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        dist.sample(&mut self.rng)
    }
}
