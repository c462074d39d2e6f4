//! Work queue and accumulator for one generation.

use std::collections::VecDeque;

use super::cache::FitnessCache;
use crate::schema::Genotype;

/// Individuals of the current generation.
///
/// `to_evaluate` is the FIFO of individuals the oracle still owes a score for;
/// `evaluated` accumulates the scored individuals of this generation. An
/// individual whose bits are already queued is parked in `held` instead of
/// being queued twice, and moves to `evaluated` once its twin is scored.
#[derive(Debug, Default)]
pub struct Population {
    to_evaluate: VecDeque<Genotype>,
    evaluated: Vec<Genotype>,
    held: Vec<Genotype>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an individual for evaluation.
    ///
    /// Returns `false` if an identical individual is already queued; the
    /// duplicate is held until [`Population::resolve_held`] can score it.
    pub fn enqueue(&mut self, genotype: Genotype) -> bool {
        if self.to_evaluate.contains(&genotype) {
            self.held.push(genotype);
            false
        } else {
            self.to_evaluate.push_back(genotype);
            true
        }
    }

    /// Next individual awaiting evaluation.
    pub fn pop_next(&mut self) -> Option<Genotype> {
        self.to_evaluate.pop_front()
    }

    /// Add a scored individual to this generation.
    pub fn commit(&mut self, genotype: Genotype) {
        debug_assert!(genotype.is_scored(), "committing unscored {genotype:?}");
        self.evaluated.push(genotype);
    }

    /// Move held duplicates whose score is now known into `evaluated`.
    ///
    /// Returns how many were resolved.
    pub fn resolve_held(&mut self, cache: &FitnessCache) -> usize {
        let mut resolved = 0;
        let mut i = 0;
        while i < self.held.len() {
            if cache.resolve(&mut self.held[i]) {
                let genotype = self.held.swap_remove(i);
                self.evaluated.push(genotype);
                resolved += 1;
            } else {
                i += 1;
            }
        }
        resolved
    }

    /// Hand over the finished generation, leaving `evaluated` empty.
    pub fn take_evaluated(&mut self) -> Vec<Genotype> {
        debug_assert!(self.to_evaluate.is_empty());
        debug_assert!(self.held.is_empty());
        std::mem::take(&mut self.evaluated)
    }

    pub fn evaluated(&self) -> &[Genotype] {
        &self.evaluated
    }

    pub fn pending(&self) -> impl Iterator<Item = &Genotype> {
        self.to_evaluate.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.to_evaluate.len()
    }

    pub fn held_len(&self) -> usize {
        self.held.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.to_evaluate.is_empty()
    }
}
