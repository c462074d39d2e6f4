//! Generational rank-based evolution operator.

use rand_distr::WeightedAliasIndex;

use super::genome::GenomeRng;
use crate::schema::{EvolutionParams, Genotype, Objective};

/// Produces the next generation from a fully scored one.
///
/// Parents are drawn with probability proportional to their rank (best of
/// `n` gets weight `n`, worst gets weight 1), so only the ordering of scores
/// matters, never their scale. The top `elitism` individuals are carried over
/// unchanged; every other slot is a uniform-crossover child with bit-flip
/// mutation.
#[derive(Debug, Clone)]
pub struct RankEvolution {
    objective: Objective,
    elitism: usize,
    mutation_rate: f64,
}

impl RankEvolution {
    pub fn new(objective: Objective, params: &EvolutionParams) -> Self {
        Self {
            objective,
            elitism: params.elitism,
            mutation_rate: params.mutation_rate,
        }
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Sort best first. Equal scores are ordered by their bits so the ranking
    /// never depends on the order in which scores arrived.
    pub fn rank(&self, population: &mut [Genotype]) {
        let worst = self.objective.worst_score();
        population.sort_by(|a, b| {
            let fa = a.fitness().unwrap_or(worst);
            let fb = b.fitness().unwrap_or(worst);
            self.objective
                .rank_cmp(fa, fb)
                .then_with(|| a.bits().cmp(b.bits()))
        });
    }

    /// Evolve a scored generation into an unscored one of the same size.
    pub fn evolve(&self, mut population: Vec<Genotype>, rng: &mut GenomeRng) -> Vec<Genotype> {
        let size = population.len();
        if size == 0 {
            return population;
        }

        self.rank(&mut population);

        let mut next_gen: Vec<Genotype> = population
            .iter()
            .take(self.elitism.min(size))
            .map(Genotype::unscored)
            .collect();

        let weights: Vec<f64> = (0..size).map(|i| (size - i) as f64).collect();
        let Ok(selector) = WeightedAliasIndex::new(weights) else {
            // Only reachable with an empty weight vector, excluded above.
            return population.iter().map(Genotype::unscored).collect();
        };

        while next_gen.len() < size {
            let parent1 = &population[rng.sample(&selector)];
            let parent2 = &population[rng.sample(&selector)];

            let mut child = rng.crossover(parent1, parent2);
            rng.mutate(&mut child, self.mutation_rate);
            next_gen.push(Genotype::new(child));
        }

        log::debug!(
            "evolved {} individuals ({} elites, best parent fitness {:?})",
            next_gen.len(),
            self.elitism.min(size),
            population[0].fitness()
        );

        next_gen
    }
}
