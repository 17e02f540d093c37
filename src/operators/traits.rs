//! Operator traits
//!
//! This module defines the core operator traits for genetic algorithms.
//! Every operator receives the random source explicitly, so a seeded
//! generator makes a whole run reproducible.

use rand::Rng;

use crate::fitness::cache::FitnessCache;
use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;

/// Selection operator trait
///
/// Selects individuals from a sorted, fully evaluated population. Fitness is
/// read through the cache so that every lookup refreshes the entry's recency.
pub trait SelectionOperator<G: EvolutionaryGenome, F: FitnessValue>: Send + Sync {
    /// Select a single individual from the population
    ///
    /// Returns the index of the selected individual.
    fn select<R: Rng>(
        &self,
        population: &[G],
        fitness: &mut FitnessCache<G, F>,
        rng: &mut R,
    ) -> usize;

    /// Build the next population
    ///
    /// The first `elite` individuals are kept as they are; every remaining
    /// slot is filled by an independent call to [`SelectionOperator::select`]
    /// over the whole population, elites included.
    fn select_population<R: Rng>(
        &self,
        population: &[G],
        fitness: &mut FitnessCache<G, F>,
        elite: usize,
        rng: &mut R,
    ) -> Vec<G> {
        let elite = elite.min(population.len());
        let mut selected = Vec::with_capacity(population.len());
        selected.extend_from_slice(&population[..elite]);
        for _ in elite..population.len() {
            let index = self.select(population, fitness, rng);
            selected.push(population[index].clone());
        }
        selected
    }
}

/// Crossover operator trait
///
/// Combines genetic material from two parents into one offspring. Built-in
/// operators return the non-empty parent unchanged when either parent is
/// empty.
pub trait CrossoverOperator<G: EvolutionaryGenome>: Send + Sync {
    /// Apply crossover to two parents and produce one offspring
    fn crossover<R: Rng>(&self, first: &G, second: &G, rng: &mut R) -> G;
}

/// Mutation operator trait
///
/// Applies random changes to a genome.
pub trait MutationOperator<G: EvolutionaryGenome>: Send + Sync {
    /// Apply mutation to a genome in place
    fn mutate<R: Rng>(&self, genome: &mut G, rng: &mut R);
}
