//! Selection operators
//!
//! This module provides selection operators for genetic algorithms.

use std::cmp::Ordering;

use rand::Rng;

use crate::error::OperatorError;
use crate::fitness::cache::FitnessCache;
use crate::fitness::traits::{compare_optional, FitnessValue};
use crate::genome::traits::EvolutionaryGenome;
use crate::operators::traits::SelectionOperator;

/// Deterministic tournament selection operator
///
/// Draws `tournament_size` contestants uniformly with replacement and picks
/// the one with the lowest fitness. Ties go to the contestant drawn first.
#[derive(Clone, Debug)]
pub struct TournamentSelection {
    /// Tournament size (number of individuals competing)
    pub tournament_size: usize,
}

impl TournamentSelection {
    /// Create a new tournament selection with the given size
    pub fn new(tournament_size: usize) -> Self {
        assert!(tournament_size >= 1, "Tournament size must be at least 1");
        Self { tournament_size }
    }

    /// Create a tournament selection from a configured size
    pub fn try_new(tournament_size: usize) -> Result<Self, OperatorError> {
        if tournament_size == 0 {
            return Err(OperatorError::InvalidConfiguration(
                "tournament size is zero".to_string(),
            ));
        }
        Ok(Self { tournament_size })
    }

    /// Create binary tournament selection (size = 2)
    pub fn binary() -> Self {
        Self::new(2)
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self::binary()
    }
}

impl<G, F> SelectionOperator<G, F> for TournamentSelection
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    fn select<R: Rng>(
        &self,
        population: &[G],
        fitness: &mut FitnessCache<G, F>,
        rng: &mut R,
    ) -> usize {
        assert!(!population.is_empty(), "Population cannot be empty");

        let mut best = rng.gen_range(0..population.len());
        let mut best_fitness = fitness.get(&population[best]).cloned();
        for _ in 1..self.tournament_size {
            let contestant = rng.gen_range(0..population.len());
            let contestant_fitness = fitness.get(&population[contestant]).cloned();
            if compare_optional(contestant_fitness.as_ref(), best_fitness.as_ref()) == Ordering::Less
            {
                best = contestant;
                best_fitness = contestant_fitness;
            }
        }
        best
    }
}
