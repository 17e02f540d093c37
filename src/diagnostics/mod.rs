//! Run statistics
//!
//! [`GenerationStats`] summarizes one sorted generation together with the
//! fitness cache counters at the moment it was emitted. A
//! [`GenerationalGA`](crate::algorithms::generational::GenerationalGA) keeps
//! an [`EvolutionStats`] for its whole lifetime, so repeated `run` calls
//! extend one history. Fitness is minimized: the best value is the smallest.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fitness::cache::FitnessCache;
use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;
use crate::termination::StopReason;

/// Wall-clock time spent in each phase of one generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    /// Fitness evaluation, sorting and cache trimming
    pub evaluate: Duration,
    /// Elitist selection
    pub select: Duration,
    /// Crossover
    pub recombine: Duration,
    /// Mutation
    pub mutate: Duration,
}

impl PhaseTimings {
    /// Sum of all phases
    pub fn total(&self) -> Duration {
        self.evaluate + self.select + self.recombine + self.mutate
    }
}

/// Statistics for a single generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number
    pub generation: usize,
    /// Total fitness evaluations so far
    pub evaluations: usize,
    /// Fitness cache entries after the generation was evaluated
    pub cache_size: usize,
    /// Cache entries evicted since the engine started
    pub evictions: usize,
    /// Best (lowest) fitness in this generation
    pub best_fitness: f64,
    /// Worst (highest) fitness in this generation
    pub worst_fitness: f64,
    /// Mean fitness
    pub mean_fitness: f64,
    /// Median fitness
    pub median_fitness: f64,
    /// Sample standard deviation of the fitness
    pub fitness_std: f64,
    /// Fraction of distinct individuals in the population
    pub diversity: f64,
    /// Time spent producing this generation
    pub timings: PhaseTimings,
}

impl GenerationStats {
    /// Compute statistics from the fitness values of a population
    ///
    /// NaN values are ignored. With no usable values, best is `+inf` and
    /// worst is `-inf`.
    pub fn from_fitness<F: FitnessValue>(
        fitness: &[F],
        generation: usize,
        evaluations: usize,
    ) -> Self {
        let mut values: Vec<f64> = fitness
            .iter()
            .map(FitnessValue::to_f64)
            .filter(|f| !f.is_nan())
            .collect();
        values.sort_by(f64::total_cmp);

        let mut stats = Self {
            generation,
            evaluations,
            cache_size: 0,
            evictions: 0,
            best_fitness: f64::INFINITY,
            worst_fitness: f64::NEG_INFINITY,
            mean_fitness: 0.0,
            median_fitness: 0.0,
            fitness_std: 0.0,
            diversity: 0.0,
            timings: PhaseTimings::default(),
        };
        let (Some(&best), Some(&worst)) = (values.first(), values.last()) else {
            return stats;
        };

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let mid = n / 2;
        stats.best_fitness = best;
        stats.worst_fitness = worst;
        stats.mean_fitness = mean;
        stats.median_fitness = if n % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };
        if n > 1 {
            let squares: f64 = values.iter().map(|f| (f - mean).powi(2)).sum();
            stats.fitness_std = (squares / (n - 1) as f64).sqrt();
        }
        stats
    }

    /// Statistics of an evaluated population, read through its cache
    ///
    /// Reads use `peek`, so computing statistics never changes which entries
    /// the cache evicts next.
    pub fn observe<G, F>(
        population: &[G],
        cache: &FitnessCache<G, F>,
        generation: usize,
        evaluations: usize,
    ) -> Self
    where
        G: EvolutionaryGenome,
        F: FitnessValue,
    {
        let fitness: Vec<F> = population
            .iter()
            .filter_map(|genome| cache.peek(genome).cloned())
            .collect();
        let mut stats = Self::from_fitness(&fitness, generation, evaluations);
        stats.cache_size = cache.len();
        stats.evictions = cache.evictions();
        stats.diversity = diversity(population);
        stats
    }

    /// Set the phase timings
    pub fn with_timings(mut self, timings: PhaseTimings) -> Self {
        self.timings = timings;
        self
    }
}

/// Fraction of distinct individuals, 0 for an empty population
pub fn diversity<G: EvolutionaryGenome>(population: &[G]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&G> = population.iter().collect();
    distinct.len() as f64 / population.len() as f64
}

/// History of every generation an engine has produced
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Statistics per generation, oldest first
    pub generations: Vec<GenerationStats>,
    /// Time spent inside `run` calls
    pub runtime: Duration,
    /// Why the most recent `run` stopped
    pub stop: Option<StopReason>,
}

impl EvolutionStats {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generation
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    /// Number of generations recorded
    pub fn num_generations(&self) -> usize {
        self.generations.len()
    }

    /// Most recent generation
    pub fn latest(&self) -> Option<&GenerationStats> {
        self.generations.last()
    }

    /// Lowest best fitness over the whole history
    pub fn best_fitness(&self) -> Option<f64> {
        self.generations
            .iter()
            .map(|g| g.best_fitness)
            .min_by(f64::total_cmp)
    }

    /// Best fitness of each generation, oldest first
    pub fn best_fitness_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_fitness).collect()
    }

    /// Fitness evaluations performed so far
    pub fn evaluations(&self) -> usize {
        self.latest().map_or(0, |g| g.evaluations)
    }

    /// Cache entries evicted so far
    pub fn evictions(&self) -> usize {
        self.latest().map_or(0, |g| g.evictions)
    }

    /// One-line summary of the history
    pub fn summary(&self) -> String {
        let cache_size = self.latest().map_or(0, |g| g.cache_size);
        let stop = self
            .stop
            .as_ref()
            .map_or_else(|| "still running".to_string(), ToString::to_string);
        format!(
            "{} generations, {} evaluations, best {:.6}, cache {} ({} evicted), {:.2?}: {}",
            self.num_generations(),
            self.evaluations(),
            self.best_fitness().unwrap_or(f64::INFINITY),
            cache_size,
            self.evictions(),
            self.runtime,
            stop
        )
    }
}

/// Result of an evolution run
#[derive(Clone, Debug)]
pub struct EvolutionResult<G, F = f64>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// The best genome of the final generation
    pub best_genome: G,
    /// Its fitness value
    pub best_fitness: F,
    /// Number of the final generation
    pub generations: usize,
    /// Total fitness evaluations
    pub evaluations: usize,
    /// Statistics of every generation the engine has produced
    pub stats: EvolutionStats,
}

pub mod prelude {
    pub use super::{diversity, EvolutionResult, EvolutionStats, GenerationStats, PhaseTimings};
}
