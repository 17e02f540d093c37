//! Batch fitness evaluation
//!
//! The engine never calls a fitness function directly; it hands every batch
//! of not-yet-cached genomes to a `BatchEvaluator`. This is the single place
//! where fitness computation may be parallelized.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::fitness::traits::Fitness;

/// Maps a fitness function over a batch of genomes
///
/// Implementations must return exactly one value per genome, in input order,
/// and must not modify the genomes.
pub trait BatchEvaluator<Fit: Fitness> {
    /// Evaluate every genome in `genomes`
    fn evaluate_batch(&self, fitness: &Fit, genomes: &[Fit::Genome]) -> Vec<Fit::Value>;
}

/// Evaluates genomes one after another on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEvaluator;

impl<Fit: Fitness> BatchEvaluator<Fit> for SequentialEvaluator {
    fn evaluate_batch(&self, fitness: &Fit, genomes: &[Fit::Genome]) -> Vec<Fit::Value> {
        genomes.iter().map(|genome| fitness.evaluate(genome)).collect()
    }
}

/// Evaluates genomes on the rayon thread pool
#[cfg(feature = "parallel")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelEvaluator;

#[cfg(feature = "parallel")]
impl<Fit> BatchEvaluator<Fit> for ParallelEvaluator
where
    Fit: Fitness + Sync,
    Fit::Value: Send,
{
    fn evaluate_batch(&self, fitness: &Fit, genomes: &[Fit::Genome]) -> Vec<Fit::Value> {
        genomes
            .par_iter()
            .map(|genome| fitness.evaluate(genome))
            .collect()
    }
}

/// Evaluator used when none is configured
#[cfg(feature = "parallel")]
pub type DefaultEvaluator = ParallelEvaluator;

/// Evaluator used when none is configured
#[cfg(not(feature = "parallel"))]
pub type DefaultEvaluator = SequentialEvaluator;

/// Adapts a closure to the `BatchEvaluator` interface
///
/// The closure receives the fitness function and the batch, and is free to
/// distribute the work however it likes.
pub struct FnEvaluator<M>(pub M);

impl<Fit, M> BatchEvaluator<Fit> for FnEvaluator<M>
where
    Fit: Fitness,
    M: Fn(&Fit, &[Fit::Genome]) -> Vec<Fit::Value>,
{
    fn evaluate_batch(&self, fitness: &Fit, genomes: &[Fit::Genome]) -> Vec<Fit::Value> {
        (self.0)(fitness, genomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::traits::FnFitness;
    use std::cell::Cell;

    type SumFitness = FnFitness<Vec<i64>, fn(&Vec<i64>) -> i64, i64>;

    fn sum(genome: &Vec<i64>) -> i64 {
        genome.iter().sum()
    }

    fn sum_fitness() -> SumFitness {
        FnFitness::new(sum as fn(&Vec<i64>) -> i64)
    }

    #[test]
    fn test_sequential_preserves_order() {
        let genomes = vec![vec![3], vec![1, 1], vec![-2]];
        let values = SequentialEvaluator.evaluate_batch(&sum_fitness(), &genomes);
        assert_eq!(values, vec![3, 2, -2]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let genomes: Vec<Vec<i64>> = (0..500).map(|i| vec![i, i * 2]).collect();
        let fitness = sum_fitness();
        assert_eq!(
            ParallelEvaluator.evaluate_batch(&fitness, &genomes),
            SequentialEvaluator.evaluate_batch(&fitness, &genomes)
        );
    }

    #[test]
    fn test_fn_evaluator_is_called_once_per_batch() {
        let calls = Cell::new(0);
        let evaluator = FnEvaluator(|fitness: &SumFitness, genomes: &[Vec<i64>]| {
            calls.set(calls.get() + 1);
            SequentialEvaluator.evaluate_batch(fitness, genomes)
        });

        let values = evaluator.evaluate_batch(&sum_fitness(), &[vec![1], vec![2]]);
        assert_eq!(values, vec![1, 2]);
        assert_eq!(calls.get(), 1);
    }
}
