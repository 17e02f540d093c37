//! Fitness traits
//!
//! This module defines the fitness evaluation traits. Fitness follows the
//! minimization convention throughout the crate: lower values are better,
//! and populations are sorted ascending.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::genome::traits::EvolutionaryGenome;

/// Trait bound for fitness values
///
/// Fitness values must be ordered and convertible to f64 for statistics.
pub trait FitnessValue: PartialOrd + Clone + Send + Sync + Debug + 'static {
    /// Convert fitness to f64 for statistics and termination checks
    fn to_f64(&self) -> f64;

    /// Total order used when sorting a population
    ///
    /// The default falls back to `partial_cmp`; float implementations order
    /// NaN after every other value.
    fn fitness_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }

    /// Check if this fitness is better (lower) than another
    fn is_better_than(&self, other: &Self) -> bool {
        self.fitness_cmp(other) == Ordering::Less
    }

    /// Check if this fitness is worse (higher) than another
    fn is_worse_than(&self, other: &Self) -> bool {
        other.is_better_than(self)
    }
}

macro_rules! float_fitness {
    ($($t:ty),*) => {$(
        impl FitnessValue for $t {
            fn to_f64(&self) -> f64 {
                *self as f64
            }

            fn fitness_cmp(&self, other: &Self) -> Ordering {
                match (self.is_nan(), other.is_nan()) {
                    (false, false) => self.partial_cmp(other).unwrap_or(Ordering::Equal),
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                }
            }
        }
    )*};
}

macro_rules! integer_fitness {
    ($($t:ty),*) => {$(
        impl FitnessValue for $t {
            fn to_f64(&self) -> f64 {
                *self as f64
            }

            fn fitness_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    )*};
}

float_fitness!(f64, f32);
integer_fitness!(i64, i32, u64, usize);

/// Compare two optional fitness values; missing values sort last
pub fn compare_optional<F: FitnessValue>(a: Option<&F>, b: Option<&F>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.fitness_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Fitness evaluation trait
///
/// Defines how to evaluate the fitness of a genome. Evaluation must be a
/// pure function of the genome: the engine memoizes results, so the same
/// genome has to yield the same value for the lifetime of one run.
///
/// Failures inside an evaluation (say, a decoded program dividing by zero)
/// are best mapped to a sentinel worst value such as `f64::INFINITY`; a
/// panic propagates out of the engine unchanged.
pub trait Fitness {
    /// The genome type being evaluated
    type Genome: EvolutionaryGenome;

    /// The fitness value type
    type Value: FitnessValue;

    /// Evaluate fitness (lower = better)
    fn evaluate(&self, genome: &Self::Genome) -> Self::Value;
}

impl<T: Fitness + ?Sized> Fitness for &T {
    type Genome = T::Genome;
    type Value = T::Value;

    fn evaluate(&self, genome: &Self::Genome) -> Self::Value {
        (**self).evaluate(genome)
    }
}

/// A simple function wrapper for fitness evaluation
pub struct FnFitness<G, F, V>
where
    F: Fn(&G) -> V,
{
    f: F,
    _marker: std::marker::PhantomData<fn(&G) -> V>,
}

impl<G, F, V> FnFitness<G, F, V>
where
    F: Fn(&G) -> V,
{
    /// Create a new function-based fitness evaluator
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<G, F, V> Fitness for FnFitness<G, F, V>
where
    G: EvolutionaryGenome,
    F: Fn(&G) -> V,
    V: FitnessValue,
{
    type Genome = G;
    type Value = V;

    fn evaluate(&self, genome: &Self::Genome) -> Self::Value {
        (self.f)(genome)
    }
}
