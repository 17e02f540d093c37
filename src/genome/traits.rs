//! Core genome traits
//!
//! This module defines the `EvolutionaryGenome` trait and the sequence and
//! sampling abstractions shared by the built-in representations.

use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;

/// Core genome abstraction for evolutionary algorithms.
///
/// An individual is an immutable value: equality and hash identity are what
/// the fitness cache keys on, so two structurally distinct but equal genomes
/// share one fitness entry. Any cloneable, hashable, thread-safe value
/// qualifies; the trait is implemented automatically.
pub trait EvolutionaryGenome: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> EvolutionaryGenome for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Trait for genomes that are ordered sequences of genes
///
/// Sequence crossovers (two-point, uniform, ripple) are written against this
/// trait so they work for plain vectors and codon strings alike.
pub trait SequenceGenome: EvolutionaryGenome {
    /// The gene type
    type Gene: Clone;

    /// Get the genes as a slice
    fn genes(&self) -> &[Self::Gene];

    /// Create from a vector of genes
    fn from_genes(genes: Vec<Self::Gene>) -> Self;

    /// Number of genes
    fn len(&self) -> usize {
        self.genes().len()
    }

    /// Check whether the sequence has no genes
    fn is_empty(&self) -> bool {
        self.genes().is_empty()
    }
}

impl<T> SequenceGenome for Vec<T>
where
    T: Clone + Eq + Hash + Debug + Send + Sync + 'static,
{
    type Gene = T;

    fn genes(&self) -> &[T] {
        self
    }

    fn from_genes(genes: Vec<T>) -> Self {
        genes
    }
}

/// Random generator for genomes of a representation
///
/// Samplers produce initial populations; the representation types that
/// implement it usually also implement a matching mutation operator.
pub trait Sampler<G: EvolutionaryGenome> {
    /// Draw one random genome
    fn sample<R: Rng>(&self, rng: &mut R) -> G;

    /// Draw `n` random genomes
    fn samples<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<G> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}
