//! Composite genome for mixed-representation problems
//!
//! This module provides a genome type that combines two different genome types,
//! enabling optimization over heterogeneous solution spaces. Components can be
//! nested to combine more than two representations.

use rand::Rng;

use crate::genome::traits::{EvolutionaryGenome, Sampler};

/// A composite genome combining two different genome types
///
/// This is useful for problems that require multiple representations,
/// such as:
/// - A parameter grid plus a feature subset
/// - A codon string plus tuning parameters
///
/// # Type Parameters
/// - `A`: The first genome type
/// - `B`: The second genome type
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeGenome<A, B>
where
    A: EvolutionaryGenome,
    B: EvolutionaryGenome,
{
    /// First component genome
    pub first: A,
    /// Second component genome
    pub second: B,
}

impl<A, B> CompositeGenome<A, B>
where
    A: EvolutionaryGenome,
    B: EvolutionaryGenome,
{
    /// Create a new composite genome from two components
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Get a reference to the first component
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Get a reference to the second component
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Consume and return the components
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

/// Sampler drawing each component from its own sampler
#[derive(Clone, Debug)]
pub struct CompositeSampler<SA, SB> {
    /// Sampler for the first component
    pub first: SA,
    /// Sampler for the second component
    pub second: SB,
}

impl<SA, SB> CompositeSampler<SA, SB> {
    /// Create a composite sampler
    pub fn new(first: SA, second: SB) -> Self {
        Self { first, second }
    }
}

impl<A, B, SA, SB> Sampler<CompositeGenome<A, B>> for CompositeSampler<SA, SB>
where
    A: EvolutionaryGenome,
    B: EvolutionaryGenome,
    SA: Sampler<A>,
    SB: Sampler<B>,
{
    fn sample<R: Rng>(&self, rng: &mut R) -> CompositeGenome<A, B> {
        CompositeGenome::new(self.first.sample(rng), self.second.sample(rng))
    }
}
