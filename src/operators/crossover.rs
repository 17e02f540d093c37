//! Crossover operators
//!
//! This module provides crossover operators for sequence, subset and
//! composite genomes. All of them produce a single offspring.

use std::collections::BTreeSet;

use rand::Rng;

use crate::genome::composite::CompositeGenome;
use crate::genome::subset::{SubsetElement, SubsetSpace};
use crate::genome::traits::{EvolutionaryGenome, SequenceGenome};
use crate::operators::traits::CrossoverOperator;

/// Two-point crossover for sequences
///
/// A segment of random length `k` (between one and the shorter parent's
/// length) is cut from `second` and replaces a segment of the same length in
/// `first`. The offspring keeps the length of `first`.
#[derive(Clone, Debug, Default)]
pub struct TwoPointCrossover;

impl TwoPointCrossover {
    /// Create a new two-point crossover
    pub fn new() -> Self {
        Self
    }
}

impl<G: SequenceGenome> CrossoverOperator<G> for TwoPointCrossover {
    fn crossover<R: Rng>(&self, first: &G, second: &G, rng: &mut R) -> G {
        if first.is_empty() {
            return second.clone();
        }
        if second.is_empty() {
            return first.clone();
        }

        let (a_genes, b_genes) = (first.genes(), second.genes());
        let k = rng.gen_range(1..=a_genes.len().min(b_genes.len()));
        let a = rng.gen_range(0..=a_genes.len() - k);
        let b = rng.gen_range(0..=b_genes.len() - k);

        let mut genes = Vec::with_capacity(a_genes.len());
        genes.extend_from_slice(&a_genes[..a]);
        genes.extend_from_slice(&b_genes[b..b + k]);
        genes.extend_from_slice(&a_genes[a + k..]);
        G::from_genes(genes)
    }
}

/// Uniform crossover for sequences
///
/// `second` is aligned against `first` at a random offset (the overlap is as
/// long as the shorter parent); each position then takes the gene of `first`
/// with probability `bias` and the aligned gene otherwise. Positions outside
/// the overlap keep the gene of `first`.
#[derive(Clone, Debug)]
pub struct UniformCrossover {
    /// Probability of choosing from `first` (default: 0.5)
    pub bias: f64,
}

impl UniformCrossover {
    /// Create a new uniform crossover
    pub fn new() -> Self {
        Self { bias: 0.5 }
    }

    /// Create with a specific bias towards `first`
    pub fn with_bias(bias: f64) -> Self {
        assert!((0.0..=1.0).contains(&bias), "Bias must be in [0, 1]");
        Self { bias }
    }
}

impl Default for UniformCrossover {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: SequenceGenome> CrossoverOperator<G> for UniformCrossover {
    fn crossover<R: Rng>(&self, first: &G, second: &G, rng: &mut R) -> G {
        if first.is_empty() {
            return second.clone();
        }
        if second.is_empty() {
            return first.clone();
        }

        let (a_genes, b_genes) = (first.genes(), second.genes());
        let k = a_genes.len().min(b_genes.len());
        let offset = rng.gen_range(0..=a_genes.len() - k);

        let genes = a_genes
            .iter()
            .enumerate()
            .map(|(i, gene)| {
                let aligned = if (offset..offset + k).contains(&i) {
                    &b_genes[i - offset]
                } else {
                    gene
                };
                if rng.gen::<f64>() < self.bias {
                    gene.clone()
                } else {
                    aligned.clone()
                }
            })
            .collect();
        G::from_genes(genes)
    }
}

/// One-point tail-exchange (ripple) crossover
///
/// The usual crossover of grammatical evolution: a prefix of `first` is
/// joined with a suffix of `second` (prefix first with probability `bias`,
/// suffix first otherwise) and the result is truncated to `max_len` genes.
#[derive(Clone, Debug)]
pub struct RippleCrossover {
    /// Maximum offspring length
    pub max_len: usize,
    /// Probability of placing the prefix of `first` before the suffix
    pub bias: f64,
}

impl RippleCrossover {
    /// Create a ripple crossover with bias 0.5
    pub fn new(max_len: usize) -> Self {
        Self { max_len, bias: 0.5 }
    }

    /// Set the ordering bias
    pub fn with_bias(mut self, bias: f64) -> Self {
        assert!((0.0..=1.0).contains(&bias), "Bias must be in [0, 1]");
        self.bias = bias;
        self
    }
}

impl<G: SequenceGenome> CrossoverOperator<G> for RippleCrossover {
    fn crossover<R: Rng>(&self, first: &G, second: &G, rng: &mut R) -> G {
        if first.is_empty() {
            return second.clone();
        }
        if second.is_empty() {
            return first.clone();
        }

        let (a_genes, b_genes) = (first.genes(), second.genes());
        let i = rng.gen_range(0..a_genes.len());
        let j = rng.gen_range(0..b_genes.len());
        let (prefix, suffix) = (&a_genes[..i], &b_genes[j..]);

        let mut genes = Vec::with_capacity(prefix.len() + suffix.len());
        if rng.gen::<f64>() < self.bias {
            genes.extend_from_slice(prefix);
            genes.extend_from_slice(suffix);
        } else {
            genes.extend_from_slice(suffix);
            genes.extend_from_slice(prefix);
        }
        genes.truncate(self.max_len);
        G::from_genes(genes)
    }
}

/// Crossover returning the union of two subsets
#[derive(Clone, Debug, Default)]
pub struct UnionCrossover;

impl<T: SubsetElement> CrossoverOperator<BTreeSet<T>> for UnionCrossover {
    fn crossover<R: Rng>(&self, first: &BTreeSet<T>, second: &BTreeSet<T>, _rng: &mut R) -> BTreeSet<T> {
        first.union(second).cloned().collect()
    }
}

/// Crossover returning either the union or the intersection of two subsets
///
/// An intersection that falls below the space's minimum size is topped up
/// with random elements of the universe.
#[derive(Clone, Debug)]
pub struct UnionOrIntersectionCrossover<T: SubsetElement> {
    /// Space used to repair undersized offspring
    pub space: SubsetSpace<T>,
}

impl<T: SubsetElement> UnionOrIntersectionCrossover<T> {
    /// Create the crossover for a subset space
    pub fn new(space: SubsetSpace<T>) -> Self {
        Self { space }
    }
}

impl<T: SubsetElement> CrossoverOperator<BTreeSet<T>> for UnionOrIntersectionCrossover<T> {
    fn crossover<R: Rng>(&self, first: &BTreeSet<T>, second: &BTreeSet<T>, rng: &mut R) -> BTreeSet<T> {
        let mut child: BTreeSet<T> = if rng.gen::<f64>() < 0.5 {
            first.union(second).cloned().collect()
        } else {
            first.intersection(second).cloned().collect()
        };
        self.space.repair(&mut child, rng);
        child
    }
}

/// Crossover applying one operator per component of a composite genome
#[derive(Clone, Debug)]
pub struct CompositeCrossover<CA, CB> {
    /// Crossover for the first component
    pub first: CA,
    /// Crossover for the second component
    pub second: CB,
}

impl<CA, CB> CompositeCrossover<CA, CB> {
    /// Create a composite crossover
    pub fn new(first: CA, second: CB) -> Self {
        Self { first, second }
    }
}

impl<A, B, CA, CB> CrossoverOperator<CompositeGenome<A, B>> for CompositeCrossover<CA, CB>
where
    A: EvolutionaryGenome,
    B: EvolutionaryGenome,
    CA: CrossoverOperator<A>,
    CB: CrossoverOperator<B>,
{
    fn crossover<R: Rng>(
        &self,
        first: &CompositeGenome<A, B>,
        second: &CompositeGenome<A, B>,
        rng: &mut R,
    ) -> CompositeGenome<A, B> {
        CompositeGenome::new(
            self.first.crossover(&first.first, &second.first, rng),
            self.second.crossover(&first.second, &second.second, rng),
        )
    }
}
