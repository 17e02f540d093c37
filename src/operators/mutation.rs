//! Mutation operators
//!
//! Each built-in representation space doubles as the mutation operator for
//! its genome type, so sampling and mutation share one configuration.

use std::collections::BTreeSet;

use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};

use crate::genome::codons::{CodonSpace, Codons};
use crate::genome::composite::CompositeGenome;
use crate::genome::grid::{GridSpace, ParameterGrid};
use crate::genome::subset::{SubsetElement, SubsetSpace};
use crate::genome::traits::EvolutionaryGenome;
use crate::operators::traits::MutationOperator;

/// Edit applied by a codon mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CodonEdit {
    Clone,
    Delete,
    Replace,
}

impl CodonSpace {
    fn pick_edit<R: Rng>(&self, rng: &mut R) -> CodonEdit {
        match WeightedIndex::new(self.weights) {
            Ok(dist) => match dist.sample(rng) {
                0 => CodonEdit::Clone,
                1 => CodonEdit::Delete,
                _ => CodonEdit::Replace,
            },
            Err(_) => CodonEdit::Replace,
        }
    }
}

/// Codon string mutation
///
/// Picks one position and either appends a copy of its codon (clone),
/// removes it (delete) or advances it to the next alphabet value (replace).
/// A clone that would exceed `max_len` becomes a delete, and a delete on a
/// single-codon string becomes a replace, so lengths stay in `[1, max_len]`.
impl MutationOperator<Codons> for CodonSpace {
    fn mutate<R: Rng>(&self, genome: &mut Codons, rng: &mut R) {
        let mut codons = std::mem::take(genome).into_inner();
        if codons.is_empty() {
            codons.push(self.random_codon(rng));
            *genome = Codons::new(codons);
            return;
        }

        let mut edit = self.pick_edit(rng);
        let index = rng.gen_range(0..codons.len());

        if edit == CodonEdit::Clone {
            if codons.len() < self.max_len {
                codons.push(codons[index]);
            } else {
                edit = CodonEdit::Delete;
            }
        }
        if edit == CodonEdit::Delete {
            if codons.len() > 1 {
                codons.remove(index);
            } else {
                edit = CodonEdit::Replace;
            }
        }
        if edit == CodonEdit::Replace {
            codons[index] = self.successor(codons[index]);
        }

        *genome = Codons::new(codons);
    }
}

/// Subset mutation
///
/// Removes a random element with probability `rate`, otherwise adds a random
/// element of the universe; the result is repaired to the minimum size.
impl<T: SubsetElement> MutationOperator<BTreeSet<T>> for SubsetSpace<T> {
    fn mutate<R: Rng>(&self, genome: &mut BTreeSet<T>, rng: &mut R) {
        if rng.gen::<f64>() < self.rate {
            if !genome.is_empty() {
                let index = rng.gen_range(0..genome.len());
                if let Some(element) = genome.iter().nth(index).cloned() {
                    genome.remove(&element);
                }
            }
        } else if !self.omega.is_empty() {
            genome.insert(self.omega[rng.gen_range(0..self.omega.len())].clone());
        }
        self.repair(genome, rng);
    }
}

/// Grid mutation: every known parameter is resampled with probability `rate`
impl MutationOperator<ParameterGrid> for GridSpace {
    fn mutate<R: Rng>(&self, genome: &mut ParameterGrid, rng: &mut R) {
        for (name, value) in genome.iter_mut() {
            if let Some(domain) = self.parameters.get(name) {
                if rng.gen::<f64>() < self.rate {
                    *value = domain.sample(rng);
                }
            }
        }
    }
}

/// Mutation applying one operator per component of a composite genome
#[derive(Clone, Debug)]
pub struct CompositeMutation<MA, MB> {
    /// Mutation for the first component
    pub first: MA,
    /// Mutation for the second component
    pub second: MB,
}

impl<MA, MB> CompositeMutation<MA, MB> {
    /// Create a composite mutation
    pub fn new(first: MA, second: MB) -> Self {
        Self { first, second }
    }
}

impl<A, B, MA, MB> MutationOperator<CompositeGenome<A, B>> for CompositeMutation<MA, MB>
where
    A: EvolutionaryGenome,
    B: EvolutionaryGenome,
    MA: MutationOperator<A>,
    MB: MutationOperator<B>,
{
    fn mutate<R: Rng>(&self, genome: &mut CompositeGenome<A, B>, rng: &mut R) {
        self.first.mutate(&mut genome.first, rng);
        self.second.mutate(&mut genome.second, rng);
    }
}
