//! Choice selectors
//!
//! A selector resolves each production choice of a grammar expansion to one
//! alternative. `CodonSelector` is the genotype-to-phenotype mapping of
//! grammatical evolution: it consumes a codon string and, once the string
//! runs out, continues with a generator seeded from the string itself.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::genome::codons::Codons;

/// Resolves a choice among `count` alternatives to an index
pub trait ChoiceSelector {
    /// Pick an alternative; `count` is at least one and the result must be
    /// below `count`
    fn choose(&mut self, count: usize) -> usize;
}

impl<F> ChoiceSelector for F
where
    F: FnMut(usize) -> usize,
{
    fn choose(&mut self, count: usize) -> usize {
        self(count) % count
    }
}

/// Seed derived from the contents of a codon string
///
/// Equal codon strings always produce equal seeds within one build, which is
/// what makes the fallback choices of [`CodonSelector`] reproducible.
pub fn codon_seed(codons: &[u32]) -> u64 {
    let mut hasher = DefaultHasher::new();
    codons.hash(&mut hasher);
    hasher.finish()
}

/// Selector driven by a codon string
///
/// While codons remain, each choice consumes the next codon `c` and picks
/// alternative `c mod count`. After the last codon every choice is drawn
/// uniformly from a generator seeded once, at construction, with
/// [`codon_seed`]. Exhaustion is permanent.
#[derive(Clone, Debug)]
pub struct CodonSelector<'a, R = StdRng> {
    codons: std::slice::Iter<'a, u32>,
    rng: R,
    consumed: usize,
    exhausted: bool,
}

impl<'a> CodonSelector<'a, StdRng> {
    /// Create a selector with the default fallback generator
    pub fn new(codons: &'a [u32]) -> Self {
        Self::with_rng(codons)
    }
}

impl<'a, R: Rng + SeedableRng> CodonSelector<'a, R> {
    /// Create a selector with a custom fallback generator type
    pub fn with_rng(codons: &'a [u32]) -> Self {
        Self {
            codons: codons.iter(),
            rng: R::seed_from_u64(codon_seed(codons)),
            consumed: 0,
            exhausted: false,
        }
    }
}

impl<R> CodonSelector<'_, R> {
    /// Number of codons consumed so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Whether choices are now drawn from the fallback generator
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<'a> From<&'a Codons> for CodonSelector<'a, StdRng> {
    fn from(codons: &'a Codons) -> Self {
        Self::new(codons.as_slice())
    }
}

impl<R: Rng> ChoiceSelector for CodonSelector<'_, R> {
    fn choose(&mut self, count: usize) -> usize {
        if !self.exhausted {
            if let Some(&codon) = self.codons.next() {
                self.consumed += 1;
                return codon as usize % count;
            }
            self.exhausted = true;
            trace!(consumed = self.consumed, "codons exhausted, using seeded fallback");
        }
        self.rng.gen_range(0..count)
    }
}

/// Selector drawing every choice uniformly from a random generator
#[derive(Clone, Debug)]
pub struct RandomSelector<R> {
    rng: R,
}

impl<R: Rng> RandomSelector<R> {
    /// Create a random selector
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Get the generator back
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> ChoiceSelector for RandomSelector<R> {
    fn choose(&mut self, count: usize) -> usize {
        self.rng.gen_range(0..count)
    }
}
