//! Codon string genome
//!
//! This module provides the integer codon sequence used by grammatical
//! evolution, together with the sampler describing its search space.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::OperatorError;
use crate::genome::traits::{Sampler, SequenceGenome};

/// Variable-length sequence of codons
///
/// Each codon indexes, modulo the number of alternatives, into whichever
/// production choice is being resolved while the genome is decoded by a
/// grammar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Codons {
    codons: Vec<u32>,
}

impl Codons {
    /// Create a codon string from raw values
    pub fn new(codons: Vec<u32>) -> Self {
        Self { codons }
    }

    /// Get the codons as a slice
    pub fn as_slice(&self) -> &[u32] {
        &self.codons
    }

    /// Get the underlying vector
    pub fn into_inner(self) -> Vec<u32> {
        self.codons
    }

    /// Iterate over the codons
    pub fn iter(&self) -> std::slice::Iter<'_, u32> {
        self.codons.iter()
    }
}

impl SequenceGenome for Codons {
    type Gene = u32;

    fn genes(&self) -> &[u32] {
        &self.codons
    }

    fn from_genes(genes: Vec<u32>) -> Self {
        Self::new(genes)
    }
}

impl std::ops::Index<usize> for Codons {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.codons[index]
    }
}

impl From<Vec<u32>> for Codons {
    fn from(codons: Vec<u32>) -> Self {
        Self::new(codons)
    }
}

impl<const N: usize> From<[u32; N]> for Codons {
    fn from(codons: [u32; N]) -> Self {
        Self::new(codons.to_vec())
    }
}

impl<'a> IntoIterator for &'a Codons {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.codons.iter()
    }
}

/// Search space of codon strings
///
/// Codons are drawn from `alphabet` and strings hold between one and
/// `max_len` codons. The mutation weights select between cloning a codon,
/// deleting one, and replacing one with its alphabet successor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodonSpace {
    /// Values a codon may take
    pub alphabet: Vec<u32>,
    /// Maximum number of codons in one string
    pub max_len: usize,
    /// Relative weights of the clone, delete and replace mutations
    pub weights: [f64; 3],
}

impl CodonSpace {
    /// Create a codon space with equal mutation weights
    pub fn new(alphabet: Vec<u32>, max_len: usize) -> Self {
        assert!(!alphabet.is_empty(), "Codon alphabet cannot be empty");
        assert!(max_len >= 1, "Maximum codon string length must be at least 1");
        Self {
            alphabet,
            max_len,
            weights: [1.0, 1.0, 1.0],
        }
    }

    /// Create a codon space from configuration values
    pub fn try_new(alphabet: Vec<u32>, max_len: usize) -> Result<Self, OperatorError> {
        if alphabet.is_empty() {
            return Err(OperatorError::InvalidConfiguration(
                "codon alphabet is empty".to_string(),
            ));
        }
        if max_len == 0 {
            return Err(OperatorError::InvalidConfiguration(
                "maximum codon string length is zero".to_string(),
            ));
        }
        Ok(Self::new(alphabet, max_len))
    }

    /// Alphabet `0..n`
    pub fn with_range(n: u32, max_len: usize) -> Self {
        Self::new((0..n).collect(), max_len)
    }

    /// Set the clone, delete and replace mutation weights
    pub fn with_weights(self, clone: f64, delete: f64, replace: f64) -> Self {
        match self.try_with_weights(clone, delete, replace) {
            Ok(space) => space,
            Err(err) => panic!("{}", err),
        }
    }

    /// Set the mutation weights from configuration values
    ///
    /// Weights must be finite and non-negative, and at least one must be
    /// positive.
    pub fn try_with_weights(
        mut self,
        clone: f64,
        delete: f64,
        replace: f64,
    ) -> Result<Self, OperatorError> {
        let weights = [clone, delete, replace];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(OperatorError::InvalidConfiguration(format!(
                "mutation weights must be finite and non-negative, got {:?}",
                weights
            )));
        }
        if weights.iter().all(|&w| w == 0.0) {
            return Err(OperatorError::InvalidConfiguration(
                "mutation weights are all zero".to_string(),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    /// Draw one codon uniformly from the alphabet
    pub fn random_codon<R: Rng>(&self, rng: &mut R) -> u32 {
        self.alphabet[rng.gen_range(0..self.alphabet.len())]
    }

    /// Alphabet value following `codon`, wrapping around
    ///
    /// Codons outside the alphabet map to its first value.
    pub fn successor(&self, codon: u32) -> u32 {
        match self.alphabet.iter().position(|&c| c == codon) {
            Some(index) => self.alphabet[(index + 1) % self.alphabet.len()],
            None => self.alphabet[0],
        }
    }
}

impl Sampler<Codons> for CodonSpace {
    fn sample<R: Rng>(&self, rng: &mut R) -> Codons {
        let len = rng.gen_range(1..=self.max_len);
        Codons::new((0..len).map(|_| self.random_codon(rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_codons_sequence() {
        let codons = Codons::from([0, 0, 1]);
        assert_eq!(codons.len(), 3);
        assert_eq!(codons[2], 1);
        assert_eq!(codons.genes(), &[0, 0, 1]);
        assert_eq!(Codons::from_genes(vec![4, 2]).into_inner(), vec![4, 2]);
    }

    #[test]
    fn test_samples_respect_space() {
        let mut rng = StdRng::seed_from_u64(3);
        let space = CodonSpace::with_range(4, 10);

        for codons in space.samples(200, &mut rng) {
            assert!(!codons.is_empty());
            assert!(codons.len() <= 10);
            assert!(codons.iter().all(|&c| c < 4));
        }
    }

    #[test]
    fn test_successor_wraps() {
        let space = CodonSpace::new(vec![3, 5, 7], 4);
        assert_eq!(space.successor(3), 5);
        assert_eq!(space.successor(7), 3);
        assert_eq!(space.successor(100), 3);
    }

    #[test]
    fn test_try_new_rejects_empty_alphabet() {
        assert!(CodonSpace::try_new(vec![], 4).is_err());
        assert!(CodonSpace::try_new(vec![1], 0).is_err());
        assert!(CodonSpace::try_new(vec![1], 1).is_ok());
    }

    #[test]
    fn test_try_with_weights_rejects_invalid() {
        let space = CodonSpace::with_range(4, 8);
        assert_eq!(
            space.clone().try_with_weights(0.0, 0.0, 0.0),
            Err(OperatorError::InvalidConfiguration(
                "mutation weights are all zero".to_string()
            ))
        );
        assert!(space.clone().try_with_weights(1.0, -1.0, 1.0).is_err());
        assert!(space.clone().try_with_weights(f64::NAN, 1.0, 1.0).is_err());

        let weighted = space.try_with_weights(0.0, 2.0, 0.0).unwrap();
        assert_eq!(weighted.weights, [0.0, 2.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "mutation weights are all zero")]
    fn test_zero_weights_panic() {
        CodonSpace::with_range(4, 8).with_weights(0.0, 0.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "Codon alphabet cannot be empty")]
    fn test_empty_alphabet_panics() {
        CodonSpace::new(vec![], 4);
    }
}
