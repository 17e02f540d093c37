//! Subset genome
//!
//! Individuals are sets drawn from a finite universe. The set itself
//! (`BTreeSet`) is the genome; `SubsetSpace` describes the universe and the
//! minimum cardinality every individual must keep.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::genome::traits::Sampler;

/// Element bound for subset genomes
pub trait SubsetElement: Clone + Ord + Hash + Debug + Send + Sync + 'static {}

impl<T> SubsetElement for T where T: Clone + Ord + Hash + Debug + Send + Sync + 'static {}

/// Search space of subsets of `omega` holding at least `least` elements
#[derive(Clone, Debug, PartialEq)]
pub struct SubsetSpace<T: SubsetElement> {
    /// The universe elements are drawn from
    pub omega: Vec<T>,
    /// Minimum subset size
    pub least: usize,
    /// Probability that a mutation removes an element instead of adding one
    pub rate: f64,
}

impl<T: SubsetElement> SubsetSpace<T> {
    /// Create a subset space with removal rate 0.5
    pub fn new(omega: Vec<T>, least: usize) -> Self {
        assert!(
            least <= omega.len(),
            "Minimum subset size cannot exceed the universe size"
        );
        Self {
            omega,
            least,
            rate: 0.5,
        }
    }

    /// Set the removal rate
    pub fn with_rate(mut self, rate: f64) -> Self {
        assert!((0.0..=1.0).contains(&rate), "Rate must be in [0, 1]");
        self.rate = rate;
        self
    }

    /// Top up `member` with random unused elements until it holds `least`
    pub fn repair<R: Rng>(&self, member: &mut BTreeSet<T>, rng: &mut R) {
        if member.len() >= self.least {
            return;
        }
        let mut unused: Vec<&T> = self.omega.iter().filter(|x| !member.contains(*x)).collect();
        unused.shuffle(rng);
        for element in unused {
            if member.len() >= self.least {
                break;
            }
            member.insert(element.clone());
        }
    }
}

impl<T: SubsetElement> Sampler<BTreeSet<T>> for SubsetSpace<T> {
    fn sample<R: Rng>(&self, rng: &mut R) -> BTreeSet<T> {
        let size = rng.gen_range(self.least..=self.omega.len());
        let mut member: BTreeSet<T> = self.omega.choose_multiple(rng, size).cloned().collect();
        // duplicates in omega can leave the draw short
        self.repair(&mut member, rng);
        member
    }
}
