//! Parameter grid genome
//!
//! A grid individual assigns one integer value to each named parameter.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::genome::traits::Sampler;

/// Genome of a parameter grid: parameter name to value
pub type ParameterGrid = BTreeMap<String, i64>;

/// Values a single grid parameter may take
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterDomain {
    /// One of an explicit list of values
    Choice(Vec<i64>),
    /// Any value in the inclusive range
    Range {
        /// Lowest value
        low: i64,
        /// Highest value
        high: i64,
    },
}

impl ParameterDomain {
    /// Draw a value from the domain
    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        match self {
            Self::Choice(values) => values[rng.gen_range(0..values.len())],
            Self::Range { low, high } => rng.gen_range(*low..=*high),
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            Self::Choice(values) => !values.is_empty(),
            Self::Range { low, high } => low <= high,
        }
    }
}

/// Search space of parameter grids
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpace {
    /// Named parameter domains
    pub parameters: BTreeMap<String, ParameterDomain>,
    /// Per-parameter resampling probability used by mutation
    pub rate: f64,
}

impl GridSpace {
    /// Create a grid space with an explicit resampling rate
    pub fn new(parameters: BTreeMap<String, ParameterDomain>, rate: f64) -> Self {
        assert!(
            parameters.values().all(ParameterDomain::is_valid),
            "Parameter domains cannot be empty"
        );
        assert!((0.0..=1.0).contains(&rate), "Rate must be in [0, 1]");
        Self { parameters, rate }
    }

    /// Create a grid space resampling one parameter per mutation on average
    pub fn auto(parameters: BTreeMap<String, ParameterDomain>) -> Self {
        let rate = if parameters.is_empty() {
            0.0
        } else {
            1.0 / parameters.len() as f64
        };
        Self::new(parameters, rate)
    }
}

impl Sampler<ParameterGrid> for GridSpace {
    fn sample<R: Rng>(&self, rng: &mut R) -> ParameterGrid {
        self.parameters
            .iter()
            .map(|(name, domain)| (name.clone(), domain.sample(rng)))
            .collect()
    }
}
