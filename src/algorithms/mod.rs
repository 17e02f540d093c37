//! Evolutionary algorithms
//!
//! This module provides the generational genetic algorithm.

pub mod generational;

pub mod prelude {
    pub use super::generational::*;
}
