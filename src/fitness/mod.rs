//! Fitness evaluation and memoization
//!
//! This module provides the fitness abstraction, batch evaluators and the
//! bounded fitness cache used by the evolution engine.

pub mod cache;
pub mod evaluator;
pub mod traits;

pub mod prelude {
    pub use super::cache::*;
    pub use super::evaluator::*;
    pub use super::traits::*;
}
