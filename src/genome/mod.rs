//! Genome abstractions and implementations
//!
//! This module provides the core `EvolutionaryGenome` trait and built-in genome types.

pub mod codons;
pub mod composite;
pub mod grid;
pub mod subset;
pub mod traits;

pub mod prelude {
    pub use super::codons::*;
    pub use super::composite::*;
    pub use super::grid::*;
    pub use super::subset::*;
    pub use super::traits::*;
}
