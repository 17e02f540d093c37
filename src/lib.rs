//! # evogram
//!
//! A generational genetic algorithm with memoized fitness and grammatical
//! evolution support.
//!
//! ## Core Concepts
//!
//! - **Minimized fitness**: lower values are better; results are memoized in
//!   a bounded least-recently-used cache
//! - **Unbounded runs**: the engine is an iterator of generations and the
//!   caller decides when to stop
//! - **Grammatical evolution**: codon strings decode into phenotypes through
//!   a grammar whose production choices are driven by the codons
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evogram::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let space = CodonSpace::with_range(4, 100);
//!
//! let result = GenerationalGA::builder()
//!     .population(space.samples(300, &mut rng))
//!     .fitness(FnFitness::new(|codons: &Codons| loss(codons)))
//!     .selection(TournamentSelection::binary())
//!     .crossover(RippleCrossover::new(100))
//!     .mutation(space)
//!     .elite_count(5)
//!     .build(rng)?
//!     .run(&MaxGenerations::new(500))?;
//! ```

pub mod algorithms;
pub mod diagnostics;
pub mod error;
pub mod fitness;
pub mod genome;
pub mod grammar;
pub mod operators;
pub mod termination;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::error::*;
    pub use crate::fitness::prelude::*;
    pub use crate::genome::prelude::*;
    pub use crate::grammar::prelude::*;
    pub use crate::operators::prelude::*;
    pub use crate::termination::prelude::*;
}
