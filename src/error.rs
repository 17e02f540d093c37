//! Error types for evogram
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Error type for operator configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    /// Invalid operator configuration
    #[error("Invalid operator configuration: {0}")]
    InvalidConfiguration(String),
}

/// Error type for grammar expansion
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Too many nonterminals were suspended at once
    #[error("Expansion depth exceeded: {depth} pending nonterminals (limit {limit})")]
    DepthExceeded {
        /// Pending depth at the time of the check
        depth: usize,
        /// Configured maximum pending depth
        limit: usize,
    },

    /// A nonterminal requested a choice among zero alternatives
    #[error("Nonterminal requested a choice among zero alternatives")]
    EmptyChoice,

    /// Expansion finished without producing a plain value
    #[error("Expansion finished without a value")]
    Incomplete,

    /// A nonterminal was resumed with input it cannot accept
    #[error("Malformed expansion: {0}")]
    Malformed(String),
}

/// Top-level error type for evolution operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvolutionError {
    /// Elite count does not leave room for offspring
    #[error("Elite count must be lower than population count (elite {elite}, population {population})")]
    InvalidConfiguration {
        /// Requested elite count
        elite: usize,
        /// Initial population size
        population: usize,
    },

    /// Invalid or incomplete configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Operator error
    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,
}

/// Result type alias for evolution operations
pub type EvoResult<T> = Result<T, EvolutionError>;
