//! Grammatical evolution
//!
//! Grammars are written as resumable nonterminal computations and expanded
//! by a stack interpreter, with every production choice resolved by a
//! [`ChoiceSelector`](selector::ChoiceSelector). Driving the selector from a
//! codon string turns a [`Codons`](crate::genome::codons::Codons) individual
//! into a phenotype.

pub mod arithmetic;
pub mod expand;
pub mod selector;

pub mod prelude {
    pub use super::arithmetic::{ArithmeticGrammar, BinaryOp, Expr, Fragment};
    pub use super::expand::{
        expand, BoxedNonterminal, Grammar, Nonterminal, OneOf, Step, Symbol, Terminal,
    };
    pub use super::selector::{codon_seed, ChoiceSelector, CodonSelector, RandomSelector};
}
