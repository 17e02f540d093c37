//! Grammar expansion interpreter
//!
//! A nonterminal is a resumable computation. Each time it is resumed with the
//! last resolved symbol it either asks for a choice among alternatives, asks
//! for the full expansion of a nested nonterminal, or finishes with a symbol
//! of its own. [`expand`] drives a stack of suspended nonterminals until the
//! start symbol has produced a plain value.

use std::fmt;

use tracing::debug;

use crate::error::GrammarError;
use crate::grammar::selector::ChoiceSelector;

/// Boxed nonterminal borrowing from its grammar for `'g`
pub type BoxedNonterminal<'g, V> = Box<dyn Nonterminal<'g, V> + 'g>;

/// A grammar symbol: either a resolved value or a nonterminal not yet run
pub enum Symbol<'g, V> {
    /// Fully resolved fragment
    Value(V),
    /// Nonterminal computation that has not been started
    Pending(BoxedNonterminal<'g, V>),
}

impl<'g, V> Symbol<'g, V> {
    /// Wrap a nonterminal as a pending symbol
    pub fn pending<N: Nonterminal<'g, V> + 'g>(nonterminal: N) -> Self {
        Symbol::Pending(Box::new(nonterminal))
    }

    /// Take the resolved value, if any
    pub fn into_value(self) -> Option<V> {
        match self {
            Symbol::Value(value) => Some(value),
            Symbol::Pending(_) => None,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Symbol<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Symbol::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// What a resumed nonterminal asks of the interpreter
pub enum Step<'g, V> {
    /// Pick one of the alternatives and feed it back
    Choose(Vec<Symbol<'g, V>>),
    /// Fully expand the nested nonterminal and feed back its value
    Expand(BoxedNonterminal<'g, V>),
    /// Finish with the given symbol
    Done(Symbol<'g, V>),
}

/// Resumable nonterminal computation
///
/// `resume` is called with `None` the first time and afterwards with the
/// symbol resolved for its previous request.
pub trait Nonterminal<'g, V> {
    /// Run until the next request or completion
    fn resume(&mut self, input: Option<Symbol<'g, V>>) -> Result<Step<'g, V>, GrammarError>;
}

/// A set of nonterminal definitions with a start symbol
pub trait Grammar<V> {
    /// Fresh computation for the start symbol
    fn start(&self) -> BoxedNonterminal<'_, V>;

    /// Expand the start symbol with the given selector
    fn expand_with<S>(&self, selector: &mut S, max_depth: usize) -> Result<V, GrammarError>
    where
        S: ChoiceSelector + ?Sized,
    {
        expand(self.start(), selector, max_depth)
    }
}

/// Nonterminal finishing immediately with a fixed value
#[derive(Clone, Debug)]
pub struct Terminal<V> {
    value: Option<V>,
}

impl<V> Terminal<V> {
    /// Create a terminal
    pub fn new(value: V) -> Self {
        Self { value: Some(value) }
    }
}

impl<'g, V> Nonterminal<'g, V> for Terminal<V> {
    fn resume(&mut self, _input: Option<Symbol<'g, V>>) -> Result<Step<'g, V>, GrammarError> {
        self.value
            .take()
            .map(|value| Step::Done(Symbol::Value(value)))
            .ok_or_else(|| GrammarError::Malformed("terminal resumed after completion".into()))
    }
}

/// Nonterminal choosing one alternative and finishing with it
///
/// A chosen pending alternative is handed back to the interpreter, which
/// runs it in place of this rule.
pub struct OneOf<'g, V> {
    alternatives: Option<Vec<Symbol<'g, V>>>,
}

impl<'g, V> OneOf<'g, V> {
    /// Create a choice rule over the given alternatives
    pub fn new(alternatives: Vec<Symbol<'g, V>>) -> Self {
        Self {
            alternatives: Some(alternatives),
        }
    }
}

impl<'g, V> Nonterminal<'g, V> for OneOf<'g, V> {
    fn resume(&mut self, input: Option<Symbol<'g, V>>) -> Result<Step<'g, V>, GrammarError> {
        match (self.alternatives.take(), input) {
            (Some(alternatives), None) => Ok(Step::Choose(alternatives)),
            (None, Some(chosen)) => Ok(Step::Done(chosen)),
            _ => Err(GrammarError::Malformed("choice rule resumed out of order".into())),
        }
    }
}

/// Expand `start` to a value
///
/// The interpreter keeps a stack of suspended nonterminals. Before each
/// resume the stack depth is compared against `max_depth`; reaching it fails
/// with [`GrammarError::DepthExceeded`]. Pass `usize::MAX` for no bound.
pub fn expand<'g, V, S>(
    start: BoxedNonterminal<'g, V>,
    selector: &mut S,
    max_depth: usize,
) -> Result<V, GrammarError>
where
    S: ChoiceSelector + ?Sized,
{
    let mut pending: Vec<BoxedNonterminal<'g, V>> = vec![start];
    let mut resolved: Option<Symbol<'g, V>> = None;

    loop {
        let depth = pending.len();
        if depth == 0 {
            break;
        }
        if depth >= max_depth {
            debug!(depth, limit = max_depth, "grammar expansion exceeded depth");
            return Err(GrammarError::DepthExceeded {
                depth,
                limit: max_depth,
            });
        }

        let Some(top) = pending.last_mut() else {
            break;
        };
        match top.resume(resolved.take())? {
            Step::Done(symbol) => {
                pending.pop();
                match symbol {
                    Symbol::Pending(nonterminal) => pending.push(nonterminal),
                    value => resolved = Some(value),
                }
            }
            Step::Expand(nonterminal) => pending.push(nonterminal),
            Step::Choose(mut alternatives) => {
                if alternatives.is_empty() {
                    return Err(GrammarError::EmptyChoice);
                }
                let count = alternatives.len();
                let index = selector.choose(count) % count;
                resolved = Some(alternatives.swap_remove(index));
            }
        }
    }

    resolved
        .and_then(Symbol::into_value)
        .ok_or(GrammarError::Incomplete)
}
