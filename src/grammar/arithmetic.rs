//! Arithmetic expression grammar
//!
//! ```text
//! exp    -> binary | var
//! binary -> op exp exp
//! var    -> leaf
//! ```
//!
//! Used for symbolic regression: a codon string decodes into an [`Expr`]
//! tree which is then evaluated against sample points.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GrammarError;
use crate::grammar::expand::{BoxedNonterminal, Grammar, Nonterminal, OneOf, Step, Symbol};
use crate::grammar::selector::CodonSelector;

/// Binary arithmetic operator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
}

impl BinaryOp {
    /// All operators in grammar order
    pub const ALL: [BinaryOp; 4] = [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div];

    /// Infix symbol
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// Apply the operator; division by zero yields `None`
    pub fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            BinaryOp::Add => Some(lhs + rhs),
            BinaryOp::Sub => Some(lhs - rhs),
            BinaryOp::Mul => Some(lhs * rhs),
            BinaryOp::Div if rhs == 0.0 => None,
            BinaryOp::Div => Some(lhs / rhs),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Arithmetic expression tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Named variable
    Var(String),
    /// Numeric constant
    Const(f64),
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Variable leaf
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    /// Binary node
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Evaluate with the given variable bindings
    ///
    /// Returns `None` on division by zero or an unbound variable.
    pub fn eval(&self, bindings: &HashMap<String, f64>) -> Option<f64> {
        match self {
            Expr::Var(name) => bindings.get(name).copied(),
            Expr::Const(value) => Some(*value),
            Expr::Binary { op, lhs, rhs } => op.apply(lhs.eval(bindings)?, rhs.eval(bindings)?),
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            Expr::Var(_) | Expr::Const(_) => 1,
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.size() + rhs.size(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(name) => f.write_str(name),
            Expr::Const(value) => write!(f, "{}", value),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

/// Value flowing through an arithmetic expansion
#[derive(Clone, Debug, PartialEq)]
pub enum Fragment {
    /// Chosen operator
    Op(BinaryOp),
    /// Finished subexpression
    Expr(Expr),
}

/// Infix arithmetic grammar over a fixed set of leaves and operators
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArithmeticGrammar {
    leaves: Vec<Expr>,
    ops: Vec<BinaryOp>,
}

impl ArithmeticGrammar {
    /// Create a grammar
    ///
    /// # Panics
    /// Panics if `leaves` or `ops` is empty.
    pub fn new(leaves: Vec<Expr>, ops: Vec<BinaryOp>) -> Self {
        assert!(!leaves.is_empty(), "Grammar needs at least one leaf");
        assert!(!ops.is_empty(), "Grammar needs at least one operator");
        Self { leaves, ops }
    }

    /// Grammar over named variables with all four operators
    pub fn with_variables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Expr::var).collect(), BinaryOp::ALL.to_vec())
    }

    /// Leaves in choice order
    pub fn leaves(&self) -> &[Expr] {
        &self.leaves
    }

    /// Operators in choice order
    pub fn ops(&self) -> &[BinaryOp] {
        &self.ops
    }

    /// `exp -> binary | var`
    pub fn exp(&self) -> BoxedNonterminal<'_, Fragment> {
        Box::new(OneOf::new(vec![
            Symbol::Pending(self.binary()),
            Symbol::Pending(self.var()),
        ]))
    }

    /// `binary -> op exp exp`
    pub fn binary(&self) -> BoxedNonterminal<'_, Fragment> {
        Box::new(Binary {
            grammar: self,
            state: BinaryState::Start,
        })
    }

    /// `var -> leaf`
    pub fn var(&self) -> BoxedNonterminal<'_, Fragment> {
        Box::new(OneOf::new(
            self.leaves
                .iter()
                .map(|leaf| Symbol::Value(Fragment::Expr(leaf.clone())))
                .collect(),
        ))
    }

    /// Decode a codon string into an expression
    pub fn decode(&self, codons: &[u32], max_depth: usize) -> Result<Expr, GrammarError> {
        let mut selector = CodonSelector::new(codons);
        match self.expand_with(&mut selector, max_depth)? {
            Fragment::Expr(expr) => Ok(expr),
            Fragment::Op(op) => Err(GrammarError::Malformed(format!(
                "expansion produced a bare operator {}",
                op
            ))),
        }
    }
}

impl Grammar<Fragment> for ArithmeticGrammar {
    fn start(&self) -> BoxedNonterminal<'_, Fragment> {
        self.exp()
    }
}

enum BinaryState {
    Start,
    Operator,
    Lhs(BinaryOp),
    Rhs(BinaryOp, Expr),
    Finished,
}

struct Binary<'g> {
    grammar: &'g ArithmeticGrammar,
    state: BinaryState,
}

impl<'g> Nonterminal<'g, Fragment> for Binary<'g> {
    fn resume(
        &mut self,
        input: Option<Symbol<'g, Fragment>>,
    ) -> Result<Step<'g, Fragment>, GrammarError> {
        let state = std::mem::replace(&mut self.state, BinaryState::Finished);
        let input = input.and_then(Symbol::into_value);
        match (state, input) {
            (BinaryState::Start, None) => {
                self.state = BinaryState::Operator;
                let ops = self.grammar.ops.iter();
                Ok(Step::Choose(ops.map(|&op| Symbol::Value(Fragment::Op(op))).collect()))
            }
            (BinaryState::Operator, Some(Fragment::Op(op))) => {
                self.state = BinaryState::Lhs(op);
                Ok(Step::Expand(self.grammar.exp()))
            }
            (BinaryState::Lhs(op), Some(Fragment::Expr(lhs))) => {
                self.state = BinaryState::Rhs(op, lhs);
                Ok(Step::Expand(self.grammar.exp()))
            }
            (BinaryState::Rhs(op, lhs), Some(Fragment::Expr(rhs))) => Ok(Step::Done(
                Symbol::Value(Fragment::Expr(Expr::binary(op, lhs, rhs))),
            )),
            _ => Err(GrammarError::Malformed(
                "binary rule resumed with unexpected input".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grammar() -> ArithmeticGrammar {
        ArithmeticGrammar::new(vec![Expr::var("x"), Expr::Const(1.0)], BinaryOp::ALL.to_vec())
    }

    fn at(x: f64) -> HashMap<String, f64> {
        HashMap::from([("x".to_string(), x)])
    }

    #[test]
    fn test_decode_leaf() {
        // exp picks var (1), var picks x (0)
        let expr = grammar().decode(&[1, 0], 10).unwrap();
        assert_eq!(expr, Expr::var("x"));
    }

    #[test]
    fn test_decode_binary() {
        // exp -> binary, op +, lhs var x, rhs var 1
        let expr = grammar().decode(&[0, 0, 1, 0, 1, 1], 10).unwrap();
        assert_eq!(expr.to_string(), "(x + 1)");
        assert_relative_eq!(expr.eval(&at(2.0)).unwrap(), 3.0);
        assert_eq!(expr.size(), 3);
    }

    #[test]
    fn test_decode_nested() {
        // (x * (x - 1))
        let codons = [0, 2, 1, 0, 0, 1, 1, 0, 1, 1];
        let expr = grammar().decode(&codons, 10).unwrap();
        assert_eq!(expr.to_string(), "(x * (x - 1))");
        assert_relative_eq!(expr.eval(&at(3.0)).unwrap(), 6.0);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let g = grammar();
        for seed in 0..30u32 {
            let codons: Vec<u32> = (0..8).map(|i| (seed * 7 + i * 3) % 5).collect();
            assert_eq!(g.decode(&codons, 12), g.decode(&codons.clone(), 12));
        }
    }

    #[test]
    fn test_always_binary_exceeds_depth() {
        // exp always picks binary, op always +
        let g = grammar();
        let mut always_first = |_count: usize| 0;
        let result = g.expand_with(&mut always_first, 25);
        assert_eq!(result, Err(GrammarError::DepthExceeded { depth: 25, limit: 25 }));
    }

    #[test]
    fn test_division_by_zero() {
        let expr = Expr::binary(
            BinaryOp::Div,
            Expr::var("x"),
            Expr::binary(BinaryOp::Sub, Expr::var("x"), Expr::var("x")),
        );
        assert_eq!(expr.to_string(), "(x / (x - x))");
        assert_eq!(expr.eval(&at(1.0)), None);
    }

    #[test]
    fn test_unbound_variable() {
        assert_eq!(Expr::var("y").eval(&at(1.0)), None);
    }

    #[test]
    fn test_with_variables() {
        let g = ArithmeticGrammar::with_variables(["a", "b"]);
        assert_eq!(g.leaves(), &[Expr::var("a"), Expr::var("b")]);
        assert_eq!(g.ops().len(), 4);
    }

    #[test]
    #[should_panic(expected = "Grammar needs at least one leaf")]
    fn test_no_leaves_panics() {
        ArithmeticGrammar::new(Vec::new(), BinaryOp::ALL.to_vec());
    }
}
