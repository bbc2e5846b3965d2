use std::fmt;
use std::sync::OnceLock;

use crate::formulas::VariableTable;

/// The node of a [`CplFormula`] tree.
#[derive(Debug, Clone)]
pub enum CplNode {
    /// A propositional variable.
    Variable(String),
    /// Negation.
    Not(Box<CplFormula>),
    /// Conjunction.
    And(Box<CplFormula>, Box<CplFormula>),
    /// Disjunction.
    Or(Box<CplFormula>, Box<CplFormula>),
    /// Implication.
    Impl(Box<CplFormula>, Box<CplFormula>),
    /// Bi-implication.
    Equiv(Box<CplFormula>, Box<CplFormula>),
}

/// A formula of classical propositional logic.
///
/// Formulas are immutable value trees. Each node owns its children
/// exclusively; the only mutation after construction is the lazily cached
/// canonical string. The canonical string is the fully parenthesized Unicode
/// rendering of the tree and serves as a stable identity: two formulas are
/// equal iff their canonical strings are equal.
///
/// # Examples
///
/// ```
/// use fplsol::formulas::CplFormula;
///
/// let p = CplFormula::variable("p");
/// let q = CplFormula::variable("q");
/// let formula = CplFormula::implication(p.clone(), CplFormula::and(p, q));
/// assert_eq!(formula.canonical(), "(p → (p ∧ q))");
/// ```
#[derive(Debug, Clone)]
pub struct CplFormula {
    node: CplNode,
    canonical: OnceLock<String>,
}

impl CplFormula {
    fn new(node: CplNode) -> Self {
        Self { node, canonical: OnceLock::new() }
    }

    /// Creates a propositional variable.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(CplNode::Variable(name.into()))
    }

    /// Creates the negation of `operand`.
    pub fn not(operand: Self) -> Self {
        Self::new(CplNode::Not(Box::new(operand)))
    }

    /// Creates the conjunction of `lhs` and `rhs`.
    pub fn and(lhs: Self, rhs: Self) -> Self {
        Self::new(CplNode::And(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the disjunction of `lhs` and `rhs`.
    pub fn or(lhs: Self, rhs: Self) -> Self {
        Self::new(CplNode::Or(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the implication `lhs → rhs`.
    pub fn implication(lhs: Self, rhs: Self) -> Self {
        Self::new(CplNode::Impl(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the bi-implication `lhs ↔ rhs`.
    pub fn equivalence(lhs: Self, rhs: Self) -> Self {
        Self::new(CplNode::Equiv(Box::new(lhs), Box::new(rhs)))
    }

    /// The node of this formula.
    pub fn node(&self) -> &CplNode {
        &self.node
    }

    /// The canonical fully parenthesized rendering, computed on first use.
    pub fn canonical(&self) -> &str {
        self.canonical.get_or_init(|| match &self.node {
            CplNode::Variable(name) => name.clone(),
            CplNode::Not(operand) => format!("¬({})", operand.canonical()),
            CplNode::And(l, r) => format!("({} ∧ {})", l.canonical(), r.canonical()),
            CplNode::Or(l, r) => format!("({} ∨ {})", l.canonical(), r.canonical()),
            CplNode::Impl(l, r) => format!("({} → {})", l.canonical(), r.canonical()),
            CplNode::Equiv(l, r) => format!("({} ↔ {})", l.canonical(), r.canonical()),
        })
    }

    /// Registers every variable of this formula in `table`, preserving
    /// first-seen order.
    pub fn collect_variables(&self, table: &mut VariableTable) {
        match &self.node {
            CplNode::Variable(name) => {
                table.insert(name);
            }
            CplNode::Not(operand) => operand.collect_variables(table),
            CplNode::And(l, r) | CplNode::Or(l, r) | CplNode::Impl(l, r) | CplNode::Equiv(l, r) => {
                l.collect_variables(table);
                r.collect_variables(table);
            }
        }
    }

    /// Evaluates this formula classically under `valuation`, indexed by
    /// `table`.
    ///
    /// # Panics
    ///
    /// Panics if a variable of this formula is not registered in `table` —
    /// the table must have been built over all input formulas.
    pub fn evaluate(&self, table: &VariableTable, valuation: &[bool]) -> bool {
        match &self.node {
            CplNode::Variable(name) => {
                let idx = table
                    .index_of(name)
                    .unwrap_or_else(|| panic!("variable not registered: {name}"));
                valuation[idx]
            }
            CplNode::Not(operand) => !operand.evaluate(table, valuation),
            CplNode::And(l, r) => l.evaluate(table, valuation) && r.evaluate(table, valuation),
            CplNode::Or(l, r) => l.evaluate(table, valuation) || r.evaluate(table, valuation),
            CplNode::Impl(l, r) => !l.evaluate(table, valuation) || r.evaluate(table, valuation),
            CplNode::Equiv(l, r) => l.evaluate(table, valuation) == r.evaluate(table, valuation),
        }
    }
}

impl fmt::Display for CplFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl PartialEq for CplFormula {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for CplFormula {}
