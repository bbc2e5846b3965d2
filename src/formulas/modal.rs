use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use crate::formulas::{CplFormula, VariableTable};

/// The node of a [`ModalFormula`] tree.
#[derive(Debug, Clone)]
pub enum ModalNode {
    /// A probability atom `P(φ)` wrapping a CPL formula.
    PAtom(CplFormula),
    /// Łukasiewicz negation.
    Not(Box<ModalFormula>),
    /// Weak conjunction (min).
    And(Box<ModalFormula>, Box<ModalFormula>),
    /// Weak disjunction (max).
    Or(Box<ModalFormula>, Box<ModalFormula>),
    /// Łukasiewicz implication.
    Impl(Box<ModalFormula>, Box<ModalFormula>),
    /// Łukasiewicz bi-implication.
    Equiv(Box<ModalFormula>, Box<ModalFormula>),
    /// Strong disjunction `⊕`.
    Oplus(Box<ModalFormula>, Box<ModalFormula>),
    /// Strong conjunction `⊙`.
    Odot(Box<ModalFormula>, Box<ModalFormula>),
}

/// A modal formula of FP(Ł).
///
/// Probability atoms `P(φ)` are the leaves of the modal tree; all other
/// connectives combine modal subformulas. Like [`CplFormula`], modal formulas
/// are immutable value trees identified by their canonical fully
/// parenthesized string.
///
/// # Examples
///
/// ```
/// use fplsol::formulas::{CplFormula, ModalFormula};
///
/// let p = ModalFormula::patom(CplFormula::variable("p"));
/// let q = ModalFormula::patom(CplFormula::variable("q"));
/// let formula = ModalFormula::oplus(p, ModalFormula::not(q));
/// assert_eq!(formula.canonical(), "(P(p) ⊕ ¬(P(q)))");
/// ```
#[derive(Debug, Clone)]
pub struct ModalFormula {
    node: ModalNode,
    canonical: OnceLock<String>,
}

impl ModalFormula {
    fn new(node: ModalNode) -> Self {
        Self { node, canonical: OnceLock::new() }
    }

    /// Creates the probability atom `P(phi)`.
    pub fn patom(phi: CplFormula) -> Self {
        Self::new(ModalNode::PAtom(phi))
    }

    /// Creates the negation of `operand`.
    pub fn not(operand: Self) -> Self {
        Self::new(ModalNode::Not(Box::new(operand)))
    }

    /// Creates the weak conjunction of `lhs` and `rhs`.
    pub fn and(lhs: Self, rhs: Self) -> Self {
        Self::new(ModalNode::And(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the weak disjunction of `lhs` and `rhs`.
    pub fn or(lhs: Self, rhs: Self) -> Self {
        Self::new(ModalNode::Or(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the implication `lhs → rhs`.
    pub fn implication(lhs: Self, rhs: Self) -> Self {
        Self::new(ModalNode::Impl(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the bi-implication `lhs ↔ rhs`.
    pub fn equivalence(lhs: Self, rhs: Self) -> Self {
        Self::new(ModalNode::Equiv(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the strong disjunction `lhs ⊕ rhs`.
    pub fn oplus(lhs: Self, rhs: Self) -> Self {
        Self::new(ModalNode::Oplus(Box::new(lhs), Box::new(rhs)))
    }

    /// Creates the strong conjunction `lhs ⊙ rhs`.
    pub fn odot(lhs: Self, rhs: Self) -> Self {
        Self::new(ModalNode::Odot(Box::new(lhs), Box::new(rhs)))
    }

    /// The node of this formula.
    pub fn node(&self) -> &ModalNode {
        &self.node
    }

    /// The canonical fully parenthesized rendering, computed on first use.
    pub fn canonical(&self) -> &str {
        self.canonical.get_or_init(|| match &self.node {
            ModalNode::PAtom(phi) => format!("P({})", phi.canonical()),
            ModalNode::Not(operand) => format!("¬({})", operand.canonical()),
            ModalNode::And(l, r) => format!("({} ∧ {})", l.canonical(), r.canonical()),
            ModalNode::Or(l, r) => format!("({} ∨ {})", l.canonical(), r.canonical()),
            ModalNode::Impl(l, r) => format!("({} → {})", l.canonical(), r.canonical()),
            ModalNode::Equiv(l, r) => format!("({} ↔ {})", l.canonical(), r.canonical()),
            ModalNode::Oplus(l, r) => format!("({} ⊕ {})", l.canonical(), r.canonical()),
            ModalNode::Odot(l, r) => format!("({} ⊙ {})", l.canonical(), r.canonical()),
        })
    }

    /// Registers every propositional variable below this formula in `table`,
    /// preserving first-seen order.
    pub fn collect_variables(&self, table: &mut VariableTable) {
        match &self.node {
            ModalNode::PAtom(phi) => phi.collect_variables(table),
            ModalNode::Not(operand) => operand.collect_variables(table),
            ModalNode::And(l, r)
            | ModalNode::Or(l, r)
            | ModalNode::Impl(l, r)
            | ModalNode::Equiv(l, r)
            | ModalNode::Oplus(l, r)
            | ModalNode::Odot(l, r) => {
                l.collect_variables(table);
                r.collect_variables(table);
            }
        }
    }

    /// Appends the CPL bodies of the distinct probability atoms below this
    /// formula to `out`, in first-seen order. `seen` carries the canonical
    /// atom ids across calls so that repeated atoms are collected once.
    pub fn collect_patoms(&self, seen: &mut BTreeSet<String>, out: &mut Vec<CplFormula>) {
        match &self.node {
            ModalNode::PAtom(phi) => {
                if seen.insert(self.canonical().to_string()) {
                    out.push(phi.clone());
                }
            }
            ModalNode::Not(operand) => operand.collect_patoms(seen, out),
            ModalNode::And(l, r)
            | ModalNode::Or(l, r)
            | ModalNode::Impl(l, r)
            | ModalNode::Equiv(l, r)
            | ModalNode::Oplus(l, r)
            | ModalNode::Odot(l, r) => {
                l.collect_patoms(seen, out);
                r.collect_patoms(seen, out);
            }
        }
    }

    /// Evaluates this formula under Łukasiewicz semantics, reading the value
    /// of each probability atom from `atom_values` (keyed by canonical atom
    /// id). Returns `None` if an atom is missing from the map.
    pub fn lukasiewicz_value(&self, atom_values: &BTreeMap<String, f64>) -> Option<f64> {
        let value = match &self.node {
            ModalNode::PAtom(_) => *atom_values.get(self.canonical())?,
            ModalNode::Not(operand) => 1.0 - operand.lukasiewicz_value(atom_values)?,
            ModalNode::And(l, r) => {
                l.lukasiewicz_value(atom_values)?.min(r.lukasiewicz_value(atom_values)?)
            }
            ModalNode::Or(l, r) => {
                l.lukasiewicz_value(atom_values)?.max(r.lukasiewicz_value(atom_values)?)
            }
            ModalNode::Impl(l, r) => {
                (1.0 - l.lukasiewicz_value(atom_values)? + r.lukasiewicz_value(atom_values)?).min(1.0)
            }
            ModalNode::Equiv(l, r) => {
                1.0 - (l.lukasiewicz_value(atom_values)? - r.lukasiewicz_value(atom_values)?).abs()
            }
            ModalNode::Oplus(l, r) => {
                (l.lukasiewicz_value(atom_values)? + r.lukasiewicz_value(atom_values)?).min(1.0)
            }
            ModalNode::Odot(l, r) => {
                (l.lukasiewicz_value(atom_values)? + r.lukasiewicz_value(atom_values)? - 1.0).max(0.0)
            }
        };
        Some(value)
    }
}

impl fmt::Display for ModalFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl PartialEq for ModalFormula {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for ModalFormula {}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::ModalFormula;
    use crate::formulas::{CplFormula, VariableTable};

    fn patom(name: &str) -> ModalFormula {
        ModalFormula::patom(CplFormula::variable(name))
    }

    #[test]
    fn test_canonical_rendering() {
        let f = ModalFormula::implication(
            ModalFormula::odot(patom("p"), patom("q")),
            ModalFormula::not(patom("p")),
        );
        assert_eq!(f.canonical(), "((P(p) ⊙ P(q)) → ¬(P(p)))");
        let atom = ModalFormula::patom(CplFormula::and(
            CplFormula::variable("p"),
            CplFormula::variable("q"),
        ));
        assert_eq!(atom.canonical(), "P((p ∧ q))");
    }

    #[test]
    fn test_collect_variables_through_atoms() {
        let f = ModalFormula::oplus(
            ModalFormula::patom(CplFormula::implication(
                CplFormula::variable("b"),
                CplFormula::variable("a"),
            )),
            patom("c"),
        );
        let mut table = VariableTable::new();
        f.collect_variables(&mut table);
        assert_eq!(table.names(), &["b", "a", "c"]);
    }

    #[test]
    fn test_collect_patoms_dedupes() {
        let f = ModalFormula::and(
            ModalFormula::oplus(patom("p"), patom("q")),
            ModalFormula::not(patom("p")),
        );
        let mut seen = BTreeSet::new();
        let mut atoms = Vec::new();
        f.collect_patoms(&mut seen, &mut atoms);
        let ids: Vec<&str> = atoms.iter().map(CplFormula::canonical).collect();
        assert_eq!(ids, vec!["p", "q"]);
    }

    #[test]
    fn test_lukasiewicz_evaluation() {
        let mut values = BTreeMap::new();
        values.insert("P(p)".to_string(), 0.7);
        values.insert("P(q)".to_string(), 0.5);

        let p = patom("p");
        let q = patom("q");
        let eps = 1e-12;

        let not = ModalFormula::not(p.clone());
        assert!((not.lukasiewicz_value(&values).unwrap() - 0.3).abs() < eps);

        let oplus = ModalFormula::oplus(p.clone(), q.clone());
        assert!((oplus.lukasiewicz_value(&values).unwrap() - 1.0).abs() < eps);

        let odot = ModalFormula::odot(p.clone(), q.clone());
        assert!((odot.lukasiewicz_value(&values).unwrap() - 0.2).abs() < eps);

        let imp = ModalFormula::implication(p.clone(), q.clone());
        assert!((imp.lukasiewicz_value(&values).unwrap() - 0.8).abs() < eps);

        let equiv = ModalFormula::equivalence(p.clone(), q.clone());
        assert!((equiv.lukasiewicz_value(&values).unwrap() - 0.8).abs() < eps);

        let and = ModalFormula::and(p.clone(), q.clone());
        assert!((and.lukasiewicz_value(&values).unwrap() - 0.5).abs() < eps);

        let or = ModalFormula::or(p.clone(), q);
        assert!((or.lukasiewicz_value(&values).unwrap() - 0.7).abs() < eps);

        let unknown = ModalFormula::odot(p, patom("r"));
        assert!(unknown.lukasiewicz_value(&values).is_none());
    }
}
