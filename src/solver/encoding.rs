use std::collections::{BTreeSet, HashMap};

use crate::formulas::{CplFormula, ModalFormula, ModalNode};
use crate::linear::{LinearProgram, RowSense};

/// The root LP of a problem together with the bookkeeping the feasibility
/// engine needs: the `x(·)` variable of every subformula, the CPL bodies of
/// the distinct probability atoms, the seed row of each atom (to be completed
/// with probability columns) and the seed row of the distribution
/// normalization `Σ p(·) = 1`.
pub(crate) struct ModalEncoding {
    pub(crate) lp: LinearProgram,
    pub(crate) x_vars: HashMap<String, usize>,
    pub(crate) psi_list: Vec<CplFormula>,
    pub(crate) prob_constraint_rows: Vec<usize>,
    pub(crate) sum_prob_row: usize,
}

/// Builds the root LP: Łukasiewicz constraints for every subformula, an
/// assertion row `x(f) = 1` per input formula, the probability seed rows, and
/// one slack variable `i(row)` per row with the sum of slacks as
/// minimization objective. The slacked LP is feasible at cost 0 iff the
/// original row system is satisfiable.
pub(crate) fn encode_root(formulas: &[ModalFormula]) -> ModalEncoding {
    let mut lp = LinearProgram::new();
    let mut x_vars = HashMap::new();

    for formula in formulas {
        encode_modal_formula(formula, &mut lp, &mut x_vars);
    }

    for formula in formulas {
        let id = formula.canonical();
        let x = *x_vars
            .get(id)
            .unwrap_or_else(|| panic!("FP(Ł) formula not translated: {id}"));
        lp.add_constraint(&[(x, 1.0)], RowSense::Eq, 1.0);
    }

    let mut seen = BTreeSet::new();
    let mut psi_list = Vec::new();
    for formula in formulas {
        formula.collect_patoms(&mut seen, &mut psi_list);
    }

    let mut prob_constraint_rows = Vec::with_capacity(psi_list.len());
    for psi in &psi_list {
        let id = format!("P({})", psi.canonical());
        let x = *x_vars.get(&id).unwrap_or_else(|| panic!("variable x({id}) not found"));
        lp.add_constraint(&[(x, -1.0)], RowSense::Eq, 0.0);
        prob_constraint_rows.push(lp.num_rows() - 1);
    }

    // seed of Σ_w p(w) = 1; infeasible until the engine adds columns
    lp.add_constraint(&[], RowSense::Eq, 1.0);
    let sum_prob_row = lp.num_rows() - 1;

    let num_initial_rows = lp.num_rows();
    for row in 0..num_initial_rows {
        let slack = lp.add_variable(&format!("i({row})"), 0.0, f64::INFINITY);
        lp.add_coefficient_to_row(row, slack, 1.0);
        lp.set_objective_coefficient(slack, 1.0);
    }
    lp.set_minimization_objective();

    ModalEncoding { lp, x_vars, psi_list, prob_constraint_rows, sum_prob_row }
}

/// Encodes one modal formula, memoised on canonical id so that shared
/// subformulas share their variables and rows. Returns the index of `x(f)`.
fn encode_modal_formula(
    formula: &ModalFormula,
    lp: &mut LinearProgram,
    x_vars: &mut HashMap<String, usize>,
) -> usize {
    let id = formula.canonical();
    if let Some(&x) = x_vars.get(id) {
        return x;
    }

    match formula.node() {
        ModalNode::PAtom(_) => {
            let x = lp.add_variable(&format!("x({id})"), 0.0, 1.0);
            x_vars.insert(id.to_string(), x);
            x
        }
        ModalNode::Not(operand) => {
            let l = encode_modal_formula(operand, lp, x_vars);
            let x = lp.add_variable(&format!("x({id})"), 0.0, 1.0);
            x_vars.insert(id.to_string(), x);
            lp.add_constraint(&[(l, -1.0), (x, 1.0)], RowSense::Eq, 1.0);
            x
        }
        ModalNode::Oplus(left, right) => {
            let (l, r) = (
                encode_modal_formula(left, lp, x_vars),
                encode_modal_formula(right, lp, x_vars),
            );
            let (x, b) = add_connective_variables(id, lp, x_vars);
            lp.add_constraint(&[(b, 1.0), (x, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(x, 1.0)], RowSense::Le, 1.0);
            lp.add_constraint(&[(l, 1.0), (r, 1.0), (b, -1.0), (x, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(l, -1.0), (r, -1.0), (x, 1.0)], RowSense::Le, 0.0);
            x
        }
        ModalNode::Odot(left, right) => {
            let (l, r) = (
                encode_modal_formula(left, lp, x_vars),
                encode_modal_formula(right, lp, x_vars),
            );
            let (x, b) = add_connective_variables(id, lp, x_vars);
            lp.add_constraint(&[(x, 1.0)], RowSense::Ge, 0.0);
            lp.add_constraint(&[(x, 1.0), (b, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(l, 1.0), (r, 1.0), (x, -1.0)], RowSense::Ge, 1.0);
            lp.add_constraint(&[(l, 1.0), (r, 1.0), (b, -1.0), (x, -1.0)], RowSense::Le, 0.0);
            x
        }
        ModalNode::And(left, right) => {
            let (l, r) = (
                encode_modal_formula(left, lp, x_vars),
                encode_modal_formula(right, lp, x_vars),
            );
            let (x, b) = add_connective_variables(id, lp, x_vars);
            lp.add_constraint(&[(l, 1.0), (b, -1.0), (x, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(l, -1.0), (x, 1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(r, 1.0), (b, 1.0), (x, -1.0)], RowSense::Le, 1.0);
            lp.add_constraint(&[(r, -1.0), (x, 1.0)], RowSense::Le, 0.0);
            x
        }
        ModalNode::Or(left, right) => {
            let (l, r) = (
                encode_modal_formula(left, lp, x_vars),
                encode_modal_formula(right, lp, x_vars),
            );
            let (x, b) = add_connective_variables(id, lp, x_vars);
            lp.add_constraint(&[(l, 1.0), (x, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(l, -1.0), (x, 1.0), (b, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(r, 1.0), (x, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(r, -1.0), (x, 1.0), (b, 1.0)], RowSense::Le, 1.0);
            x
        }
        ModalNode::Impl(left, right) => {
            let (l, r) = (
                encode_modal_formula(left, lp, x_vars),
                encode_modal_formula(right, lp, x_vars),
            );
            let (x, b) = add_connective_variables(id, lp, x_vars);
            lp.add_constraint(&[(b, 1.0), (x, -1.0)], RowSense::Le, 0.0);
            lp.add_constraint(&[(x, 1.0)], RowSense::Le, 1.0);
            lp.add_constraint(&[(l, 1.0), (r, -1.0), (b, 1.0), (x, 1.0)], RowSense::Ge, 1.0);
            lp.add_constraint(&[(l, 1.0), (r, -1.0), (x, 1.0)], RowSense::Le, 1.0);
            x
        }
        ModalNode::Equiv(left, right) => {
            let (l, r) = (
                encode_modal_formula(left, lp, x_vars),
                encode_modal_formula(right, lp, x_vars),
            );
            let (x, b) = add_connective_variables(id, lp, x_vars);
            lp.add_constraint(&[(l, 1.0), (r, -1.0), (b, 2.0), (x, 1.0)], RowSense::Ge, 1.0);
            lp.add_constraint(&[(l, 1.0), (r, -1.0), (x, 1.0)], RowSense::Le, 1.0);
            lp.add_constraint(&[(l, 1.0), (r, -1.0), (b, 2.0), (x, -1.0)], RowSense::Le, 1.0);
            lp.add_constraint(&[(l, -1.0), (r, 1.0), (x, 1.0)], RowSense::Le, 1.0);
            x
        }
    }
}

fn add_connective_variables(
    id: &str,
    lp: &mut LinearProgram,
    x_vars: &mut HashMap<String, usize>,
) -> (usize, usize) {
    let x = lp.add_variable(&format!("x({id})"), 0.0, 1.0);
    x_vars.insert(id.to_string(), x);
    let b = lp.add_variable(&format!("b({id})"), 0.0, 1.0);
    (x, b)
}

#[cfg(test)]
mod tests {
    use super::encode_root;
    use crate::parser::parse_modal_formula;

    #[test]
    fn test_single_atom_encoding() {
        let formulas = vec![parse_modal_formula("P(p)").unwrap()];
        let encoding = encode_root(&formulas);
        // rows: assertion, one seed per atom, normalization
        assert_eq!(encoding.lp.num_rows(), 3);
        assert_eq!(encoding.prob_constraint_rows, vec![1]);
        assert_eq!(encoding.sum_prob_row, 2);
        assert_eq!(encoding.psi_list.len(), 1);
        assert_eq!(encoding.psi_list[0].canonical(), "p");
        // variables: x(P(p)) plus one slack per row
        assert_eq!(encoding.lp.num_variables(), 4);
        assert!(encoding.x_vars.contains_key("P(p)"));
        assert!(encoding.lp.binary_variable_names().is_empty());
    }

    #[test]
    fn test_shared_subformulas_encode_once() {
        let formulas = vec![parse_modal_formula("P(p) ⊕ P(p)").unwrap()];
        let encoding = encode_root(&formulas);
        // x(P(p)), x and b of the oplus node, three rows with slacks
        assert!(encoding.x_vars.contains_key("P(p)"));
        assert!(encoding.x_vars.contains_key("(P(p) ⊕ P(p))"));
        assert_eq!(encoding.x_vars.len(), 2);
        assert_eq!(encoding.lp.binary_variable_names().len(), 1);
        assert_eq!(encoding.psi_list.len(), 1);
    }

    #[test]
    fn test_duplicate_atoms_get_one_seed_row() {
        let formulas = vec![
            parse_modal_formula("P(p) → P(q)").unwrap(),
            parse_modal_formula("P(p)").unwrap(),
        ];
        let encoding = encode_root(&formulas);
        assert_eq!(encoding.psi_list.len(), 2);
        assert_eq!(encoding.prob_constraint_rows.len(), 2);
        let ids: Vec<&str> = encoding.psi_list.iter().map(|psi| psi.canonical()).collect();
        assert_eq!(ids, vec!["p", "q"]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let parse = || vec![parse_modal_formula("¬P(p ∧ q) ⊙ P(q)").unwrap()];
        let first = encode_root(&parse());
        let second = encode_root(&parse());
        let mut snapshot1 = Vec::new();
        let mut snapshot2 = Vec::new();
        first.lp.print(&mut snapshot1).unwrap();
        second.lp.print(&mut snapshot2).unwrap();
        assert_eq!(snapshot1, snapshot2);
        assert_eq!(first.prob_constraint_rows, second.prob_constraint_rows);
        assert_eq!(first.sum_prob_row, second.sum_prob_row);
    }
}
