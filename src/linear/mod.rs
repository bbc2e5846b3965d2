mod simplex;

use std::collections::{BTreeSet, HashMap};
use std::io;

use itertools::Itertools;

use crate::error::FplError;
use self::simplex::{Outcome, Solution};

/// The sense of an LP row.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RowSense {
    /// The row is bounded above by the right-hand side.
    Le,
    /// The row is bounded below by the right-hand side.
    Ge,
    /// The row equals the right-hand side.
    Eq,
}

#[derive(Debug, Clone)]
pub(crate) struct Column {
    pub(crate) name: String,
    pub(crate) lb: f64,
    pub(crate) ub: f64,
    pub(crate) objective: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) terms: Vec<(usize, f64)>,
    pub(crate) lhs: f64,
    pub(crate) rhs: f64,
}

/// A linear program over named variables.
///
/// Rows keep both bounds `[lhs, rhs]`, with `±∞` encoding the sense. The
/// program is stored symbolically and solved by the embedded simplex on
/// demand; cloning therefore yields a fully independent copy, which is how
/// the branch-and-bound driver forks its search.
///
/// Variable names must be unique — adding a duplicate name is a programmer
/// error and panics. Dual multipliers are reported row-wise in the order the
/// rows were added.
#[derive(Debug, Clone)]
pub struct LinearProgram {
    columns: Vec<Column>,
    name_to_index: HashMap<String, usize>,
    rows: Vec<Row>,
    minimize: bool,
    solution: Option<Solution>,
}

impl Default for LinearProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearProgram {
    /// Creates an empty minimization program.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            name_to_index: HashMap::new(),
            rows: Vec::new(),
            minimize: true,
            solution: None,
        }
    }

    /// Adds a variable with bounds `[lb, ub]` and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if a variable of the same name was already added.
    pub fn add_variable(&mut self, name: &str, lb: f64, ub: f64) -> usize {
        assert!(
            !self.name_to_index.contains_key(name),
            "duplicate LP variable name: {name}"
        );
        let index = self.columns.len();
        self.columns.push(Column { name: name.to_string(), lb, ub, objective: 0.0 });
        self.name_to_index.insert(name.to_string(), index);
        self.solution = None;
        index
    }

    /// Adds a row `Σ terms {≤,≥,=} rhs`. The term list is sparse and may be
    /// empty.
    pub fn add_constraint(&mut self, terms: &[(usize, f64)], sense: RowSense, rhs: f64) {
        let (lhs, ub) = match sense {
            RowSense::Le => (f64::NEG_INFINITY, rhs),
            RowSense::Ge => (rhs, f64::INFINITY),
            RowSense::Eq => (rhs, rhs),
        };
        self.rows.push(Row { terms: terms.to_vec(), lhs, rhs: ub });
        self.solution = None;
    }

    /// Adds `value` to the coefficient of `var` in an existing `row`, leaving
    /// the row bounds unchanged. This is the hot operation during column
    /// generation.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `var` is out of range.
    pub fn add_coefficient_to_row(&mut self, row: usize, var: usize, value: f64) {
        assert!(var < self.columns.len(), "LP variable {var} out of range");
        let terms = &mut self.rows[row].terms;
        if let Some(term) = terms.iter_mut().find(|(idx, _)| *idx == var) {
            term.1 += value;
        } else {
            terms.push((var, value));
        }
        self.solution = None;
    }

    /// Sets the objective coefficient of `var`.
    pub fn set_objective_coefficient(&mut self, var: usize, coefficient: f64) {
        self.columns[var].objective = coefficient;
        self.solution = None;
    }

    /// Sets the objective sense to minimization (the only sense the embedded
    /// simplex optimizes).
    pub fn set_minimization_objective(&mut self) {
        self.minimize = true;
        self.solution = None;
    }

    /// Solves the program. Returns `true` iff the simplex found an optimum;
    /// infeasible, unbounded, and numerically aborted solves all return
    /// `false`.
    pub fn solve(&mut self) -> bool {
        debug_assert!(self.minimize, "the embedded simplex only minimizes");
        match simplex::solve(&self.columns, &self.rows) {
            Outcome::Optimal(solution) => {
                self.solution = Some(solution);
                true
            }
            Outcome::Infeasible | Outcome::Unbounded | Outcome::Aborted => {
                self.solution = None;
                false
            }
        }
    }

    /// The objective value of the last successful [`solve`](Self::solve).
    pub fn objective_value(&self) -> Result<f64, FplError> {
        self.solution
            .as_ref()
            .map(|s| s.objective)
            .ok_or_else(|| FplError::Solver("no optimal solution available".to_string()))
    }

    /// The value of variable `index` in the last successful solve.
    pub fn variable_value(&self, index: usize) -> Result<f64, FplError> {
        self.solution
            .as_ref()
            .map(|s| s.primal[index])
            .ok_or_else(|| FplError::Solver("failed to obtain primal solution".to_string()))
    }

    /// The dual multipliers of the last successful solve, one per row, in
    /// the order the rows were added.
    pub fn duals(&self) -> Result<Vec<f64>, FplError> {
        self.solution
            .as_ref()
            .map(|s| s.duals.clone())
            .ok_or_else(|| FplError::Solver("failed to obtain dual multipliers".to_string()))
    }

    /// The index of the variable called `name`.
    pub fn var_index(&self, name: &str) -> Result<usize, FplError> {
        self.name_to_index
            .get(name)
            .copied()
            .ok_or_else(|| FplError::Solver(format!("variable not found: {name}")))
    }

    /// The names of all auxiliary binary variables, i.e. every variable whose
    /// name begins with `b(`.
    pub fn binary_variable_names(&self) -> BTreeSet<String> {
        self.columns.iter().filter(|c| c.name.starts_with("b(")).map(|c| c.name.clone()).collect()
    }

    /// The number of rows added so far.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The number of variables added so far.
    pub fn num_variables(&self) -> usize {
        self.columns.len()
    }

    /// Writes a human-readable snapshot of the program, used by the verbose
    /// mode of the solver.
    pub fn print<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "=== Variables ===")?;
        for (i, column) in self.columns.iter().enumerate() {
            writeln!(out, "  [{i:2}] {} ∈ [{}, {}]", column.name, column.lb, column.ub)?;
        }
        writeln!(out, "\n=== Constraints ===")?;
        for (r, row) in self.rows.iter().enumerate() {
            let terms = row
                .terms
                .iter()
                .map(|&(idx, coefficient)| format!("{coefficient}*{}", self.columns[idx].name))
                .join(" + ");
            write!(out, "  [row {r}] {terms}")?;
            if (row.lhs - row.rhs).abs() < 1e-8 {
                writeln!(out, " == {}", row.rhs)?;
            } else if row.lhs.is_finite() {
                writeln!(out, " >= {}", row.lhs)?;
            } else if row.rhs.is_finite() {
                writeln!(out, " <= {}", row.rhs)?;
            } else {
                writeln!(out, " (free row)")?;
            }
        }
        writeln!(
            out,
            "\n=== Total: {} variables, {} constraints ===",
            self.columns.len(),
            self.rows.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{LinearProgram, RowSense};

    #[test]
    fn test_minimum_with_duals() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 10.0);
        lp.add_constraint(&[(x, 1.0)], RowSense::Ge, 1.0);
        lp.set_objective_coefficient(x, 1.0);
        lp.set_minimization_objective();
        assert!(lp.solve());
        assert!((lp.objective_value().unwrap() - 1.0).abs() < 1e-9);
        assert!((lp.variable_value(x).unwrap() - 1.0).abs() < 1e-9);
        let duals = lp.duals().unwrap();
        assert_eq!(duals.len(), 1);
        assert!((duals[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_returns_false() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 10.0);
        lp.add_constraint(&[(x, 1.0)], RowSense::Le, 1.0);
        lp.add_constraint(&[(x, 1.0)], RowSense::Ge, 2.0);
        assert!(!lp.solve());
        assert!(lp.objective_value().is_err());
        assert!(lp.duals().is_err());
    }

    #[test]
    fn test_upper_bounds_are_respected() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 1.0);
        lp.set_objective_coefficient(x, -1.0);
        assert!(lp.solve());
        assert!((lp.variable_value(x).unwrap() - 1.0).abs() < 1e-9);
        assert!((lp.objective_value().unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_phase_one_slack_pattern() {
        // x + i0 = 1 and -x + i1 = 0 force i0 + i1 = 1 for any x in [0,1]
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 1.0);
        let i0 = lp.add_variable("i(0)", 0.0, f64::INFINITY);
        let i1 = lp.add_variable("i(1)", 0.0, f64::INFINITY);
        lp.add_constraint(&[(x, 1.0), (i0, 1.0)], RowSense::Eq, 1.0);
        lp.add_constraint(&[(x, -1.0), (i1, 1.0)], RowSense::Eq, 0.0);
        lp.set_objective_coefficient(i0, 1.0);
        lp.set_objective_coefficient(i1, 1.0);
        lp.set_minimization_objective();
        assert!(lp.solve());
        assert!((lp.objective_value().unwrap() - 1.0).abs() < 1e-7);
        let duals = lp.duals().unwrap();
        assert!((duals[0] - 1.0).abs() < 1e-7);
        assert!((duals[1] - 1.0).abs() < 1e-7);
    }

    #[test]
    fn test_add_coefficient_to_row() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 5.0);
        lp.add_constraint(&[(x, 1.0)], RowSense::Le, 1.0);
        lp.set_objective_coefficient(x, -1.0);
        assert!(lp.solve());
        assert!((lp.variable_value(x).unwrap() - 1.0).abs() < 1e-9);
        // row becomes 2x <= 1
        lp.add_coefficient_to_row(0, x, 1.0);
        assert!(lp.solve());
        assert!((lp.variable_value(x).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_row_seeds() {
        let mut lp = LinearProgram::new();
        lp.add_constraint(&[], RowSense::Eq, 1.0);
        assert!(!lp.solve());
        let p = lp.add_variable("p(0)", 0.0, 1.0);
        lp.add_coefficient_to_row(0, p, 1.0);
        assert!(lp.solve());
        assert!((lp.variable_value(p).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 2.0);
        lp.set_objective_coefficient(x, -1.0);
        let mut branch = lp.clone();
        branch.add_constraint(&[(x, 1.0)], RowSense::Le, 1.0);
        assert!(lp.solve());
        assert!(branch.solve());
        assert!((lp.variable_value(x).unwrap() - 2.0).abs() < 1e-9);
        assert!((branch.variable_value(x).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_binary_variable_names() {
        let mut lp = LinearProgram::new();
        lp.add_variable("x(P(p))", 0.0, 1.0);
        lp.add_variable("b(z)", 0.0, 1.0);
        lp.add_variable("b(a)", 0.0, 1.0);
        lp.add_variable("i(0)", 0.0, f64::INFINITY);
        let binaries: Vec<String> = lp.binary_variable_names().into_iter().collect();
        assert_eq!(binaries, vec!["b(a)".to_string(), "b(z)".to_string()]);
    }

    #[test]
    #[should_panic(expected = "duplicate LP variable name")]
    fn test_duplicate_name_panics() {
        let mut lp = LinearProgram::new();
        lp.add_variable("x", 0.0, 1.0);
        lp.add_variable("x", 0.0, 1.0);
    }
}
