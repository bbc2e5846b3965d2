//! Dense two-phase primal simplex behind [`LinearProgram`](super::LinearProgram).
//!
//! Every solve builds a fresh standard-form tableau from the symbolic
//! program: finite lower bounds are shifted out, finite upper bounds become
//! additional `≤` rows appended after the user rows, right-hand sides are
//! normalized to be nonnegative, inequality rows receive a slack column, and
//! every row receives an artificial column forming the initial basis.
//! Phase I drives the artificial sum to zero or proves infeasibility;
//! Phase II optimizes the user objective with artificials barred from
//! entering. Pivots follow Bland's rule. Dual multipliers are read off the
//! final tableau through the artificial columns (which start as unit
//! columns), un-flipping rows negated during normalization.

use super::{Column, Row};

const EPS: f64 = 1e-9;
const FEASIBILITY_EPS: f64 = 1e-7;

#[derive(Debug, Clone)]
pub(crate) struct Solution {
    pub(crate) objective: f64,
    pub(crate) primal: Vec<f64>,
    pub(crate) duals: Vec<f64>,
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Optimal(Solution),
    Infeasible,
    Unbounded,
    Aborted,
}

enum PhaseResult {
    Optimal,
    Unbounded,
    Aborted,
}

#[derive(Copy, Clone)]
enum Sense {
    Le,
    Ge,
    Eq,
}

pub(crate) fn solve(columns: &[Column], rows: &[Row]) -> Outcome {
    Tableau::build(columns, rows).optimize(columns, rows.len())
}

struct Tableau {
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
    basis: Vec<usize>,
    in_basis: Vec<bool>,
    num_structural: usize,
    art_start: usize,
    num_columns: usize,
    sigma: Vec<f64>,
    shift: Vec<f64>,
}

impl Tableau {
    fn build(columns: &[Column], rows: &[Row]) -> Self {
        let n = columns.len();
        let shift: Vec<f64> = columns
            .iter()
            .map(|c| {
                assert!(c.lb.is_finite(), "variable lower bounds must be finite: {}", c.name);
                c.lb
            })
            .collect();

        let mut std_rows: Vec<(Vec<f64>, Sense, f64)> = Vec::with_capacity(rows.len());
        for row in rows {
            let mut coeffs = vec![0.0; n];
            for &(var, value) in &row.terms {
                coeffs[var] += value;
            }
            let offset: f64 = coeffs.iter().zip(&shift).map(|(c, s)| c * s).sum();
            let (sense, rhs) = if row.lhs.is_infinite() && row.rhs.is_finite() {
                (Sense::Le, row.rhs)
            } else if row.lhs.is_finite() && row.rhs.is_infinite() {
                (Sense::Ge, row.lhs)
            } else if row.lhs.is_finite() && (row.lhs - row.rhs).abs() < EPS {
                (Sense::Eq, row.rhs)
            } else {
                panic!("unsupported row bounds [{}, {}]", row.lhs, row.rhs)
            };
            std_rows.push((coeffs, sense, rhs - offset));
        }
        for (j, column) in columns.iter().enumerate() {
            if column.ub.is_finite() {
                let mut coeffs = vec![0.0; n];
                coeffs[j] = 1.0;
                std_rows.push((coeffs, Sense::Le, column.ub - shift[j]));
            }
        }

        let m = std_rows.len();
        let mut sigma = vec![1.0; m];
        for (i, (coeffs, sense, rhs)) in std_rows.iter_mut().enumerate() {
            if *rhs < 0.0 {
                sigma[i] = -1.0;
                *rhs = -*rhs;
                for c in coeffs.iter_mut() {
                    *c = -*c;
                }
                *sense = match *sense {
                    Sense::Le => Sense::Ge,
                    Sense::Ge => Sense::Le,
                    Sense::Eq => Sense::Eq,
                };
            }
        }

        let num_slacks = std_rows.iter().filter(|(_, s, _)| !matches!(s, Sense::Eq)).count();
        let art_start = n + num_slacks;
        let num_columns = art_start + m;

        let mut a = vec![vec![0.0; num_columns]; m];
        let mut b = vec![0.0; m];
        let mut basis = Vec::with_capacity(m);
        let mut next_slack = n;
        for (i, (coeffs, sense, rhs)) in std_rows.iter().enumerate() {
            a[i][..n].copy_from_slice(coeffs);
            match sense {
                Sense::Le => {
                    a[i][next_slack] = 1.0;
                    next_slack += 1;
                }
                Sense::Ge => {
                    a[i][next_slack] = -1.0;
                    next_slack += 1;
                }
                Sense::Eq => {}
            }
            a[i][art_start + i] = 1.0;
            b[i] = *rhs;
            basis.push(art_start + i);
        }
        let mut in_basis = vec![false; num_columns];
        for &j in &basis {
            in_basis[j] = true;
        }

        Self { a, b, basis, in_basis, num_structural: n, art_start, num_columns, sigma, shift }
    }

    fn optimize(mut self, columns: &[Column], num_user_rows: usize) -> Outcome {
        let m = self.b.len();
        let mut duals = vec![0.0; num_user_rows];
        let mut phase2 = vec![0.0; self.num_columns];
        for (j, column) in columns.iter().enumerate() {
            phase2[j] = column.objective;
        }

        if m > 0 {
            let mut phase1 = vec![0.0; self.num_columns];
            for cost in phase1.iter_mut().skip(self.art_start) {
                *cost = 1.0;
            }
            match self.run_phase(&phase1, true) {
                PhaseResult::Optimal => {}
                PhaseResult::Unbounded | PhaseResult::Aborted => return Outcome::Aborted,
            }
            let infeasibility: f64 = (0..m)
                .filter(|&i| self.basis[i] >= self.art_start)
                .map(|i| self.b[i])
                .sum();
            if infeasibility > FEASIBILITY_EPS {
                return Outcome::Infeasible;
            }
            self.drive_out_artificials();

            match self.run_phase(&phase2, false) {
                PhaseResult::Optimal => {}
                PhaseResult::Unbounded => return Outcome::Unbounded,
                PhaseResult::Aborted => return Outcome::Aborted,
            }

            for (i, dual) in duals.iter_mut().enumerate() {
                let mut y = 0.0;
                for (k, row) in self.a.iter().enumerate() {
                    let basis_cost = phase2[self.basis[k]];
                    if basis_cost != 0.0 {
                        y += basis_cost * row[self.art_start + i];
                    }
                }
                *dual = y * self.sigma[i];
            }
        }

        let mut values = vec![0.0; self.num_structural];
        for (i, &j) in self.basis.iter().enumerate() {
            if j < self.num_structural {
                values[j] = self.b[i];
            }
        }
        let primal: Vec<f64> =
            values.iter().zip(&self.shift).map(|(v, s)| v + s).collect();
        let objective = columns.iter().zip(&primal).map(|(c, v)| c.objective * v).sum();
        Outcome::Optimal(Solution { objective, primal, duals })
    }

    fn run_phase(&mut self, costs: &[f64], allow_artificials: bool) -> PhaseResult {
        let m = self.b.len();
        let limit = 200 * (m + 1) * (self.num_columns + 1);
        for _ in 0..limit {
            let entering = (0..self.num_columns).find(|&j| {
                !self.in_basis[j]
                    && (allow_artificials || j < self.art_start)
                    && self.reduced_cost(costs, j) < -EPS
            });
            let Some(j) = entering else { return PhaseResult::Optimal };

            let mut leaving: Option<usize> = None;
            let mut best = f64::INFINITY;
            for i in 0..m {
                let coefficient = self.a[i][j];
                if coefficient > EPS {
                    let ratio = self.b[i] / coefficient;
                    let replace = leaving.map_or(true, |r| {
                        ratio < best - EPS
                            || ((ratio - best).abs() <= EPS && self.basis[i] < self.basis[r])
                    });
                    if replace {
                        leaving = Some(i);
                        best = ratio;
                    }
                }
            }
            let Some(r) = leaving else { return PhaseResult::Unbounded };
            self.pivot(r, j);
        }
        PhaseResult::Aborted
    }

    fn reduced_cost(&self, costs: &[f64], j: usize) -> f64 {
        let mut value = costs[j];
        for (i, row) in self.a.iter().enumerate() {
            let basis_cost = costs[self.basis[i]];
            if basis_cost != 0.0 {
                value -= basis_cost * row[j];
            }
        }
        value
    }

    /// Replaces basic artificials at value zero by structural or slack
    /// columns where the row allows it; rows left with a basic artificial
    /// are linearly dependent and stay at zero.
    fn drive_out_artificials(&mut self) {
        for i in 0..self.b.len() {
            if self.basis[i] >= self.art_start {
                let replacement =
                    (0..self.art_start).find(|&j| !self.in_basis[j] && self.a[i][j].abs() > EPS);
                if let Some(j) = replacement {
                    self.pivot(i, j);
                }
            }
        }
    }

    fn pivot(&mut self, r: usize, j: usize) {
        let pivot = self.a[r][j];
        for value in &mut self.a[r] {
            *value /= pivot;
        }
        self.b[r] /= pivot;
        let pivot_row = self.a[r].clone();
        let pivot_rhs = self.b[r];
        for i in 0..self.b.len() {
            if i == r {
                continue;
            }
            let factor = self.a[i][j];
            if factor == 0.0 {
                continue;
            }
            for (value, pivot_value) in self.a[i].iter_mut().zip(&pivot_row) {
                *value -= factor * pivot_value;
            }
            self.a[i][j] = 0.0;
            self.b[i] -= factor * pivot_rhs;
            if self.b[i] < 0.0 && self.b[i] > -1e-11 {
                self.b[i] = 0.0;
            }
        }
        self.in_basis[self.basis[r]] = false;
        self.in_basis[j] = true;
        self.basis[r] = j;
    }
}

#[cfg(test)]
mod tests {
    use super::super::{LinearProgram, RowSense};

    #[test]
    fn test_equality_system() {
        // x + y = 1, minimize y
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 1.0);
        let y = lp.add_variable("y", 0.0, 1.0);
        lp.add_constraint(&[(x, 1.0), (y, 1.0)], RowSense::Eq, 1.0);
        lp.set_objective_coefficient(y, 1.0);
        assert!(lp.solve());
        assert!(lp.objective_value().unwrap().abs() < 1e-9);
        assert!((lp.variable_value(x).unwrap() - 1.0).abs() < 1e-9);
        assert!(lp.variable_value(y).unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_negative_rhs_rows() {
        // -x <= -1 is x >= 1; the dual of the user row must keep its sign
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 10.0);
        lp.add_constraint(&[(x, -1.0)], RowSense::Le, -1.0);
        lp.set_objective_coefficient(x, 1.0);
        assert!(lp.solve());
        assert!((lp.variable_value(x).unwrap() - 1.0).abs() < 1e-9);
        let duals = lp.duals().unwrap();
        assert!((duals[0] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_shifted_lower_bounds() {
        // x in [2, 5], minimize x subject to x <= 4
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 2.0, 5.0);
        lp.add_constraint(&[(x, 1.0)], RowSense::Le, 4.0);
        lp.set_objective_coefficient(x, 1.0);
        assert!(lp.solve());
        assert!((lp.variable_value(x).unwrap() - 2.0).abs() < 1e-9);
        assert!((lp.objective_value().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unbounded_is_not_optimal() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, f64::INFINITY);
        lp.set_objective_coefficient(x, -1.0);
        assert!(!lp.solve());
    }

    #[test]
    fn test_redundant_rows() {
        // the duplicated row leaves a basic artificial on a dependent row
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, 2.0);
        let y = lp.add_variable("y", 0.0, 2.0);
        lp.add_constraint(&[(x, 1.0), (y, 1.0)], RowSense::Eq, 2.0);
        lp.add_constraint(&[(x, 1.0), (y, 1.0)], RowSense::Eq, 2.0);
        lp.set_objective_coefficient(x, 1.0);
        assert!(lp.solve());
        assert!(lp.variable_value(x).unwrap().abs() < 1e-9);
        assert!((lp.variable_value(y).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_variable_optimum_and_duals() {
        // minimize -x - 2y subject to x + y <= 4, y <= 3, x,y >= 0
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 0.0, f64::INFINITY);
        let y = lp.add_variable("y", 0.0, f64::INFINITY);
        lp.add_constraint(&[(x, 1.0), (y, 1.0)], RowSense::Le, 4.0);
        lp.add_constraint(&[(y, 1.0)], RowSense::Le, 3.0);
        lp.set_objective_coefficient(x, -1.0);
        lp.set_objective_coefficient(y, -2.0);
        assert!(lp.solve());
        assert!((lp.objective_value().unwrap() + 7.0).abs() < 1e-9);
        assert!((lp.variable_value(x).unwrap() - 1.0).abs() < 1e-9);
        assert!((lp.variable_value(y).unwrap() - 3.0).abs() < 1e-9);
        // y0 = -1 (both rows binding): reduced costs 0 require
        // y0 = c_x = -1 and y0 + y1 = c_y = -2
        let duals = lp.duals().unwrap();
        assert!((duals[0] + 1.0).abs() < 1e-9);
        assert!((duals[1] + 1.0).abs() < 1e-9);
    }
}
