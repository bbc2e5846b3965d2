use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::Path;

use crate::error::FplError;
use crate::formulas::{CplFormula, VariableTable};
use crate::linear::LinearProgram;
use crate::solver::pricing::{find_valuation_exhaustive, find_valuation_pb};
use crate::solver::{valuation_bitmask, PricingStrategy};

/// Objective values up to this tolerance count as zero, i.e. as a feasible
/// original system.
const OBJECTIVE_EPS: f64 = 1e-8;

/// Coefficients below this tolerance are not added to probability columns.
const COEFFICIENT_EPS: f64 = 1e-8;

/// A satisfiability witness: the value of every `x(·)` variable keyed by
/// canonical formula id, the generated classical valuations in discovery
/// order, and the parallel probability distribution.
#[derive(Debug, Clone)]
pub struct Witness {
    /// Modal-atom and subformula values in `[0, 1]`.
    pub modal_values: BTreeMap<String, f64>,
    /// One valuation per generated probability column.
    pub valuations: Vec<Vec<bool>>,
    /// The probability of each valuation; sums to 1.
    pub distribution: Vec<f64>,
}

/// The column-generation engine deciding whether a branch LP admits a
/// probability distribution coherent with its modal-atom values.
pub(crate) struct FeasibilityProbe<'a> {
    pub(crate) psi_list: &'a [CplFormula],
    pub(crate) table: &'a VariableTable,
    pub(crate) x_vars: &'a HashMap<String, usize>,
    pub(crate) prob_constraint_rows: &'a [usize],
    pub(crate) sum_prob_row: usize,
    pub(crate) pricing: &'a PricingStrategy,
    pub(crate) input_path: &'a Path,
    pub(crate) verbose: bool,
}

impl FeasibilityProbe<'_> {
    /// Runs column generation on `lp` until the slack objective reaches
    /// zero (feasible, returns the witness), the LP turns infeasible, or the
    /// pricing oracle runs out of valuations.
    ///
    /// The loop terminates because the set of used valuations grows strictly
    /// and is bounded by `2^n`.
    pub(crate) fn is_feasible(&self, mut lp: LinearProgram) -> Result<Option<Witness>, FplError> {
        let mut used: BTreeSet<Vec<bool>> = BTreeSet::new();
        let mut valuations: Vec<Vec<bool>> = Vec::new();
        let mut column_vars: Vec<usize> = Vec::new();

        // the all-false valuation is always the first column
        let zero = vec![false; self.table.len()];
        self.add_column(&mut lp, &zero, "p(0)", &mut column_vars);
        valuations.push(zero.clone());
        used.insert(zero);

        let mut iteration = 1_u32;
        loop {
            if self.verbose {
                println!("============== LINEAR PROGRAM ==============");
                lp.print(&mut io::stdout().lock())?;
                println!("============================================");
            }

            if !lp.solve() {
                if self.verbose {
                    println!("  [feasibility] infeasible LP in iteration {iteration}");
                }
                return Ok(None);
            }

            let objective = lp.objective_value()?;
            if self.verbose {
                println!("  [feasibility] iteration {iteration}, objective = {objective}");
            }

            if objective <= OBJECTIVE_EPS {
                let mut modal_values = BTreeMap::new();
                for (id, &index) in self.x_vars {
                    modal_values.insert(id.clone(), lp.variable_value(index)?);
                }
                let mut distribution = Vec::with_capacity(column_vars.len());
                for &index in &column_vars {
                    distribution.push(lp.variable_value(index)?);
                }
                return Ok(Some(Witness { modal_values, valuations, distribution }));
            }

            let duals = lp.duals()?;
            let found = match self.pricing {
                PricingStrategy::Exhaustive => find_valuation_exhaustive(
                    self.psi_list,
                    self.table,
                    &duals,
                    self.prob_constraint_rows,
                    self.sum_prob_row,
                    &used,
                    self.verbose,
                ),
                PricingStrategy::PseudoBoolean { command, args } => {
                    let mut weights: Vec<f64> =
                        self.prob_constraint_rows.iter().map(|&row| duals[row]).collect();
                    weights.push(duals[self.sum_prob_row]);
                    find_valuation_pb(
                        command,
                        args,
                        self.input_path,
                        self.psi_list,
                        self.table,
                        &weights,
                        &used,
                    )?
                }
            };

            let Some(valuation) = found else {
                if self.verbose {
                    println!("  [feasibility] no valuations remaining");
                }
                return Ok(None);
            };

            let name = match self.pricing {
                PricingStrategy::Exhaustive => format!("p({})", valuation_bitmask(&valuation)),
                PricingStrategy::PseudoBoolean { .. } => format!("p({})", used.len()),
            };
            if self.verbose {
                println!("  [feasibility] column {name} added");
            }
            self.add_column(&mut lp, &valuation, &name, &mut column_vars);
            valuations.push(valuation.clone());
            used.insert(valuation);
            iteration += 1;
        }
    }

    /// Adds the probability column of `valuation`: coefficient `ψᵢ(w)` in
    /// each probability constraint row (when non-zero) and 1 in the
    /// normalization row.
    fn add_column(
        &self,
        lp: &mut LinearProgram,
        valuation: &[bool],
        name: &str,
        column_vars: &mut Vec<usize>,
    ) {
        let index = lp.add_variable(name, 0.0, 1.0);
        for (i, psi) in self.psi_list.iter().enumerate() {
            let value: f64 = if psi.evaluate(self.table, valuation) { 1.0 } else { 0.0 };
            if value.abs() > COEFFICIENT_EPS {
                lp.add_coefficient_to_row(self.prob_constraint_rows[i], index, value);
            }
        }
        lp.add_coefficient_to_row(self.sum_prob_row, index, 1.0);
        column_vars.push(index);
    }
}
