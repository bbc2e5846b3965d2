use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FplError;
use crate::formulas::{ModalFormula, VariableTable};
use crate::io::{save_witness_file, write_report};
use crate::linear::{LinearProgram, RowSense};
use crate::solver::encoding::encode_root;
use crate::solver::feasibility::{FeasibilityProbe, Witness};
use crate::solver::PricingStrategy;

/// Configuration for [`FpSolver`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FpSolverConfig {
    /// Whether pricing should delegate to an external pseudo-boolean solver.
    pub use_pb: bool,
    /// The pseudo-boolean solver command.
    pub pb_solver: String,
    /// Extra arguments passed to the pseudo-boolean solver before the
    /// `.opb` path, split on whitespace.
    pub pb_arg: String,
    /// Print LP snapshots and per-iteration diagnostics.
    pub verbose: bool,
}

impl Default for FpSolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FpSolverConfig {
    /// Constructs a new configuration with default values.
    pub fn new() -> Self {
        Self { use_pb: true, pb_solver: "minisat+".to_string(), pb_arg: String::new(), verbose: false }
    }

    /// Sets whether the pseudo-boolean oracle should be used. The default
    /// value is `true`.
    #[must_use]
    pub const fn use_pb(mut self, use_pb: bool) -> Self {
        self.use_pb = use_pb;
        self
    }

    /// Updates the pseudo-boolean solver command. The default is `minisat+`.
    #[must_use]
    pub fn pb_solver(mut self, pb_solver: impl Into<String>) -> Self {
        self.pb_solver = pb_solver.into();
        self
    }

    /// Updates the extra arguments of the pseudo-boolean solver.
    #[must_use]
    pub fn pb_arg(mut self, pb_arg: impl Into<String>) -> Self {
        self.pb_arg = pb_arg.into();
        self
    }

    /// Sets the verbose mode. The default value is `false`.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// A live branch of the search: an exclusively owned LP clone plus the
/// binary assignments fixed so far.
struct Branch {
    lp: LinearProgram,
    fixed_binaries: BTreeMap<String, u8>,
}

/// The FP(Ł) satisfiability solver.
///
/// Encodes the input formulas into the root LP, confirms its feasibility by
/// column generation, then branches over the auxiliary binary variables,
/// probing every child with the feasibility engine. The witness of the last
/// surviving probe is reported.
pub struct FpSolver {
    formulas: Vec<ModalFormula>,
    input_path: PathBuf,
    table: VariableTable,
    pricing: PricingStrategy,
    verbose: bool,
    witness: Option<Witness>,
}

impl FpSolver {
    /// Creates a solver for `formulas`. The input path determines where the
    /// pseudo-boolean scratch files and the `.out` report are placed. If the
    /// configured pseudo-boolean solver is not available, pricing silently
    /// falls back to exhaustive search.
    pub fn new(formulas: Vec<ModalFormula>, input_path: PathBuf, config: &FpSolverConfig) -> Self {
        println!("Initiating FP(Ł) solver...");
        let mut table = VariableTable::new();
        for formula in &formulas {
            formula.collect_variables(&mut table);
        }
        let pricing = if config.use_pb {
            if executable_available(&config.pb_solver) {
                PricingStrategy::PseudoBoolean {
                    command: config.pb_solver.clone(),
                    args: config.pb_arg.split_whitespace().map(str::to_string).collect(),
                }
            } else {
                println!("Column generation via exhaustive search.");
                PricingStrategy::Exhaustive
            }
        } else {
            PricingStrategy::Exhaustive
        };
        Self {
            formulas,
            input_path,
            table,
            pricing,
            verbose: config.verbose,
            witness: None,
        }
    }

    /// The variable table built from the input formulas.
    pub fn variable_table(&self) -> &VariableTable {
        &self.table
    }

    /// The witness of the last successful [`solve`](Self::solve).
    pub fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }

    /// Decides satisfiability. Returns `Ok(true)` on SAT (and prints and
    /// saves the witness report), `Ok(false)` on UNSAT.
    pub fn solve(&mut self) -> Result<bool, FplError> {
        let encoding = encode_root(&self.formulas);
        let probe = FeasibilityProbe {
            psi_list: &encoding.psi_list,
            table: &self.table,
            x_vars: &encoding.x_vars,
            prob_constraint_rows: &encoding.prob_constraint_rows,
            sum_prob_row: encoding.sum_prob_row,
            pricing: &self.pricing,
            input_path: &self.input_path,
            verbose: self.verbose,
        };

        match probe.is_feasible(encoding.lp.clone())? {
            Some(witness) => self.witness = Some(witness),
            None => {
                if self.verbose {
                    println!();
                }
                println!("UNSAT (infeasible relaxed problem)");
                return Ok(false);
            }
        }

        // the binary set is fixed up-front from the fully encoded root LP
        let mut binaries = encoding.lp.binary_variable_names();
        let mut branches =
            vec![Branch { lp: encoding.lp, fixed_binaries: BTreeMap::new() }];

        while !branches.is_empty() && !binaries.is_empty() {
            let binary = binaries.iter().next().cloned().expect("non-empty binary set");
            binaries.remove(&binary);

            let mut next = Vec::new();
            for branch in &branches {
                for value in 0..=1_u8 {
                    let mut child = branch.lp.clone();
                    let var = child.var_index(&binary)?;
                    child.add_constraint(&[(var, 1.0)], RowSense::Eq, f64::from(value));
                    // probe on a clone so probing never pollutes the branch LP
                    if let Some(witness) = probe.is_feasible(child.clone())? {
                        self.witness = Some(witness);
                        let mut fixed = branch.fixed_binaries.clone();
                        fixed.insert(binary.clone(), value);
                        if self.verbose {
                            println!("  [branching] {binary} = {value} stays open ({} fixed)", fixed.len());
                        }
                        next.push(Branch { lp: child, fixed_binaries: fixed });
                    }
                }
            }
            branches = next;
        }

        if branches.is_empty() {
            if self.verbose {
                println!();
            }
            println!("UNSAT (all branches closed)");
            return Ok(false);
        }

        if self.verbose {
            println!();
        }
        println!("SAT (open branch found)");

        let witness = self.witness.as_ref().expect("open branch without a witness");
        let pb_indexing = matches!(self.pricing, PricingStrategy::PseudoBoolean { .. });
        write_report(&mut io::stdout().lock(), witness, &self.table, pb_indexing, false)?;
        let out_path = save_witness_file(&self.input_path, witness, &self.table, pb_indexing)?;
        println!("\nResult saved in: {}", out_path.display());
        Ok(true)
    }
}

/// Checks whether `command` names an existing executable: directly for paths
/// with a directory component, via `PATH` otherwise.
fn executable_available(command: &str) -> bool {
    let path = Path::new(command);
    if path.components().count() > 1 {
        return path.is_file();
    }
    env::var_os("PATH").is_some_and(|paths| {
        env::split_paths(&paths).any(|dir| dir.join(command).is_file())
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{executable_available, FpSolver, FpSolverConfig};
    use crate::parser::parse_modal_formula;

    fn solver_for(lines: &[&str], name: &str) -> FpSolver {
        let formulas = lines.iter().map(|l| parse_modal_formula(l).unwrap()).collect();
        let mut path = std::env::temp_dir();
        path.push(format!("fplsol_unit_{}_{name}.fpl", std::process::id()));
        FpSolver::new(formulas, path, &FpSolverConfig::new().use_pb(false))
    }

    fn cleanup(solver: &FpSolver) {
        let _ = std::fs::remove_file(solver.input_path.with_extension("out"));
    }

    #[test]
    fn test_implication_chain_is_unsat() {
        // P(p) → P(q) with P(p) forced to 1 and P(q) forced to 0
        let mut solver = solver_for(&["P(p) → P(q)", "P(p)", "¬P(q)"], "unsat_branching");
        assert!(!solver.solve().unwrap());
        cleanup(&solver);
    }

    #[test]
    fn test_strong_conjunction_with_own_negation_is_unsat() {
        let mut solver = solver_for(&["P(p) ⊙ ¬P(p)"], "odot_unsat");
        assert!(!solver.solve().unwrap());
        cleanup(&solver);
    }

    #[test]
    fn test_tautology_atom_is_sat() {
        let mut solver = solver_for(&["P(p ∨ ¬p)"], "tautology");
        assert!(solver.solve().unwrap());
        let witness = solver.witness().unwrap();
        assert!((witness.modal_values["P((p ∨ ¬(p)))"] - 1.0).abs() < 1e-6);
        let total: f64 = witness.distribution.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        cleanup(&solver);
    }

    #[test]
    fn test_tautological_implication_is_sat() {
        let mut solver = solver_for(&["P(p → p)"], "taut_impl");
        assert!(solver.solve().unwrap());
        let witness = solver.witness().unwrap();
        assert!((witness.modal_values["P((p → p))"] - 1.0).abs() < 1e-6);
        cleanup(&solver);
    }

    #[test]
    fn test_missing_pb_solver_falls_back() {
        let formulas = vec![parse_modal_formula("P(p)").unwrap()];
        let config =
            FpSolverConfig::new().pb_solver("fplsol_no_such_executable_hopefully");
        let solver = FpSolver::new(formulas, PathBuf::from("probe.fpl"), &config);
        assert_eq!(solver.pricing, crate::solver::PricingStrategy::Exhaustive);
    }

    #[test]
    fn test_executable_probe() {
        assert!(!executable_available("fplsol_no_such_executable_hopefully"));
        assert!(!executable_available("/nonexistent/dir/fplsol"));
    }
}
