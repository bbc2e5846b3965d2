use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use regex::Regex;

use crate::error::FplError;
use crate::formulas::{CplFormula, CplNode, VariableTable};

/// Scale factor turning dual multipliers into the integer coefficients of
/// the OPB reduced-cost inequality.
const DUAL_SCALE: f64 = 1e6;

/// How the feasibility engine searches for a valuation with negative reduced
/// cost.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PricingStrategy {
    /// Enumerate all `2^n` valuations; deterministic across runs.
    Exhaustive,
    /// Delegate to an external pseudo-boolean solver speaking the OPB
    /// format.
    PseudoBoolean {
        /// The command to invoke.
        command: String,
        /// Extra arguments passed before the `.opb` path.
        args: Vec<String>,
    },
}

/// Enumerates valuations `0 … 2^n − 1` (bit `j` of the counter is the truth
/// of variable `j`) and returns the first unused one whose reduced cost is
/// negative under `duals`.
pub(crate) fn find_valuation_exhaustive(
    psi_list: &[CplFormula],
    table: &VariableTable,
    duals: &[f64],
    prob_constraint_rows: &[usize],
    sum_prob_row: usize,
    used: &BTreeSet<Vec<bool>>,
    verbose: bool,
) -> Option<Vec<bool>> {
    let n = table.len();
    let total: u64 = 1 << n;
    for w in 0..total {
        let valuation: Vec<bool> = (0..n).map(|j| (w >> j) & 1 == 1).collect();
        if used.contains(&valuation) {
            continue;
        }
        let mut reduced_cost = -duals[sum_prob_row];
        for (i, psi) in psi_list.iter().enumerate() {
            if psi.evaluate(table, &valuation) {
                reduced_cost -= duals[prob_constraint_rows[i]];
            }
        }
        if verbose {
            let bits: String = valuation.iter().map(|&v| if v { '1' } else { '0' }).collect();
            println!("Valuation: {bits}, reduced cost: {reduced_cost}");
        }
        if reduced_cost < 0.0 {
            return Some(valuation);
        }
    }
    None
}

/// Asks the external pseudo-boolean solver for an unused valuation
/// satisfying the scaled reduced-cost inequality. `weights` holds the duals
/// of the probability constraint rows followed by the dual of the
/// normalization row.
///
/// The OPB input and the captured solver output are sibling files of the
/// input file and are removed after reading. A non-zero exit status of the
/// child process is not an error by itself: an output without `v` lines
/// simply yields no valuation.
pub(crate) fn find_valuation_pb(
    command: &str,
    args: &[String],
    input_path: &Path,
    psi_list: &[CplFormula],
    table: &VariableTable,
    weights: &[f64],
    used: &BTreeSet<Vec<bool>>,
) -> Result<Option<Vec<bool>>, FplError> {
    let parent = input_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = input_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let opb_path = parent.join(format!("pb_input_{stem}.opb"));
    let output_path = parent.join(format!("pb_output_{stem}.txt"));

    write_opb_file(&opb_path, psi_list, table, weights, used)?;
    let stdout = File::create(&output_path)?;
    let _ = Command::new(command)
        .args(args)
        .arg(&opb_path)
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::null())
        .status();

    let valuation = parse_pb_output(&output_path, table.len());
    let _ = fs::remove_file(&opb_path);
    let _ = fs::remove_file(&output_path);
    valuation
}

/// Writes the OPB constraint system: a Tseitin encoding of every `ψᵢ` whose
/// outermost indicator enters the reduced-cost inequality, one
/// difference-constraint per previously used valuation, and the scaled
/// reduced-cost inequality itself.
fn write_opb_file(
    path: &Path,
    psi_list: &[CplFormula],
    table: &VariableTable,
    weights: &[f64],
    used: &BTreeSet<Vec<bool>>,
) -> Result<(), FplError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    let mut aux_counter = table.len();
    let mut indicators = Vec::with_capacity(psi_list.len());
    for psi in psi_list {
        indicators.push(encode_tseitin(psi, table, &mut aux_counter, &mut out)?);
    }

    writeln!(out, "* used valuations")?;
    for valuation in used {
        let mut rhs: i64 = 1;
        for (j, &value) in valuation.iter().enumerate() {
            if value {
                write!(out, "-1*x{j} ")?;
                rhs -= 1;
            } else {
                write!(out, "+1*x{j} ")?;
            }
        }
        writeln!(out, ">= {rhs};")?;
    }

    writeln!(out, "* reduced-cost inequality")?;
    let (sum_dual, psi_duals) = weights.split_last().expect("weights must contain the sum dual");
    for (indicator, dual) in indicators.iter().zip(psi_duals) {
        let coefficient = (dual * DUAL_SCALE).round() as i64;
        if coefficient == 0 {
            continue;
        }
        let sign = if coefficient > 0 { "+" } else { "" };
        write!(out, "{sign}{coefficient}*{indicator} ")?;
    }
    let scaled_sum_dual = (sum_dual * DUAL_SCALE).round() as i64;
    writeln!(out, ">= {};", 1 - scaled_sum_dual)?;

    out.flush()?;
    Ok(())
}

/// Tseitin-encodes `formula` over the propositional variables `x0 … x(n−1)`
/// plus fresh auxiliaries, writing one clause per line, and returns the name
/// of the variable equivalent to the formula.
fn encode_tseitin<W: Write>(
    formula: &CplFormula,
    table: &VariableTable,
    aux_counter: &mut usize,
    out: &mut W,
) -> Result<String, FplError> {
    if let CplNode::Variable(name) = formula.node() {
        let index = table
            .index_of(name)
            .unwrap_or_else(|| panic!("variable not registered: {name}"));
        return Ok(format!("x{index}"));
    }

    let y = format!("x{}", *aux_counter);
    *aux_counter += 1;

    match formula.node() {
        CplNode::Variable(_) => unreachable!(),
        CplNode::Not(operand) => {
            let l = encode_tseitin(operand, table, aux_counter, out)?;
            writeln!(out, "+1*{l} +1*{y} >= 1;")?;
            writeln!(out, "-1*{l} -1*{y} >= -1;")?;
        }
        CplNode::And(left, right) => {
            let l = encode_tseitin(left, table, aux_counter, out)?;
            let r = encode_tseitin(right, table, aux_counter, out)?;
            writeln!(out, "+1*{l} -1*{y} >= 0;")?;
            writeln!(out, "+1*{r} -1*{y} >= 0;")?;
            writeln!(out, "-1*{l} -1*{r} +1*{y} >= -1;")?;
        }
        CplNode::Or(left, right) => {
            let l = encode_tseitin(left, table, aux_counter, out)?;
            let r = encode_tseitin(right, table, aux_counter, out)?;
            writeln!(out, "-1*{l} +1*{y} >= 0;")?;
            writeln!(out, "-1*{r} +1*{y} >= 0;")?;
            writeln!(out, "+1*{l} +1*{r} -1*{y} >= 0;")?;
        }
        CplNode::Impl(left, right) => {
            let l = encode_tseitin(left, table, aux_counter, out)?;
            let r = encode_tseitin(right, table, aux_counter, out)?;
            writeln!(out, "-1*{r} +1*{y} >= 0;")?;
            writeln!(out, "+1*{l} +1*{y} >= 1;")?;
            writeln!(out, "-1*{l} +1*{r} -1*{y} >= -1;")?;
        }
        CplNode::Equiv(left, right) => {
            let l = encode_tseitin(left, table, aux_counter, out)?;
            let r = encode_tseitin(right, table, aux_counter, out)?;
            writeln!(out, "-1*{y} -1*{l} +1*{r} >= -1;")?;
            writeln!(out, "-1*{y} +1*{l} -1*{r} >= -1;")?;
            writeln!(out, "-1*{l} -1*{r} +1*{y} >= -1;")?;
            writeln!(out, "+1*{l} +1*{r} +1*{y} >= 1;")?;
        }
    }
    Ok(y)
}

/// Parses the captured solver output. `v` lines carry space-separated signed
/// literals: a bare `xk` sets variable `k` true, a `-xk` is ignored and
/// missing variables default to false; several `v` lines accumulate into one
/// valuation. A line starting with `s UNSATISFIABLE` means no valuation
/// exists; an output with neither yields no valuation as well.
fn parse_pb_output(path: &Path, num_vars: usize) -> Result<Option<Vec<bool>>, FplError> {
    let reader = BufReader::new(File::open(path)?);
    let literal = Regex::new(r"^x(\d+)$").unwrap();
    let mut found = false;
    let mut valuation = vec![false; num_vars];
    for line in reader.lines() {
        let line = line?;
        if line.starts_with("s UNSATISFIABLE") {
            return Ok(None);
        }
        if let Some(rest) = line.strip_prefix("v ") {
            for token in rest.split_whitespace() {
                if token.starts_with('-') {
                    continue;
                }
                if let Some(captures) = literal.captures(token) {
                    if let Ok(index) = captures[1].parse::<usize>() {
                        if index < num_vars {
                            valuation[index] = true;
                        }
                    }
                }
            }
            found = true;
        }
    }
    Ok(found.then_some(valuation))
}
