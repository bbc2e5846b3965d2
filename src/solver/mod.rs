mod encoding;
mod feasibility;
mod fp_solver;
mod pricing;

pub(crate) use encoding::encode_root;
pub use feasibility::Witness;
pub use fp_solver::{FpSolver, FpSolverConfig};
pub use pricing::PricingStrategy;

/// The bitmask of a valuation: bit `j` is the truth value of variable `j`.
pub fn valuation_bitmask(valuation: &[bool]) -> usize {
    valuation
        .iter()
        .enumerate()
        .filter(|(_, &value)| value)
        .fold(0, |mask, (j, _)| mask | (1 << j))
}
