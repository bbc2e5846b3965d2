use thiserror::Error;

/// All errors surfaced by the solver library.
///
/// Numerical non-optimality of a linear program (infeasible, unbounded, or an
/// aborted solve) is *not* an error — it drives pricing and branching
/// decisions. Violated encoding invariants are programmer errors and panic.
#[derive(Debug, Error)]
pub enum FplError {
    /// An input or output file could not be read or written.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A formula could not be parsed.
    #[error("{0}")]
    Parse(String),
    /// A primal or dual value could not be retrieved from the LP layer.
    #[error("{0}")]
    Solver(String),
}
