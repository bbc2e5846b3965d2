use std::path::PathBuf;
use std::process::exit;

use clap::error::ErrorKind;
use clap::Parser;

use fplsol::io::read_modal_formulas;
use fplsol::solver::{FpSolver, FpSolverConfig};
use fplsol::FplError;

#[derive(Parser)]
#[command(name = "fplsol")]
#[command(about = "Satisfiability solver for the probabilistic modal logic FP(Ł)")]
#[command(version)]
struct Cli {
    /// Input file with one FP(Ł) formula per line
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Disable the pseudo-boolean oracle and price exhaustively
    #[arg(long = "no-pb")]
    no_pb: bool,

    /// Command to invoke as the external pseudo-boolean solver
    #[arg(long, default_value = "minisat+")]
    pbsolver: String,

    /// Extra arguments passed to the pseudo-boolean solver before the .opb path
    #[arg(long, default_value = "")]
    pbarg: String,

    /// Print LP snapshots and per-iteration diagnostics
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{e}");
            exit(0);
        }
        Err(e) => {
            eprint!("{e}");
            exit(1);
        }
    };

    match run(&cli) {
        Ok(true) => exit(0),
        Ok(false) => exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<bool, FplError> {
    let formulas = read_modal_formulas(&cli.input)?;
    let config = FpSolverConfig::new()
        .use_pb(!cli.no_pb)
        .pb_solver(cli.pbsolver.clone())
        .pb_arg(cli.pbarg.clone())
        .verbose(cli.verbose);
    let mut solver = FpSolver::new(formulas, cli.input.clone(), &config);
    solver.solve()
}
