#![doc = include_str!("../README.md")]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
#![allow(
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::float_cmp,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Error type of the crate.
pub mod error;
/// Types to represent and manage CPL and modal formulas.
pub mod formulas;
/// Functions for reading formulas from files and writing witness reports.
pub mod io;
/// Linear programs with an embedded simplex solver.
pub mod linear;
/// Parser for the Unicode formula language.
pub mod parser;
/// The FP(Ł) decision procedure.
pub mod solver;
/// Additional utility.
pub mod util;

pub use error::FplError;
