mod readers;
mod writers;

pub use readers::formula_reader::*;
pub use writers::witness_writer::*;
