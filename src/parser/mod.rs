mod fpl_parser;

pub use fpl_parser::{parse_cpl_formula, parse_modal_formula};
