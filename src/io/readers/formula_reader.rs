use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::FplError;
use crate::formulas::ModalFormula;
use crate::parser::parse_modal_formula;

/// Reads modal formulas from a file, one per non-empty line. Blank lines are
/// ignored.
///
/// If the file cannot be read, an [`FplError::Io`] is returned; if a line
/// cannot be parsed, an [`FplError::Parse`] is returned.
///
/// # Examples
///
/// Assume there is a file `path/to/problem.fpl` with the contents:
/// ```text
/// P(p) ⊕ P(q)
/// ¬P(p ∧ q)
/// ```
///
/// ```no_run
/// # use fplsol::io::read_modal_formulas;
/// let formulas = read_modal_formulas("path/to/problem.fpl").unwrap();
/// assert_eq!(formulas.len(), 2);
/// ```
pub fn read_modal_formulas<P: AsRef<Path>>(path: P) -> Result<Vec<ModalFormula>, FplError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut formulas = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        formulas.push(parse_modal_formula(&line)?);
    }
    Ok(formulas)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::read_modal_formulas;
    use crate::error::FplError;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("fplsol_reader_{}_{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_non_empty_lines() {
        let path = temp_file("ok.fpl", "P(p)\n\n  \n¬P(p ∧ q)\n");
        let formulas = read_modal_formulas(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(formulas.len(), 2);
        assert_eq!(formulas[0].canonical(), "P(p)");
        assert_eq!(formulas[1].canonical(), "¬(P((p ∧ q)))");
    }

    #[test]
    fn test_parse_error_propagates() {
        let path = temp_file("bad.fpl", "P(p)\nP(p ⊕ q)\n");
        let result = read_modal_formulas(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(FplError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_modal_formulas("definitely/not/here.fpl");
        assert!(matches!(result, Err(FplError::Io(_))));
    }
}
