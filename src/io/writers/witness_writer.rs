use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::formulas::VariableTable;
use crate::solver::{valuation_bitmask, Witness};

/// Writes the two report sections: the modal-atoms valuation and the
/// probability distribution. `pb_indexing` selects how columns are numbered:
/// the discovery index under pseudo-boolean pricing, the valuation bitmask
/// under exhaustive pricing. `file_style` selects the header variant written
/// to `.out` files.
pub fn write_report<W: Write>(
    out: &mut W,
    witness: &Witness,
    table: &VariableTable,
    pb_indexing: bool,
    file_style: bool,
) -> io::Result<()> {
    if file_style {
        writeln!(out, "======= MODAL ATOMS VALUATION ====")?;
    } else {
        writeln!(out, "\n==== MODAL ATOMS VALUATION ====")?;
    }
    for (id, value) in &witness.modal_values {
        writeln!(out, "{id} = {}", format_value(*value))?;
    }

    writeln!(out, "\n==== PROBABILITY DISTRIBUTION ====")?;
    for (position, (valuation, probability)) in
        witness.valuations.iter().zip(&witness.distribution).enumerate()
    {
        let index = if pb_indexing { position } else { valuation_bitmask(valuation) };
        let assignment = valuation
            .iter()
            .enumerate()
            .map(|(j, &value)| format!("{}={}", table.name(j), u8::from(value)))
            .join(", ");
        writeln!(out, "p({index}) = {}   ({assignment})", format_value(*probability))?;
    }
    Ok(())
}

/// Saves the witness report next to the input file, replacing its final
/// extension with `.out`, and returns the report path.
pub fn save_witness_file(
    input_path: &Path,
    witness: &Witness,
    table: &VariableTable,
    pb_indexing: bool,
) -> io::Result<PathBuf> {
    let out_path = input_path.with_extension("out");
    let mut writer = BufWriter::new(File::create(&out_path)?);
    write_report(&mut writer, witness, table, pb_indexing, true)?;
    writer.flush()?;
    Ok(out_path)
}

/// Renders a value in `[0, 1]` with at most six decimals, trailing zeros
/// trimmed.
pub(crate) fn format_value(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let mut rendered = format!("{rounded:.6}");
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }
    rendered
}
