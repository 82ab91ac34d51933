//! Technology mapping: resolving gate type tags to cells of a loaded
//! technology library.
//!
//! Synthesizer-internal primitive names are authoritative: when the internal
//! table recommends a cell that the library lacks, the lookup fails outright
//! instead of falling through, so that a library gap never gets masked by the
//! case-insensitive fallback.

mod library;

pub use library::{CellLibrary, CellMeta, LibraryError, load_cell_library};

use indexmap::IndexMap;
use log::{debug, error};

use gate2spice_netlist::CellKind;

/// Generic (non-internal) gate names and their canonical cells.
const GENERIC_GATE_MAP: &[(&str, &str)] = &[
    ("NOT", "INV"),
    ("AND", "AND2"),
    ("NAND", "NAND2"),
    ("OR", "OR2"),
    ("NOR", "NOR2"),
    ("XOR", "XOR2"),
    ("XNOR", "XNOR2"),
    ("BUF", "BUF"),
    ("DFF", "DFF"),
    ("DFFR", "DFFR"),
    ("FA", "FA"),
    ("HA", "HA"),
    ("MUX2", "MUX2"),
    ("MUX4", "MUX4"),
    ("MUX8", "MUX8"),
];

/// Maps a gate type tag to a cell name of the library.
///
/// Resolution order, first match wins: the internal-primitive table (which
/// does not fall through on a missing cell), the type tag itself, the generic
/// table, and a case-insensitive scan of the library.
pub fn map_gate_to_cell(gate_type: &str, library: &CellLibrary) -> Option<String> {
    if let Some(prim) = gate2spice_netlist::Primitive::from_type_name(gate_type) {
        let mapped = prim.cell_base();
        if library.cells.contains_key(mapped) {
            debug!("mapped internal gate {:?} to {:?}", gate_type, mapped);
            return Some(mapped.to_owned());
        }
        error!(
            "internal gate {:?} maps to {:?} but this cell is not in the library; \
             available cells: {:?}",
            gate_type,
            mapped,
            library.cells.keys().collect::<Vec<_>>()
        );
        return None;
    }

    if library.cells.contains_key(gate_type) {
        return Some(gate_type.to_owned());
    }

    if let Some(&(_, mapped)) = GENERIC_GATE_MAP.iter().find(|&&(name, _)| name == gate_type) {
        if library.cells.contains_key(mapped) {
            return Some(mapped.to_owned());
        }
    }

    for cell_name in library.cells.keys() {
        if cell_name.eq_ignore_ascii_case(gate_type) {
            return Some(cell_name.clone());
        }
    }

    error!(
        "gate type {:?} cannot be mapped to any cell in library; available cells: {:?}",
        gate_type,
        library.cells.keys().collect::<Vec<_>>()
    );
    None
}

/// [`map_gate_to_cell`] dispatched on the cell kind's type tag.
pub fn map_cell_to_library(kind: &CellKind, library: &CellLibrary) -> Option<String> {
    map_gate_to_cell(&kind.type_name(), library)
}

/// The SPICE model name emitted for a library cell. Falls back to the cell
/// name itself when the library metadata names no model.
pub fn spice_model(cell_name: &str, library: &CellLibrary) -> Option<String> {
    let meta = library.cells.get(cell_name)?;
    Some(meta.spice_model.clone().unwrap_or_else(|| cell_name.to_owned()))
}

/// Resolves the values of the parameters a library cell declares, taking each
/// from the gate instance when present and defaulting otherwise.
pub fn resolve_cell_parameters(
    cell_name: &str,
    gate_params: &IndexMap<String, String>,
    library: &CellLibrary,
) -> IndexMap<String, String> {
    let mut resolved = IndexMap::new();
    let Some(meta) = library.cells.get(cell_name) else { return resolved };
    for param in &meta.parameters {
        let value = gate_params.get(param).cloned().unwrap_or_else(|| "1.0".to_owned());
        resolved.insert(param.clone(), value);
    }
    resolved
}
