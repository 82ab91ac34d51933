use indexmap::IndexMap;

use gate2spice_netlist::{AssocGate, CellKind, Primitive};
use gate2spice_techmap::{
    CellLibrary, CellMeta, map_cell_to_library, map_gate_to_cell, resolve_cell_parameters,
    spice_model,
};

fn library(cells: &[&str]) -> CellLibrary {
    let mut lib = CellLibrary { technology: "generic".to_owned(), ..CellLibrary::default() };
    for cell in cells {
        lib.cells.insert((*cell).to_owned(), CellMeta::default());
    }
    lib
}

#[test]
fn internal_gate_names_use_the_internal_table() {
    let lib = library(&["AND2", "INV", "DFF"]);
    assert_eq!(map_gate_to_cell("$_AND_", &lib).as_deref(), Some("AND2"));
    assert_eq!(map_gate_to_cell("$_NOT_", &lib).as_deref(), Some("INV"));
    assert_eq!(map_gate_to_cell("$_DFFE_P_", &lib).as_deref(), Some("DFF"));
}

#[test]
fn internal_gate_names_never_fall_through() {
    // and2 only differs in case, but the internal table is authoritative.
    let lib = library(&["and2", "INV"]);
    assert_eq!(map_gate_to_cell("$_AND_", &lib), None);
}

#[test]
fn exact_library_name_wins_over_generic_table() {
    let lib = library(&["NOT", "INV"]);
    assert_eq!(map_gate_to_cell("NOT", &lib).as_deref(), Some("NOT"));
}

#[test]
fn generic_table_applies_when_exact_name_is_absent() {
    let lib = library(&["INV", "NAND2"]);
    assert_eq!(map_gate_to_cell("NOT", &lib).as_deref(), Some("INV"));
    assert_eq!(map_gate_to_cell("NAND", &lib).as_deref(), Some("NAND2"));
}

#[test]
fn case_insensitive_scan_is_the_last_resort() {
    let lib = library(&["Nand2"]);
    assert_eq!(map_gate_to_cell("nand2", &lib).as_deref(), Some("Nand2"));
    assert_eq!(map_gate_to_cell("SRAM", &lib), None);
}

#[test]
fn mapping_is_deterministic() {
    let lib = library(&["AND2", "AND4", "INV", "FA"]);
    for gate in ["$_AND_", "AND4", "FA", "NOT"] {
        assert_eq!(map_gate_to_cell(gate, &lib), map_gate_to_cell(gate, &lib));
    }
}

#[test]
fn cell_kinds_map_through_their_type_names() {
    let lib = library(&["AND4", "HA", "FA", "XOR2"]);
    let wide = CellKind::WideGate { base: AssocGate::And, width: 4 };
    assert_eq!(map_cell_to_library(&wide, &lib).as_deref(), Some("AND4"));
    assert_eq!(map_cell_to_library(&CellKind::HalfAdder, &lib).as_deref(), Some("HA"));
    assert_eq!(map_cell_to_library(&CellKind::FullAdder, &lib).as_deref(), Some("FA"));
    assert_eq!(
        map_cell_to_library(&CellKind::Primitive(Primitive::Xor), &lib).as_deref(),
        Some("XOR2")
    );
}

#[test]
fn spice_model_falls_back_to_cell_name() {
    let mut lib = library(&["INV"]);
    assert_eq!(spice_model("INV", &lib).as_deref(), Some("INV"));
    lib.cells["INV"].spice_model = Some("INVX1".to_owned());
    assert_eq!(spice_model("INV", &lib).as_deref(), Some("INVX1"));
    assert_eq!(spice_model("NAND2", &lib), None);
}

#[test]
fn parameters_resolve_from_instance_with_defaults() {
    let mut lib = library(&["INV"]);
    lib.cells["INV"].parameters = vec!["W".to_owned(), "L".to_owned()];
    let mut gate_params = IndexMap::new();
    gate_params.insert("W".to_owned(), "2.5".to_owned());
    gate_params.insert("UNRELATED".to_owned(), "9".to_owned());
    let resolved = resolve_cell_parameters("INV", &gate_params, &lib);
    assert_eq!(resolved["W"], "2.5");
    assert_eq!(resolved["L"], "1.0");
    assert_eq!(resolved.len(), 2);
}
