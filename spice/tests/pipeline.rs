//! End-to-end run over the library boundary: JSON design in, SPICE text out.

use gate2spice_opt::{DEFAULT_MAX_ARITY, rewrite_module};
use gate2spice_spice::{OutputLevel, format_flattened, generate_netlist, validate};
use gate2spice_techmap::{CellLibrary, CellMeta};
use gate2spice_yosys_json::import;

const DESIGN: &str = r#"{
    "modules": {
        "top": {
            "ports": {
                "a": { "direction": "input", "bits": [2] },
                "b": { "direction": "input", "bits": [3] },
                "c": { "direction": "input", "bits": [4] },
                "d": { "direction": "input", "bits": [5] },
                "n": { "direction": "input", "bits": [6] },
                "out": { "direction": "output", "bits": [12] },
                "y": { "direction": "output", "bits": [7] }
            },
            "cells": {
                "g1": { "type": "$_AND_", "connections": { "A": [2], "B": [3], "Y": [10] } },
                "g2": { "type": "$_AND_", "connections": { "A": [10], "B": [4], "Y": [11] } },
                "g3": { "type": "$_AND_", "connections": { "A": [11], "B": [5], "Y": [12] } },
                "inv": { "type": "$_NOT_", "connections": { "A": [6], "Y": [7] } }
            },
            "netnames": {
                "a": { "bits": [2] },
                "b": { "bits": [3] },
                "c": { "bits": [4] },
                "d": { "bits": [5] },
                "n": { "bits": [6] },
                "mid1": { "bits": [10] },
                "mid2": { "bits": [11] },
                "out": { "bits": [12] },
                "y": { "bits": [7] }
            }
        }
    }
}"#;

const CELLS_SPICE: &str = "\
.MODEL NMOS NMOS (LEVEL=1)
.MODEL PMOS PMOS (LEVEL=1)
.SUBCKT INV A Y
M1 Y A VDD VDD PMOS
M2 Y A VSS VSS NMOS
.ENDS INV
.SUBCKT AND4 A B C D Y
M1 Y A VDD VDD PMOS
.ENDS AND4
";

fn library() -> CellLibrary {
    let mut lib = CellLibrary { technology: "generic".to_owned(), ..CellLibrary::default() };
    lib.cells.insert(
        "INV".to_owned(),
        CellMeta { pins: vec!["A".to_owned(), "Y".to_owned()], ..CellMeta::default() },
    );
    lib.cells.insert(
        "AND4".to_owned(),
        CellMeta {
            pins: ["A", "B", "C", "D", "Y"].iter().map(|p| (*p).to_owned()).collect(),
            ..CellMeta::default()
        },
    );
    let dir = std::env::temp_dir().join(format!("gate2spice-pipeline-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("cells.sp");
    std::fs::write(&path, CELLS_SPICE).unwrap();
    lib.spice_file = Some(path);
    lib
}

#[test]
fn design_flows_from_json_to_logic_level_spice() {
    let design = import(DESIGN).unwrap();
    let mut module = design.top_module(None).unwrap().clone();
    let lib = library();

    rewrite_module(&mut module, &lib, DEFAULT_MAX_ARITY);
    assert_eq!(module.cells.len(), 2);

    let netlist = generate_netlist(&module, &lib, "design.json").unwrap();
    assert_eq!(netlist.instances, vec!["Xg3 a b c d out AND4", "Xinv n y INV"]);

    let text = format_flattened(&netlist, &lib, OutputLevel::Logic).unwrap();
    assert!(text.contains(".SUBCKT AND4 A B C D Y"));
    assert!(text.contains("\nXg3 a b c d out AND4\n"));
    assert!(validate(&text));
}

#[test]
fn design_flows_from_json_to_transistor_level_spice() {
    let design = import(DESIGN).unwrap();
    let mut module = design.top_module(None).unwrap().clone();
    let lib = library();

    rewrite_module(&mut module, &lib, DEFAULT_MAX_ARITY);
    let netlist = generate_netlist(&module, &lib, "design.json").unwrap();
    let text = format_flattened(&netlist, &lib, OutputLevel::Transistor).unwrap();

    assert!(text.contains("\nMg3.1 out a VDD VDD PMOS\n"));
    assert!(text.contains("\nMinv.1 y n VDD VDD PMOS\n"));
    assert!(text.contains(".MODEL NMOS NMOS (LEVEL=1)"));
    assert!(validate(&text));
}
