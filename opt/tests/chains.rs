use gate2spice_netlist::{AssocGate, Cell, CellKind, Module, Port, PortDirection, Primitive};
use gate2spice_opt::{DEFAULT_MAX_ARITY, collapse_chains};
use gate2spice_techmap::{CellLibrary, CellMeta};

fn library(cells: &[&str]) -> CellLibrary {
    let mut lib = CellLibrary::default();
    for cell in cells {
        lib.cells.insert((*cell).to_owned(), CellMeta::default());
    }
    lib
}

fn gate(prim: Primitive, a: u32, b: u32, y: u32) -> Cell {
    Cell::new(CellKind::Primitive(prim)).with_pin("A", &[a]).with_pin("B", &[b]).with_pin("Y", &[y])
}

fn output_port(module: &mut Module, name: &str, bit: u32) {
    module.ports.insert(name.to_owned(), Port { direction: PortDirection::Output, bits: vec![bit] });
}

/// ((w & x) & y) & z over signals 2..=5, result on 12.
fn and_chain() -> Module {
    let mut module = Module::new("chain");
    module.cells.insert("g1".to_owned(), gate(Primitive::And, 2, 3, 10));
    module.cells.insert("g2".to_owned(), gate(Primitive::And, 10, 4, 11));
    module.cells.insert("g3".to_owned(), gate(Primitive::And, 11, 5, 12));
    output_port(&mut module, "out", 12);
    module
}

#[test]
fn three_gate_chain_becomes_and4() {
    let mut module = and_chain();
    collapse_chains(&mut module, &library(&["AND4"]), DEFAULT_MAX_ARITY);

    assert_eq!(module.cells.len(), 1);
    let wide = &module.cells["g3"];
    assert_eq!(wide.kind, CellKind::WideGate { base: AssocGate::And, width: 4 });
    assert_eq!(wide.pin("A"), Some(&[2][..]));
    assert_eq!(wide.pin("B"), Some(&[3][..]));
    assert_eq!(wide.pin("C"), Some(&[4][..]));
    assert_eq!(wide.pin("D"), Some(&[5][..]));
    assert_eq!(wide.pin("Y"), Some(&[12][..]));
}

#[test]
fn shared_net_stops_the_chain() {
    // g1's output also feeds an unrelated OR, so it stays a leaf.
    let mut module = and_chain();
    module.cells.insert("tap".to_owned(), gate(Primitive::Or, 10, 6, 13));
    output_port(&mut module, "tapped", 13);
    collapse_chains(&mut module, &library(&["AND3", "AND4"]), DEFAULT_MAX_ARITY);

    assert_eq!(module.cells.len(), 3);
    let wide = &module.cells["g3"];
    assert_eq!(wide.kind, CellKind::WideGate { base: AssocGate::And, width: 3 });
    assert_eq!(wide.pin("A"), Some(&[10][..]));
    assert_eq!(wide.pin("B"), Some(&[4][..]));
    assert_eq!(wide.pin("C"), Some(&[5][..]));
    assert_eq!(module.cells["g1"].kind, CellKind::Primitive(Primitive::And));
}

#[test]
fn output_port_net_stops_the_chain() {
    let mut module = and_chain();
    output_port(&mut module, "probe", 10);
    collapse_chains(&mut module, &library(&["AND3", "AND4"]), DEFAULT_MAX_ARITY);

    assert_eq!(module.cells.len(), 2);
    let wide = &module.cells["g3"];
    assert_eq!(wide.kind, CellKind::WideGate { base: AssocGate::And, width: 3 });
    assert_eq!(wide.pin("A"), Some(&[10][..]));
    assert_eq!(module.cells["g1"].kind, CellKind::Primitive(Primitive::And));
}

#[test]
fn chain_without_a_matching_wide_cell_is_untouched() {
    let mut module = and_chain();
    collapse_chains(&mut module, &library(&["AND2", "AND3"]), DEFAULT_MAX_ARITY);
    assert_eq!(module.cells.len(), 3);
    assert!(module.cells.values().all(|cell| cell.kind == CellKind::Primitive(Primitive::And)));
}

#[test]
fn chains_wider_than_max_arity_are_untouched() {
    let mut wide_chain = and_chain();
    wide_chain.ports.clear();
    wide_chain.cells.insert("g4".to_owned(), gate(Primitive::And, 12, 6, 13));
    output_port(&mut wide_chain, "out", 13);

    let lib = library(&["AND4", "AND5"]);
    let mut capped = wide_chain.clone();
    collapse_chains(&mut capped, &lib, 4);
    assert_eq!(capped.cells.len(), 4);

    collapse_chains(&mut wide_chain, &lib, 5);
    assert_eq!(wide_chain.cells.len(), 1);
    let wide = &wide_chain.cells["g4"];
    assert_eq!(wide.kind, CellKind::WideGate { base: AssocGate::And, width: 5 });
    assert_eq!(wide.pin("E"), Some(&[6][..]));
}

#[test]
fn mixed_gate_types_do_not_fuse() {
    let mut module = Module::new("mixed");
    module.cells.insert("g1".to_owned(), gate(Primitive::And, 2, 3, 10));
    module.cells.insert("g2".to_owned(), gate(Primitive::Or, 10, 4, 11));
    output_port(&mut module, "out", 11);
    collapse_chains(&mut module, &library(&["AND3", "OR3"]), DEFAULT_MAX_ARITY);
    assert_eq!(module.cells.len(), 2);
    assert_eq!(module.cells["g2"].kind, CellKind::Primitive(Primitive::Or));
}

#[test]
fn or_chain_becomes_or3() {
    let mut module = Module::new("or");
    module.cells.insert("g1".to_owned(), gate(Primitive::Or, 2, 3, 10));
    module.cells.insert("g2".to_owned(), gate(Primitive::Or, 10, 4, 11));
    output_port(&mut module, "out", 11);
    collapse_chains(&mut module, &library(&["OR3"]), DEFAULT_MAX_ARITY);

    assert_eq!(module.cells.len(), 1);
    let wide = &module.cells["g2"];
    assert_eq!(wide.kind, CellKind::WideGate { base: AssocGate::Or, width: 3 });
    assert_eq!(wide.pin("A"), Some(&[2][..]));
    assert_eq!(wide.pin("B"), Some(&[3][..]));
    assert_eq!(wide.pin("C"), Some(&[4][..]));
}

#[test]
fn balanced_tree_collapses_too() {
    // (w & x) & (y & z), the head's operands are both inner gates.
    let mut module = Module::new("tree");
    module.cells.insert("l".to_owned(), gate(Primitive::And, 2, 3, 10));
    module.cells.insert("r".to_owned(), gate(Primitive::And, 4, 5, 11));
    module.cells.insert("top".to_owned(), gate(Primitive::And, 10, 11, 12));
    output_port(&mut module, "out", 12);
    collapse_chains(&mut module, &library(&["AND4"]), DEFAULT_MAX_ARITY);

    assert_eq!(module.cells.len(), 1);
    let wide = &module.cells["top"];
    assert_eq!(wide.kind, CellKind::WideGate { base: AssocGate::And, width: 4 });
    assert_eq!(wide.pin("A"), Some(&[2][..]));
    assert_eq!(wide.pin("D"), Some(&[5][..]));
}
