//! Recognition of half/full-adder idioms in the 2-input gate graph.
//!
//! A full adder is matched in either of its two decompositions: the textbook
//! five-cell form (two chained XORs, two ANDs, one OR) and the seven-cell
//! carry-select form (two chained XORs, three ANDs, a two-level OR tree).
//! Full adders are matched before half adders, since every full adder
//! contains the half-adder XOR/AND pair on its A/B inputs.

use std::collections::{HashMap, HashSet};

use log::info;

use gate2spice_netlist::{Cell, CellKind, Module, Primitive};
use gate2spice_techmap::{CellLibrary, map_gate_to_cell};

/// A 2-input boolean gate, flattened out of the module for matching.
#[derive(Clone)]
struct BoolGate {
    name: String,
    prim: Primitive,
    a: u32,
    b: u32,
    y: u32,
}

impl BoolGate {
    fn has_operands(&self, x: u32, y: u32) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

struct Indexes {
    gates: Vec<BoolGate>,
    /// Producing gate position per single-bit output signal.
    producer: HashMap<u32, usize>,
    fanout: HashMap<u32, u32>,
    output_ports: HashSet<u32>,
}

impl Indexes {
    fn build(module: &Module) -> Indexes {
        let mut gates = Vec::new();
        for (name, cell) in &module.cells {
            let CellKind::Primitive(prim) = &cell.kind else { continue };
            let Some((a, b)) = cell.two_input_operands() else { continue };
            let Some(y) = cell.single_output() else { continue };
            gates.push(BoolGate { name: name.clone(), prim: *prim, a, b, y });
        }
        let producer = gates.iter().enumerate().map(|(at, gate)| (gate.y, at)).collect();
        Indexes { gates, producer, fanout: module.fanout(), output_ports: module.output_port_signals() }
    }

    fn find(&self, prim: Primitive, x: u32, y: u32, exclude: &[usize]) -> Option<usize> {
        self.gates.iter().enumerate().find_map(|(at, gate)| {
            (gate.prim == prim && gate.has_operands(x, y) && !exclude.contains(&at)).then_some(at)
        })
    }

    /// True when a net vanishing inside a match has exactly the consumers the
    /// match accounts for and is not visible at a module output port.
    fn internal(&self, signal: u32, consumers: u32) -> bool {
        !self.output_ports.contains(&signal)
            && self.fanout.get(&signal).copied().unwrap_or(0) == consumers
    }

    fn producing_gate(&self, signal: u32) -> Option<usize> {
        self.producer.get(&signal).copied()
    }
}

struct FullAdderMatch {
    cells: Vec<usize>,
    a: u32,
    b: u32,
    ci: u32,
    sum: u32,
    carry: u32,
}

/// The five-cell form: SUM = (A^B)^CI, CARRY = A·B + CI·(A^B).
fn match_textbook(ix: &Indexes, xor2: usize, xor1: usize, ci: u32) -> Option<FullAdderMatch> {
    let (a, b) = (ix.gates[xor1].a, ix.gates[xor1].b);
    let t = ix.gates[xor1].y;
    // t feeds the second XOR and the CI-side AND, nothing else.
    if !ix.internal(t, 2) {
        return None;
    }
    let and_ab = ix.find(Primitive::And, a, b, &[xor1, xor2])?;
    let and_ci = ix.find(Primitive::And, ci, t, &[xor1, xor2, and_ab])?;
    if !ix.internal(ix.gates[and_ab].y, 1) || !ix.internal(ix.gates[and_ci].y, 1) {
        return None;
    }
    let or = ix.find(Primitive::Or, ix.gates[and_ab].y, ix.gates[and_ci].y, &[xor1, xor2, and_ab, and_ci])?;
    Some(FullAdderMatch {
        cells: vec![xor1, xor2, and_ab, and_ci, or],
        a,
        b,
        ci,
        sum: ix.gates[xor2].y,
        carry: ix.gates[or].y,
    })
}

/// The seven-cell carry-select form: CARRY = A·B + A·CI + B·CI computed
/// through three ANDs and a two-level OR tree.
fn match_carry_select(ix: &Indexes, xor2: usize, xor1: usize, ci: u32) -> Option<FullAdderMatch> {
    let (a, b) = (ix.gates[xor1].a, ix.gates[xor1].b);
    let t = ix.gates[xor1].y;
    // In this form the first XOR output only feeds the second XOR.
    if !ix.internal(t, 1) {
        return None;
    }
    let and_ab = ix.find(Primitive::And, a, b, &[xor1, xor2])?;
    let and_aci = ix.find(Primitive::And, a, ci, &[xor1, xor2, and_ab])?;
    let and_bci = ix.find(Primitive::And, b, ci, &[xor1, xor2, and_ab, and_aci])?;
    let products = [ix.gates[and_ab].y, ix.gates[and_aci].y, ix.gates[and_bci].y];
    if products.iter().any(|&p| !ix.internal(p, 1)) {
        return None;
    }
    // One OR combines two of the products, the other folds in the third.
    for (at, gate) in ix.gates.iter().enumerate() {
        if gate.prim != Primitive::Or || [xor1, xor2, and_ab, and_aci, and_bci].contains(&at) {
            continue;
        }
        if !products.contains(&gate.a) || !products.contains(&gate.b) || gate.a == gate.b {
            continue;
        }
        let Some(&rest) = products.iter().find(|&&p| p != gate.a && p != gate.b) else { continue };
        if !ix.internal(gate.y, 1) {
            continue;
        }
        let Some(or_outer) = ix.find(Primitive::Or, gate.y, rest, &[xor1, xor2, and_ab, and_aci, and_bci, at])
        else {
            continue;
        };
        return Some(FullAdderMatch {
            cells: vec![xor1, xor2, and_ab, and_aci, and_bci, at, or_outer],
            a,
            b,
            ci,
            sum: ix.gates[xor2].y,
            carry: ix.gates[or_outer].y,
        });
    }
    None
}

fn apply_full_adder(module: &mut Module, ix: &Indexes, m: FullAdderMatch) {
    for at in &m.cells {
        module.cells.shift_remove(&ix.gates[*at].name);
    }
    let cell = Cell::new(CellKind::FullAdder)
        .with_pin("A", &[m.a])
        .with_pin("B", &[m.b])
        .with_pin("CI", &[m.ci])
        .with_pin("SUM", &[m.sum])
        .with_pin("CARRY", &[m.carry]);
    let name = module.fresh_cell_name("$fa$");
    info!("rewrote {} gates into full adder {}", m.cells.len(), name);
    module.cells.insert(name, cell);
}

/// Finds and applies one full-adder match; indexes are rebuilt by the caller
/// between matches so that fanout bookkeeping stays exact.
fn rewrite_one_full_adder(module: &mut Module) -> bool {
    let ix = Indexes::build(module);
    for (xor2, gate) in ix.gates.iter().enumerate() {
        if gate.prim != Primitive::Xor {
            continue;
        }
        for (t, ci) in [(gate.a, gate.b), (gate.b, gate.a)] {
            let Some(xor1) = ix.producing_gate(t) else { continue };
            if xor1 == xor2 || ix.gates[xor1].prim != Primitive::Xor {
                continue;
            }
            if let Some(m) = match_textbook(&ix, xor2, xor1, ci) {
                apply_full_adder(module, &ix, m);
                return true;
            }
            if let Some(m) = match_carry_select(&ix, xor2, xor1, ci) {
                apply_full_adder(module, &ix, m);
                return true;
            }
        }
    }
    false
}

fn rewrite_one_half_adder(module: &mut Module) -> bool {
    let ix = Indexes::build(module);
    for (xor, gate) in ix.gates.iter().enumerate() {
        if gate.prim != Primitive::Xor {
            continue;
        }
        let Some(and) = ix.find(Primitive::And, gate.a, gate.b, &[xor]) else { continue };
        let cell = Cell::new(CellKind::HalfAdder)
            .with_pin("A", &[gate.a])
            .with_pin("B", &[gate.b])
            .with_pin("SUM", &[gate.y])
            .with_pin("CARRY", &[ix.gates[and].y]);
        let xor_name = gate.name.clone();
        let and_name = ix.gates[and].name.clone();
        module.cells.shift_remove(&xor_name);
        module.cells.shift_remove(&and_name);
        let name = module.fresh_cell_name("$ha$");
        info!("rewrote gates {} and {} into half adder {}", xor_name, and_name, name);
        module.cells.insert(name, cell);
        return true;
    }
    false
}

/// Replaces gate-level adder idioms with HA/FA cells. Attempted only for the
/// adder cells the library can actually map.
pub fn detect_adders(module: &mut Module, library: &CellLibrary) {
    let have_fa = map_gate_to_cell("FA", library).is_some();
    let have_ha = map_gate_to_cell("HA", library).is_some();
    if have_fa {
        while rewrite_one_full_adder(module) {}
    }
    if have_ha {
        while rewrite_one_half_adder(module) {}
    }
}
