//! Collapsing chains of same-type 2-input associative gates into one wider
//! N-input gate.
//!
//! Only the head of a chain is rewritten: a gate whose output feeds, through
//! a fanout-1 net, another gate of the same type is inner to that consumer's
//! chain and is skipped, the way inner tree nodes are excluded from
//! rebalancing. Expansion stops at nets with fanout greater than one and at
//! module output-port nets, so external observers of intermediate results
//! keep seeing them.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use gate2spice_netlist::{AssocGate, CellKind, Module};
use gate2spice_techmap::{CellLibrary, map_gate_to_cell};

struct ChainIndexes {
    /// Producing cell name per single-bit output signal.
    producer: HashMap<u32, String>,
    /// Consuming cell names per signal, input pins only.
    consumers: HashMap<u32, Vec<String>>,
    fanout: HashMap<u32, u32>,
    output_ports: HashSet<u32>,
}

impl ChainIndexes {
    fn build(module: &Module) -> ChainIndexes {
        let mut consumers: HashMap<u32, Vec<String>> = HashMap::new();
        for (name, cell) in &module.cells {
            for (_pin, bits) in cell.input_pins() {
                for &bit in bits {
                    consumers.entry(bit).or_default().push(name.clone());
                }
            }
        }
        ChainIndexes {
            producer: module.producers(),
            consumers,
            fanout: module.fanout(),
            output_ports: module.output_port_signals(),
        }
    }

    /// Whether a chain may expand through this net into its producer: single
    /// producer of the same gate type, fanout exactly one, and not a module
    /// output port.
    fn expandable(&self, module: &Module, signal: u32, base: AssocGate) -> Option<&str> {
        if self.output_ports.contains(&signal) || self.fanout.get(&signal) != Some(&1) {
            return None;
        }
        let producer = self.producer.get(&signal)?;
        let cell = module.cells.get(producer)?;
        (cell.kind == CellKind::Primitive(base.primitive())).then_some(producer.as_str())
    }
}

fn chain_base(module: &Module, name: &str) -> Option<AssocGate> {
    let cell = module.cells.get(name)?;
    let CellKind::Primitive(prim) = &cell.kind else { return None };
    let base = prim.assoc()?;
    cell.two_input_operands()?;
    cell.single_output()?;
    Some(base)
}

/// Depth-first leaf collection over a gate's operands: an operand whose
/// producer matches the fusion criteria is inlined, anything else is a leaf.
fn collect_leaves(
    module: &Module,
    ix: &ChainIndexes,
    base: AssocGate,
    signal: u32,
    leaves: &mut Vec<u32>,
    inlined: &mut Vec<String>,
) {
    if let Some(producer) = ix.expandable(module, signal, base) {
        if !inlined.iter().any(|name| name == producer) {
            if let Some((a, b)) = module.cells[producer].two_input_operands() {
                let producer = producer.to_owned();
                inlined.push(producer);
                collect_leaves(module, ix, base, a, leaves, inlined);
                collect_leaves(module, ix, base, b, leaves, inlined);
                return;
            }
        }
    }
    if !leaves.contains(&signal) {
        leaves.push(signal);
    }
}

/// Fuses chains of 2-input associative gates into `{BASE}{N}` cells, N capped
/// at `max_arity`. Cells whose chain is too short, too long, or has no
/// matching wide cell in the library are left untouched.
pub fn collapse_chains(module: &mut Module, library: &CellLibrary, max_arity: usize) {
    let max_arity = max_arity.min(26);
    let ix = ChainIndexes::build(module);
    let candidates: Vec<String> = module.cells.keys().cloned().collect();

    for name in candidates {
        let Some(base) = chain_base(module, &name) else { continue };

        // Inner chain gates belong to the chain of their single consumer.
        let cell = &module.cells[&name];
        let y = cell.single_output().unwrap();
        if !ix.output_ports.contains(&y)
            && ix.fanout.get(&y) == Some(&1)
            && ix.consumers.get(&y).is_some_and(|users| {
                users.iter().all(|user| module.cells.get(user).is_some_and(|c| c.kind == CellKind::Primitive(base.primitive())))
            })
        {
            continue;
        }

        let (a, b) = cell.two_input_operands().unwrap();
        let mut leaves = Vec::new();
        let mut inlined = Vec::new();
        collect_leaves(module, &ix, base, a, &mut leaves, &mut inlined);
        collect_leaves(module, &ix, base, b, &mut leaves, &mut inlined);

        if leaves.len() < 3 || leaves.len() > max_arity {
            continue;
        }
        let wide_type = format!("{}{}", base.base_name(), leaves.len());
        if map_gate_to_cell(&wide_type, library).is_none() {
            debug!("no {} cell in library, leaving chain at {} untouched", wide_type, name);
            continue;
        }

        let cell = module.cells.get_mut(&name).unwrap();
        cell.kind = CellKind::WideGate { base, width: leaves.len() };
        cell.connections.clear();
        for (at, &leaf) in leaves.iter().enumerate() {
            let pin = char::from(b'A' + at as u8);
            cell.connections.insert(pin.to_string(), vec![leaf]);
        }
        cell.connections.insert("Y".to_owned(), vec![y]);
        info!("collapsed {} gates into {} at {}", inlined.len() + 1, wide_type, name);
        for producer in inlined {
            module.cells.shift_remove(&producer);
        }
    }
}
