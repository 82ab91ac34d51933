use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

impl PortDirection {
    pub fn parse(name: &str) -> Option<PortDirection> {
        match name {
            "input" => Some(PortDirection::Input),
            "output" => Some(PortDirection::Output),
            "inout" => Some(PortDirection::Inout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub direction: PortDirection,
    pub bits: Vec<u32>,
}

/// A named container of ports, cells, and nets. One module of a design is
/// designated top by the caller; see [`Design::top_module`].
///
/// [`Design::top_module`]: crate::Design::top_module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub ports: IndexMap<String, Port>,
    pub cells: IndexMap<String, Cell>,
    pub netnames: IndexMap<String, Vec<u32>>,
}

impl Module {
    pub fn new(name: &str) -> Module {
        Module { name: name.to_owned(), ..Module::default() }
    }

    /// Maps each signal id to its display name. A leading `\` escape marker
    /// is stripped; bit *i* of a multi-bit net `base` is named `base[i]`.
    pub fn signal_names(&self) -> HashMap<u32, String> {
        let mut names = HashMap::new();
        for (net_name, bits) in &self.netnames {
            let clean = net_name.strip_prefix('\\').unwrap_or(net_name);
            if let [bit] = bits[..] {
                names.insert(bit, clean.to_owned());
            } else {
                for (index, &bit) in bits.iter().enumerate() {
                    names.insert(bit, format!("{clean}[{index}]"));
                }
            }
        }
        names
    }

    /// Signals bound to output or bidirectional module ports. Rewrite passes
    /// must not collapse through or delete these nets.
    pub fn output_port_signals(&self) -> HashSet<u32> {
        let mut signals = HashSet::new();
        for port in self.ports.values() {
            if matches!(port.direction, PortDirection::Output | PortDirection::Inout) {
                signals.extend(port.bits.iter().copied());
            }
        }
        signals
    }

    /// Counts, for every signal, the number of cell input pins consuming it.
    /// Rebuilt once per pass; turns "is this net safe to delete" into an O(1)
    /// lookup.
    pub fn fanout(&self) -> HashMap<u32, u32> {
        let mut fanout = HashMap::new();
        for cell in self.cells.values() {
            for (_pin, bits) in cell.input_pins() {
                for &bit in bits {
                    *fanout.entry(bit).or_insert(0) += 1;
                }
            }
        }
        fanout
    }

    /// Maps each output signal to the name of its producing cell.
    pub fn producers(&self) -> HashMap<u32, String> {
        let mut producers = HashMap::new();
        for (name, cell) in &self.cells {
            for signal in cell.output_signals() {
                producers.insert(signal, name.clone());
            }
        }
        producers
    }

    /// Picks an instance name with the given prefix that no existing cell
    /// uses.
    pub fn fresh_cell_name(&self, prefix: &str) -> String {
        for counter in 0.. {
            let name = format!("{prefix}{counter}");
            if !self.cells.contains_key(&name) {
                return name;
            }
        }
        unreachable!()
    }
}
