//! Loader for the synthesizer's gate-level JSON design description.
//!
//! The input is an object keyed by module name, each module carrying `ports`
//! (direction and bit list), `cells` (type tag and pin connections), and
//! `netnames` (name and bit list). Missing optional sub-keys default to
//! empty, matching what the synthesizer emits for trivial designs.

use jzon::JsonValue;
use log::debug;

use gate2spice_netlist::{Cell, CellKind, Design, Module, Port, PortDirection};

#[derive(Debug)]
pub enum ImportError {
    Json(jzon::Error),
    NotAnObject,
}

impl From<jzon::Error> for ImportError {
    fn from(error: jzon::Error) -> Self {
        Self::Json(error)
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Json(error) => write!(f, "JSON parse error: {}", error),
            ImportError::NotAnObject => write!(f, "design description is not a JSON object"),
        }
    }
}

impl std::error::Error for ImportError {}

/// Collects the integer entries of a `bits` array. Constant bits (`"0"`,
/// `"1"`, `"x"`) have no signal id and are skipped.
fn signal_bits(value: &JsonValue) -> Vec<u32> {
    let mut bits = Vec::new();
    for bit in value.members() {
        match bit.as_u32() {
            Some(id) => bits.push(id),
            None => debug!("skipping non-integer bit entry {}", bit),
        }
    }
    bits
}

fn import_module(name: &str, data: &JsonValue) -> Module {
    let mut module = Module::new(name);
    for (port_name, port_data) in data["ports"].entries() {
        let direction = match port_data["direction"].as_str().and_then(PortDirection::parse) {
            Some(direction) => direction,
            None => {
                debug!("port {} of module {} has no usable direction, treating as inout", port_name, name);
                PortDirection::Inout
            }
        };
        let port = Port { direction, bits: signal_bits(&port_data["bits"]) };
        module.ports.insert(port_name.to_owned(), port);
    }
    for (cell_name, cell_data) in data["cells"].entries() {
        let type_name = cell_data["type"].as_str().unwrap_or("");
        if type_name.is_empty() {
            debug!("cell {} of module {} has no type, skipping", cell_name, name);
            continue;
        }
        let mut cell = Cell::new(CellKind::parse(type_name));
        for (pin, bits) in cell_data["connections"].entries() {
            cell.connections.insert(pin.to_owned(), signal_bits(bits));
        }
        for (pin, direction) in cell_data["port_directions"].entries() {
            if let Some(direction) = direction.as_str().and_then(PortDirection::parse) {
                cell.port_directions.insert(pin.to_owned(), direction);
            }
        }
        for (param, value) in cell_data["parameters"].entries() {
            let value = match value.as_str() {
                Some(text) => text.to_owned(),
                None => value.dump(),
            };
            cell.parameters.insert(param.to_owned(), value);
        }
        module.cells.insert(cell_name.to_owned(), cell);
    }
    for (net_name, net_data) in data["netnames"].entries() {
        module.netnames.insert(net_name.to_owned(), signal_bits(&net_data["bits"]));
    }
    module
}

/// Parses a design description into the in-memory module graph.
pub fn import(text: &str) -> Result<Design, ImportError> {
    let root = jzon::parse(text)?;
    if !root.is_object() {
        return Err(ImportError::NotAnObject);
    }
    let mut design = Design::new();
    for (module_name, module_data) in root["modules"].entries() {
        debug!("parsing module {}", module_name);
        design.add_module(import_module(module_name, module_data));
    }
    Ok(design)
}
