//! Rendering of mapped modules as SPICE netlist text.

use log::{error, warn};

use indexmap::IndexMap;

use gate2spice_netlist::Module;
use gate2spice_techmap::{CellLibrary, map_cell_to_library, resolve_cell_parameters, spice_model};

use crate::expand::{ExpandError, Expander};
use crate::subckt::extract_models;

#[derive(Debug)]
pub enum EmitError {
    /// Nothing could be emitted for the module, because it has no cells or
    /// because no cell mapped to the library.
    NoInstances { module: String },
    Expand(ExpandError),
}

impl std::fmt::Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitError::NoInstances { module } => {
                write!(f, "no SPICE instances generated for module {}", module)
            }
            EmitError::Expand(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for EmitError {}

impl From<ExpandError> for EmitError {
    fn from(error: ExpandError) -> EmitError {
        EmitError::Expand(error)
    }
}

/// A generated netlist, kept in sections until it is formatted.
#[derive(Debug, Clone, Default)]
pub struct SpiceNetlist {
    pub top_module: String,
    pub header: Vec<String>,
    pub instances: Vec<String>,
    pub directives: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GeneratedInstances {
    pub instances: Vec<String>,
    /// Gate types that could not be mapped, with occurrence counts.
    pub unmapped: IndexMap<String, usize>,
}

/// How deep the formatted output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    /// Cell instances calling library subcircuits, with the library text
    /// embedded so the file simulates standalone.
    Logic,
    /// Subcircuit calls expanded down to transistors, with the `.MODEL`
    /// cards the transistors reference.
    Transistor,
}

/// Instance names carry hierarchy separators that SPICE tools reject. `.` is
/// reserved for the expansion path prefix and is cleaned here as well.
fn clean_instance_name(name: &str) -> String {
    let name = name.strip_prefix('\\').unwrap_or(name);
    name.replace(['$', '/', ':', '\\', '.'], "_")
}

/// Emits one `X` line per mappable cell of the module. Cells of unmapped
/// types are skipped and accounted for in the result.
pub fn generate_instances(module: &Module, library: &CellLibrary) -> GeneratedInstances {
    let signal_names = module.signal_names();
    let mut generated = GeneratedInstances::default();

    if module.cells.is_empty() {
        warn!("module {} has no cells", module.name);
        return generated;
    }

    for (cell_name, cell) in &module.cells {
        let Some(mapped) = map_cell_to_library(&cell.kind, library) else {
            *generated.unmapped.entry(cell.kind.type_name().into_owned()).or_insert(0) += 1;
            continue;
        };
        let Some(meta) = library.cells.get(&mapped) else { continue };
        let Some(model) = spice_model(&mapped, library) else { continue };

        let mut line = format!("X{}", clean_instance_name(cell_name));
        for pin in &meta.pins {
            let net = match cell.connections.get(pin).and_then(|bits| bits.first()) {
                Some(&bit) => {
                    signal_names.get(&bit).cloned().unwrap_or_else(|| format!("n{bit}"))
                }
                None => "NC".to_owned(),
            };
            line.push(' ');
            line.push_str(&net);
        }
        line.push(' ');
        line.push_str(&model);
        for (param, value) in resolve_cell_parameters(&mapped, &cell.parameters, library) {
            line.push(' ');
            line.push_str(&format!("{param}={value}"));
        }
        generated.instances.push(line);
    }

    if !generated.unmapped.is_empty() {
        let total: usize = generated.unmapped.values().sum();
        let summary: Vec<String> =
            generated.unmapped.iter().map(|(kind, count)| format!("{kind}({count})")).collect();
        error!("failed to map {} cells to library cells: {}", total, summary.join(", "));
    }
    generated
}

/// The comment banner at the top of every generated file.
pub fn create_header(top_module: &str, source: &str, library: &CellLibrary) -> Vec<String> {
    vec![
        "* SPICE netlist generated by gate2spice".to_owned(),
        format!("* Source: {source}"),
        format!("* Top module: {top_module}"),
        format!("* Technology: {}", library.technology),
        "*".to_owned(),
    ]
}

/// Generates the netlist sections for a module. Ending up with zero
/// instances is fatal, whether the module was empty or nothing mapped.
pub fn generate_netlist(
    module: &Module,
    library: &CellLibrary,
    source: &str,
) -> Result<SpiceNetlist, EmitError> {
    let generated = generate_instances(module, library);
    if generated.instances.is_empty() {
        return Err(EmitError::NoInstances { module: module.name.clone() });
    }
    Ok(SpiceNetlist {
        top_module: module.name.clone(),
        header: create_header(&module.name, source, library),
        instances: generated.instances,
        directives: vec![".END".to_owned()],
    })
}

/// Renders the netlist flat, at the requested level. At logic level the
/// library's SPICE text is embedded so the cell subcircuits resolve; at
/// transistor level the calls are expanded instead and the referenced
/// `.MODEL` cards are replayed.
pub fn format_flattened(
    netlist: &SpiceNetlist,
    library: &CellLibrary,
    level: OutputLevel,
) -> Result<String, EmitError> {
    let mut lines = netlist.header.clone();

    match level {
        OutputLevel::Logic => {
            if let Some(path) = &library.spice_file {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| ExpandError::Io(path.clone(), e))?;
                lines.push("* Cell library".to_owned());
                lines.extend(text.lines().map(str::to_owned));
                lines.push("*".to_owned());
            } else {
                warn!("cell library has no SPICE file; emitted subcircuits are unresolved");
            }
            lines.push(format!("* Module: {}", netlist.top_module));
            lines.extend(netlist.instances.iter().cloned());
        }
        OutputLevel::Transistor => {
            let path = library.spice_file.as_ref().ok_or(ExpandError::NoSpiceFile)?;
            let text =
                std::fs::read_to_string(path).map_err(|e| ExpandError::Io(path.clone(), e))?;
            let mut expander = Expander::new(crate::subckt::parse_subcircuits(&text));
            let expanded = expander.expand(&netlist.instances);

            // Replay only the .MODEL cards the expanded transistors reference.
            let referenced: std::collections::HashSet<&str> = expanded
                .iter()
                .filter(|line| matches!(line.chars().next(), Some('M' | 'm')))
                .filter_map(|line| line.split_whitespace().nth(5))
                .collect();
            let models = extract_models(&text);
            let models: Vec<&String> =
                models.iter().filter(|(name, _)| referenced.contains(name.as_str())).map(|(_, card)| card).collect();
            if !models.is_empty() {
                lines.push("* Device models".to_owned());
                lines.extend(models.into_iter().cloned());
                lines.push("*".to_owned());
            }
            lines.push(format!("* Module: {} (transistor level)", netlist.top_module));
            lines.extend(expanded);
        }
    }

    lines.extend(netlist.directives.iter().cloned());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

/// Renders the netlist with the module wrapped in its own `.SUBCKT`, for
/// inclusion into a larger deck. The library file is referenced with
/// `.INCLUDE` instead of being embedded.
pub fn format_hierarchical(netlist: &SpiceNetlist, module: &Module, library: &CellLibrary) -> String {
    let mut lines = netlist.header.clone();
    if let Some(path) = &library.spice_file {
        lines.push(format!(".INCLUDE {}", path.display()));
    }
    let signal_names = module.signal_names();
    let mut ports = Vec::new();
    for (port_name, port) in &module.ports {
        let clean = port_name.strip_prefix('\\').unwrap_or(port_name);
        if let [bit] = port.bits[..] {
            ports.push(signal_names.get(&bit).cloned().unwrap_or_else(|| clean.to_owned()));
        } else {
            for (index, &bit) in port.bits.iter().enumerate() {
                ports.push(signal_names.get(&bit).cloned().unwrap_or_else(|| format!("{clean}[{index}]")));
            }
        }
    }
    lines.push(format!(".SUBCKT {} {}", netlist.top_module, ports.join(" ")));
    lines.extend(netlist.instances.iter().cloned());
    lines.push(format!(".ENDS {}", netlist.top_module));
    lines.extend(netlist.directives.iter().cloned());
    lines.push(String::new());
    lines.join("\n")
}

/// A quick sanity check over formatted output: it must contain at least one
/// subcircuit definition or instance line.
pub fn validate(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    text.lines().map(str::trim).any(|line| {
        line.get(..7).is_some_and(|keyword| keyword.eq_ignore_ascii_case(".subckt"))
            || matches!(line.chars().next(), Some('M' | 'm' | 'X' | 'x'))
    })
}
