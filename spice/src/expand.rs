//! Recursive lowering of subcircuit calls to transistor instances.
//!
//! Each call site gets its own copy of the subcircuit body. Formal ports are
//! substituted with the caller's nets, internal nets are renamed with the
//! dot-joined instance path as prefix so that two copies of the same body
//! never share a net, and device names are prefixed the same way so they stay
//! unique. Supply nets pass through all levels unrenamed.

use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, warn};

use gate2spice_techmap::CellLibrary;

use crate::subckt::{SubcircuitDefinition, parse_subcircuits};

#[derive(Debug)]
pub enum ExpandError {
    /// The library metadata names no SPICE file, so there are no subcircuit
    /// bodies to expand into.
    NoSpiceFile,
    Io(PathBuf, std::io::Error),
}

impl std::fmt::Display for ExpandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpandError::NoSpiceFile => {
                write!(f, "cell library has no SPICE model file; cannot expand to transistor level")
            }
            ExpandError::Io(path, error) => {
                write!(f, "cannot read SPICE model file {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for ExpandError {}

/// Nets that refer to the same node in every scope and are never renamed.
const GLOBAL_NETS: &[&str] = &["VDD", "VSS", "VCC", "GND", "0"];

fn is_global_net(net: &str) -> bool {
    GLOBAL_NETS.iter().any(|global| global.eq_ignore_ascii_case(net))
}

enum InstanceLine<'a> {
    Transistor { name: &'a str, nets: [&'a str; 4], model: &'a str, params: Vec<&'a str> },
    Call { name: &'a str, nets: Vec<&'a str>, subckt: &'a str, params: Vec<&'a str> },
}

/// Parses one instance line. `M` lines need four terminals and a model name;
/// `X` lines need at least one net before the subcircuit name. Trailing
/// `key=value` tokens are carried through on both.
fn parse_instance_line(line: &str) -> Option<InstanceLine<'_>> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    let name = tokens.first().copied()?;
    let params_at = tokens.iter().position(|token| token.contains('=')).unwrap_or(tokens.len());
    let params = tokens.split_off(params_at);

    match name.chars().next()? {
        'M' | 'm' => {
            let &[_, drain, gate, source, bulk, model] = tokens.as_slice() else { return None };
            Some(InstanceLine::Transistor { name, nets: [drain, gate, source, bulk], model, params })
        }
        'X' | 'x' => {
            let subckt = tokens.pop()?;
            if tokens.len() < 2 {
                return None;
            }
            Some(InstanceLine::Call { name, nets: tokens.split_off(1), subckt, params })
        }
        _ => None,
    }
}

/// Walks instance lines, inlining subcircuit calls until only transistors
/// remain. Owns the no-connect counter so that placeholder nets stay unique
/// across the whole expansion.
pub struct Expander {
    subcircuits: IndexMap<String, SubcircuitDefinition>,
    nc_counter: u32,
}

impl Expander {
    pub fn new(subcircuits: IndexMap<String, SubcircuitDefinition>) -> Expander {
        Expander { subcircuits, nc_counter: 0 }
    }

    /// Reads and parses the subcircuit bodies of the library's SPICE file.
    pub fn from_library(library: &CellLibrary) -> Result<Expander, ExpandError> {
        let path = library.spice_file.as_ref().ok_or(ExpandError::NoSpiceFile)?;
        let text = std::fs::read_to_string(path).map_err(|e| ExpandError::Io(path.clone(), e))?;
        Ok(Expander::new(parse_subcircuits(&text)))
    }

    fn fresh_nc(&mut self) -> String {
        let name = format!("nc_{}", self.nc_counter);
        self.nc_counter += 1;
        name
    }

    /// Expands top-level instance lines. Transistor lines, calls to unknown
    /// subcircuits, and lines that do not parse as instances pass through
    /// untouched; expanding an already transistor-level netlist is the
    /// identity.
    pub fn expand(&mut self, instances: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        for line in instances {
            match parse_instance_line(line) {
                Some(InstanceLine::Call { name, nets, subckt, params: _ }) => {
                    let Some(def) = self.subcircuits.get(subckt).cloned() else {
                        warn!("no subcircuit definition for {}; passing line through: {}", subckt, line);
                        out.push(line.clone());
                        continue;
                    };
                    let path = name[1..].to_owned();
                    let actuals: Vec<String> = nets.iter().map(|net| (*net).to_owned()).collect();
                    self.expand_call(&path, &actuals, &def, &mut out);
                }
                Some(InstanceLine::Transistor { .. }) => out.push(line.clone()),
                None => {
                    warn!("passing unrecognized instance line through: {:?}", line);
                    out.push(line.clone());
                }
            }
        }
        out
    }

    /// Inlines one call site. `path` is the accumulated instance path used to
    /// prefix internal nets and device names. Path segments are joined with
    /// `.`, which generated instance names cannot contain, so distinct
    /// hierarchies never produce the same prefixed name.
    fn expand_call(&mut self, path: &str, actuals: &[String], def: &SubcircuitDefinition, out: &mut Vec<String>) {
        if actuals.len() > def.ports.len() {
            warn!(
                "instance {} connects {} nets but subcircuit {} has {} ports",
                path,
                actuals.len(),
                def.name,
                def.ports.len()
            );
        }
        let mut port_map: IndexMap<&str, String> = IndexMap::new();
        for (at, formal) in def.ports.iter().enumerate() {
            let actual = match actuals.get(at) {
                Some(actual) => actual.clone(),
                None => {
                    let nc = self.fresh_nc();
                    warn!("port {} of {} unconnected at {}; binding to {}", formal, def.name, path, nc);
                    nc
                }
            };
            port_map.insert(formal.as_str(), actual);
        }
        debug!("expanding {} as {}", def.name, path);

        let map_net = |net: &str| -> String {
            if let Some(actual) = port_map.get(net) {
                actual.clone()
            } else if is_global_net(net) {
                net.to_owned()
            } else {
                format!("{path}.{net}")
            }
        };

        for line in &def.instances {
            match parse_instance_line(line) {
                Some(InstanceLine::Transistor { name, nets, model, params }) => {
                    let mut rendered = format!(
                        "M{}.{} {} {} {} {} {}",
                        path,
                        &name[1..],
                        map_net(nets[0]),
                        map_net(nets[1]),
                        map_net(nets[2]),
                        map_net(nets[3]),
                        model
                    );
                    for param in params {
                        rendered.push(' ');
                        rendered.push_str(param);
                    }
                    out.push(rendered);
                }
                Some(InstanceLine::Call { name, nets, subckt, params }) => {
                    let nested_path = format!("{}.{}", path, &name[1..]);
                    let actuals: Vec<String> = nets.iter().map(|net| map_net(net)).collect();
                    let Some(def) = self.subcircuits.get(subckt).cloned() else {
                        warn!("no subcircuit definition for {} inside {}; passing call through", subckt, path);
                        let mut rendered = format!("X{} {} {}", nested_path, actuals.join(" "), subckt);
                        for param in params {
                            rendered.push(' ');
                            rendered.push_str(param);
                        }
                        out.push(rendered);
                        continue;
                    };
                    self.expand_call(&nested_path, &actuals, &def, out);
                }
                None => {
                    warn!("skipping unparseable line in subcircuit {}: {:?}", def.name, line);
                }
            }
        }
    }
}

/// Replaces every subcircuit call among `instances` with the transistors of
/// its body, recursively, using the library's SPICE file for definitions.
pub fn expand_to_transistor_level(
    instances: &[String],
    library: &CellLibrary,
) -> Result<Vec<String>, ExpandError> {
    let mut expander = Expander::from_library(library)?;
    Ok(expander.expand(instances))
}
