//! SPICE side of the pipeline: parsing a technology library's subcircuit
//! bodies, lowering cell instances to transistor instances, and rendering the
//! final netlist text.

mod subckt;
mod expand;
mod emit;

pub use subckt::{SubcircuitDefinition, extract_models, is_instance_line, parse_subckt_header, parse_subcircuits};
pub use expand::{ExpandError, Expander, expand_to_transistor_level};
pub use emit::{
    EmitError, GeneratedInstances, OutputLevel, SpiceNetlist, create_header, format_flattened,
    format_hierarchical, generate_instances, generate_netlist, validate,
};
