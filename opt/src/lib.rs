//! Peephole rewriting of gate-level modules before SPICE instance emission.
//!
//! Two independent passes run in a fixed order: half/full-adder recognition
//! first, then associative gate-chain collapsing, so that collapsing only
//! sees what adder detection did not consume. Both passes are no-ops when the
//! target library lacks the denser cells they would produce.

use gate2spice_netlist::Module;
use gate2spice_techmap::CellLibrary;

mod adders;
mod chains;

pub use adders::detect_adders;
pub use chains::collapse_chains;

pub const DEFAULT_MAX_ARITY: usize = 4;

pub fn rewrite_module(module: &mut Module, library: &CellLibrary, max_arity: usize) {
    detect_adders(module, library);
    collapse_chains(module, library, max_arity);
}
