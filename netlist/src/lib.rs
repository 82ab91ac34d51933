//! This library provides the in-memory form of a gate-level netlist.
//!
//! A [`Design`] is a collection of [`Module`]s as produced by an RTL
//! synthesizer, each a container of ports, [`Cell`]s, and named nets. Nets are
//! identified by small integer signal ids; a cell connects pins to lists of
//! signal ids. The representation is deliberately close to the synthesizer's
//! JSON output so that rewriting passes can reason about fanout and producers
//! without any intermediate lowering.

mod cell;
mod module;
mod design;

pub use cell::{AssocGate, Cell, CellKind, Primitive};
pub use module::{Module, Port, PortDirection};
pub use design::{Design, TopModuleError};
