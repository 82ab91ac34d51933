use std::borrow::Cow;

use indexmap::IndexMap;

use crate::PortDirection;

/// A synthesizer-internal gate primitive, as encoded in cell type tags like
/// `$_AND_` or `$_DFFE_P_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
    AndNot,
    OrNot,
    Not,
    Buf,
    Mux,
    Dff,
    Dffe,
    DffN,
    DffP,
    DffeN,
    DffeP,
    Dffsr,
    Dffsre,
}

impl Primitive {
    pub fn from_type_name(name: &str) -> Option<Primitive> {
        Some(match name {
            "$_AND_" => Primitive::And,
            "$_NAND_" => Primitive::Nand,
            "$_OR_" => Primitive::Or,
            "$_NOR_" => Primitive::Nor,
            "$_XOR_" => Primitive::Xor,
            "$_XNOR_" => Primitive::Xnor,
            "$_ANDNOT_" => Primitive::AndNot,
            "$_ORNOT_" => Primitive::OrNot,
            "$_NOT_" => Primitive::Not,
            "$_BUF_" => Primitive::Buf,
            "$_MUX_" => Primitive::Mux,
            "$_DFF_" => Primitive::Dff,
            "$_DFFE_" => Primitive::Dffe,
            "$_DFF_N_" => Primitive::DffN,
            "$_DFF_P_" => Primitive::DffP,
            "$_DFFE_N_" => Primitive::DffeN,
            "$_DFFE_P_" => Primitive::DffeP,
            "$_DFFSR_" => Primitive::Dffsr,
            "$_DFFSRE_" => Primitive::Dffsre,
            _ => return None,
        })
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Primitive::And => "$_AND_",
            Primitive::Nand => "$_NAND_",
            Primitive::Or => "$_OR_",
            Primitive::Nor => "$_NOR_",
            Primitive::Xor => "$_XOR_",
            Primitive::Xnor => "$_XNOR_",
            Primitive::AndNot => "$_ANDNOT_",
            Primitive::OrNot => "$_ORNOT_",
            Primitive::Not => "$_NOT_",
            Primitive::Buf => "$_BUF_",
            Primitive::Mux => "$_MUX_",
            Primitive::Dff => "$_DFF_",
            Primitive::Dffe => "$_DFFE_",
            Primitive::DffN => "$_DFF_N_",
            Primitive::DffP => "$_DFF_P_",
            Primitive::DffeN => "$_DFFE_N_",
            Primitive::DffeP => "$_DFFE_P_",
            Primitive::Dffsr => "$_DFFSR_",
            Primitive::Dffsre => "$_DFFSRE_",
        }
    }

    /// The canonical library cell this primitive maps onto. The flip-flop
    /// variants collapse to the `DFF` family, the set/reset ones to `DFFR`.
    pub fn cell_base(self) -> &'static str {
        match self {
            Primitive::And | Primitive::AndNot => "AND2",
            Primitive::Nand => "NAND2",
            Primitive::Or | Primitive::OrNot => "OR2",
            Primitive::Nor => "NOR2",
            Primitive::Xor => "XOR2",
            Primitive::Xnor => "XNOR2",
            Primitive::Not => "INV",
            Primitive::Buf => "BUF",
            Primitive::Mux => "MUX2",
            Primitive::Dff | Primitive::Dffe => "DFF",
            Primitive::DffN | Primitive::DffP => "DFF",
            Primitive::DffeN | Primitive::DffeP => "DFF",
            Primitive::Dffsr | Primitive::Dffsre => "DFFR",
        }
    }

    pub fn inputs(self) -> &'static [&'static str] {
        match self {
            Primitive::And
            | Primitive::Nand
            | Primitive::Or
            | Primitive::Nor
            | Primitive::Xor
            | Primitive::Xnor
            | Primitive::AndNot
            | Primitive::OrNot => &["A", "B"],
            Primitive::Not | Primitive::Buf => &["A"],
            Primitive::Mux => &["A", "B", "S"],
            Primitive::Dff | Primitive::DffN | Primitive::DffP => &["C", "D"],
            Primitive::Dffe | Primitive::DffeN | Primitive::DffeP => &["C", "D", "E"],
            Primitive::Dffsr => &["C", "D", "R", "S"],
            Primitive::Dffsre => &["C", "D", "E", "R", "S"],
        }
    }

    pub fn output(self) -> &'static str {
        match self {
            Primitive::Dff
            | Primitive::Dffe
            | Primitive::DffN
            | Primitive::DffP
            | Primitive::DffeN
            | Primitive::DffeP
            | Primitive::Dffsr
            | Primitive::Dffsre => "Q",
            _ => "Y",
        }
    }

    /// True for gates with exactly the `A`, `B` input pair and a `Y` output.
    pub fn two_input(self) -> bool {
        matches!(
            self,
            Primitive::And
                | Primitive::Nand
                | Primitive::Or
                | Primitive::Nor
                | Primitive::Xor
                | Primitive::Xnor
                | Primitive::AndNot
                | Primitive::OrNot
        )
    }

    pub fn assoc(self) -> Option<AssocGate> {
        match self {
            Primitive::And => Some(AssocGate::And),
            Primitive::Or => Some(AssocGate::Or),
            Primitive::Nand => Some(AssocGate::Nand),
            Primitive::Nor => Some(AssocGate::Nor),
            _ => None,
        }
    }
}

/// One of the 2-input gate types eligible for chain collapsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssocGate {
    And,
    Or,
    Nand,
    Nor,
}

impl AssocGate {
    pub fn base_name(self) -> &'static str {
        match self {
            AssocGate::And => "AND",
            AssocGate::Or => "OR",
            AssocGate::Nand => "NAND",
            AssocGate::Nor => "NOR",
        }
    }

    pub fn primitive(self) -> Primitive {
        match self {
            AssocGate::And => Primitive::And,
            AssocGate::Or => Primitive::Or,
            AssocGate::Nand => Primitive::Nand,
            AssocGate::Nor => Primitive::Nor,
        }
    }
}

/// The type tag of a cell instance.
///
/// Synthesizer output only ever contains `Primitive` and `Other` kinds; the
/// adder and chain rewriting passes introduce the remaining variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKind {
    Primitive(Primitive),
    HalfAdder,
    FullAdder,
    WideGate { base: AssocGate, width: usize },
    Other(String),
}

impl CellKind {
    pub fn parse(name: &str) -> CellKind {
        if let Some(prim) = Primitive::from_type_name(name) {
            return CellKind::Primitive(prim);
        }
        match name {
            "HA" => CellKind::HalfAdder,
            "FA" => CellKind::FullAdder,
            _ => CellKind::Other(name.to_owned()),
        }
    }

    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            CellKind::Primitive(prim) => Cow::Borrowed(prim.type_name()),
            CellKind::HalfAdder => Cow::Borrowed("HA"),
            CellKind::FullAdder => Cow::Borrowed("FA"),
            CellKind::WideGate { base, width } => Cow::Owned(format!("{}{}", base.base_name(), width)),
            CellKind::Other(name) => Cow::Borrowed(name),
        }
    }
}

/// An instance of a gate or subcircuit inside a [`Module`].
///
/// [`Module`]: crate::Module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    /// Pin name to connected signal ids; single-bit pins use a one-element
    /// list.
    pub connections: IndexMap<String, Vec<u32>>,
    /// Pin directions as reported by the synthesizer. May be empty; pin roles
    /// of primitives are known regardless.
    pub port_directions: IndexMap<String, PortDirection>,
    /// Instance parameter values as reported by the synthesizer.
    pub parameters: IndexMap<String, String>,
}

impl Cell {
    pub fn new(kind: CellKind) -> Cell {
        Cell {
            kind,
            connections: IndexMap::new(),
            port_directions: IndexMap::new(),
            parameters: IndexMap::new(),
        }
    }

    pub fn with_pin(mut self, pin: &str, bits: &[u32]) -> Cell {
        self.connections.insert(pin.to_owned(), bits.to_vec());
        self
    }

    pub fn pin(&self, name: &str) -> Option<&[u32]> {
        self.connections.get(name).map(|bits| bits.as_slice())
    }

    fn pin_is_output(&self, pin: &str) -> bool {
        match &self.kind {
            CellKind::Primitive(prim) => pin == prim.output(),
            CellKind::HalfAdder | CellKind::FullAdder => pin == "SUM" || pin == "CARRY",
            CellKind::WideGate { .. } => pin == "Y",
            CellKind::Other(_) => {
                matches!(self.port_directions.get(pin), Some(PortDirection::Output))
            }
        }
    }

    /// Pins that consume their nets. Pins of unknown direction count as
    /// inputs so that fanout queries stay conservative.
    pub fn input_pins(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.connections
            .iter()
            .filter(|(pin, _)| !self.pin_is_output(pin))
            .map(|(pin, bits)| (pin.as_str(), bits.as_slice()))
    }

    pub fn output_signals(&self) -> impl Iterator<Item = u32> + '_ {
        self.connections
            .iter()
            .filter(|(pin, _)| self.pin_is_output(pin))
            .flat_map(|(_, bits)| bits.iter().copied())
    }

    /// The single output signal of this cell, if it has exactly one.
    pub fn single_output(&self) -> Option<u32> {
        let mut outputs = self.output_signals();
        let first = outputs.next()?;
        match outputs.next() {
            None => Some(first),
            Some(_) => None,
        }
    }

    /// The ordered `(A, B)` operand pair of a 2-input boolean primitive.
    pub fn two_input_operands(&self) -> Option<(u32, u32)> {
        let CellKind::Primitive(prim) = &self.kind else { return None };
        if !prim.two_input() {
            return None;
        }
        match (self.pin("A"), self.pin("B")) {
            (Some(&[a]), Some(&[b])) => Some((a, b)),
            _ => None,
        }
    }
}
