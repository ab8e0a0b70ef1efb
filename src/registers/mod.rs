pub mod chaitin;
pub mod interference;
pub mod linear_scan;

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::error::Error;
use crate::ir::{NodeId, TempId};

pub use chaitin::Chaitin;
pub use interference::{GraphSnapshot, InterferenceGraph, ScopedGraph};
pub use linear_scan::LinearScan;

pub const AVAILABLE_REGS: [&str; 5] = ["rdi", "rsi", "rax", "rdx", "rcx"];

/// Values fixed to a register before allocation.
pub type Pins = IndexMap<NodeId, String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Register(String),
    Spill,
}

impl Location {
    pub fn register(&self) -> Option<&str> {
        match self {
            Location::Register(register) => Some(register),
            Location::Spill => None,
        }
    }

    pub fn is_spill(&self) -> bool {
        matches!(self, Location::Spill)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Register(register) => f.write_str(register),
            Location::Spill => f.write_str("spill"),
        }
    }
}

/// Ordered set of physical registers the allocator may hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<String>);

impl Palette {
    pub fn new<S: Into<String>>(registers: impl IntoIterator<Item = S>) -> Result<Self, Error> {
        let registers: Vec<String> = registers.into_iter().map(Into::into).collect();
        if registers.is_empty() {
            return Err(Error::EmptyPalette);
        }
        let mut seen = HashSet::new();
        for register in &registers {
            if !seen.insert(register.as_str()) {
                return Err(Error::DuplicateRegister(register.clone()));
            }
        }
        Ok(Self(registers))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, register: &str) -> bool {
        self.0.iter().any(|r| r == register)
    }

    pub fn position(&self, register: &str) -> Option<usize> {
        self.0.iter().position(|r| r == register)
    }

    /// Rejects pins outside the palette and interfering values pinned to the
    /// same register.
    pub fn check_pins(&self, graph: &InterferenceGraph, pins: &Pins) -> Result<(), Error> {
        for (&value, register) in pins {
            if !self.contains(register) {
                return Err(Error::UnknownRegister {
                    register: register.clone(),
                    value: graph.temp(value).unwrap_or(TempId(0)),
                });
            }
        }
        for (&first, register) in pins {
            for (&second, other) in pins {
                if first < second && register == other && graph.interferes(first, second) {
                    return Err(Error::PinConflict {
                        register: register.clone(),
                        first: graph.temp(first).unwrap_or(TempId(0)),
                        second: graph.temp(second).unwrap_or(TempId(0)),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(AVAILABLE_REGS.iter().map(|r| r.to_string()).collect())
    }
}

/// Outcome of a register allocation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    locations: IndexMap<NodeId, Location>,
    selection: Vec<(NodeId, Location)>,
    potential_spills: Vec<NodeId>,
}

impl Allocation {
    pub(crate) fn new(
        locations: IndexMap<NodeId, Location>,
        selection: Vec<(NodeId, Location)>,
        potential_spills: Vec<NodeId>,
    ) -> Self {
        Self {
            locations,
            selection,
            potential_spills,
        }
    }

    pub fn location(&self, value: NodeId) -> Option<&Location> {
        self.locations.get(&value)
    }

    pub fn register(&self, value: NodeId) -> Option<&str> {
        self.location(value).and_then(Location::register)
    }

    /// Every value in ANF order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Location)> {
        self.locations.iter().map(|(&id, location)| (id, location))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Decisions in the order the allocator made them. Pinned values are not
    /// listed.
    pub fn selection(&self) -> &[(NodeId, Location)] {
        &self.selection
    }

    /// Values pushed while simplify was stalled.
    pub fn potential_spills(&self) -> &[NodeId] {
        &self.potential_spills
    }

    pub fn spilled(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, location)| location.is_spill())
            .map(|(id, _)| id)
    }

    pub fn spill_count(&self) -> usize {
        self.spilled().count()
    }

    pub fn require_registers(&self, graph: &InterferenceGraph) -> Result<(), Error> {
        let values: Vec<TempId> = self.spilled().filter_map(|id| graph.temp(id)).collect();
        if values.is_empty() {
            Ok(())
        } else {
            Err(Error::SpillRequired { values })
        }
    }
}

pub trait RegisterAllocator {
    /// Assigns a location to every value in `graph`. The graph may be
    /// modified while the allocator runs but is returned unchanged.
    fn allocate(&self, graph: &mut InterferenceGraph, pins: &Pins) -> Result<Allocation, Error>;

    fn name(&self) -> &'static str;
}
