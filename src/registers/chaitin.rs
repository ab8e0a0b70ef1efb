use std::cmp::Reverse;
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::Error;
use crate::ir::NodeId;

use super::{Allocation, InterferenceGraph, Location, Palette, Pins, RegisterAllocator};

/// Graph coloring in the Chaitin style: simplify onto a stack, then pop and
/// pick registers against the full graph.
#[derive(Debug, Clone)]
pub struct Chaitin {
    palette: Palette,
    avoid_ancestor_registers: bool,
}

impl Chaitin {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            avoid_ancestor_registers: true,
        }
    }

    /// When set, a value prefers registers its users do not already hold.
    pub fn avoid_ancestor_registers(mut self, avoid: bool) -> Self {
        self.avoid_ancestor_registers = avoid;
        self
    }

    // Returns the removal stack and the values pushed while no node had a
    // degree below K.
    fn simplify(&self, graph: &mut InterferenceGraph, pins: &Pins) -> (Vec<NodeId>, Vec<NodeId>) {
        let k = self.palette.len();
        let mut stack = Vec::with_capacity(graph.len());
        let mut potential_spills = Vec::new();

        loop {
            let candidates: Vec<NodeId> = graph.nodes().filter(|id| !pins.contains_key(id)).collect();
            let trivial = candidates.iter().copied().find(|&id| graph.degree(id) < k);
            let next = match trivial {
                Some(id) => id,
                None => {
                    let Some(id) = candidates.iter().copied().min_by_key(|&id| {
                        let uses = graph.interval(id).map_or(0, |i| i.uses.len());
                        (Reverse(graph.degree(id)), uses)
                    }) else {
                        break;
                    };
                    log::debug!(
                        "simplify stalled, pushing {} with degree {} as a potential spill",
                        graph.temp(id).map_or_else(|| id.to_string(), |t| t.to_string()),
                        graph.degree(id)
                    );
                    potential_spills.push(id);
                    id
                }
            };
            graph.remove(next);
            stack.push(next);
        }

        (stack, potential_spills)
    }

    fn select(
        &self,
        graph: &InterferenceGraph,
        mut stack: Vec<NodeId>,
        pins: &Pins,
    ) -> (IndexMap<NodeId, Location>, Vec<(NodeId, Location)>) {
        let mut chosen: IndexMap<NodeId, Location> = pins
            .iter()
            .filter(|(id, _)| graph.contains(**id))
            .map(|(&id, register)| (id, Location::Register(register.clone())))
            .collect();
        let mut selection = Vec::with_capacity(stack.len());

        while let Some(id) = stack.pop() {
            let blocked: HashSet<&str> = graph
                .neighbors(id)
                .filter_map(|neighbor| chosen.get(&neighbor))
                .filter_map(|location| location.register())
                .collect();
            let mut free: Vec<&str> = self
                .palette
                .iter()
                .filter(|register| !blocked.contains(register))
                .collect();

            if self.avoid_ancestor_registers && free.len() > 1 {
                let held: HashSet<&str> = graph
                    .ancestors(id)
                    .filter_map(|user| chosen.get(&user))
                    .filter_map(|location| location.register())
                    .collect();
                let unheld: Vec<&str> = free
                    .iter()
                    .copied()
                    .filter(|register| !held.contains(register))
                    .collect();
                if !unheld.is_empty() {
                    free = unheld;
                }
            }

            let location = match free.first() {
                Some(register) => Location::Register(register.to_string()),
                None => Location::Spill,
            };
            log::trace!(
                "select {} -> {}",
                graph.temp(id).map_or_else(|| id.to_string(), |t| t.to_string()),
                location
            );
            chosen.insert(id, location.clone());
            selection.push((id, location));
        }

        (chosen, selection)
    }
}

impl RegisterAllocator for Chaitin {
    fn allocate(&self, graph: &mut InterferenceGraph, pins: &Pins) -> Result<Allocation, Error> {
        self.palette.check_pins(graph, pins)?;

        let (stack, potential_spills) = {
            let mut scoped = graph.scoped();
            self.simplify(&mut scoped, pins)
        };
        let (chosen, selection) = self.select(graph, stack, pins);

        let locations: IndexMap<NodeId, Location> = graph
            .nodes()
            .map(|id| {
                let location = chosen.get(&id).cloned().unwrap_or(Location::Spill);
                (id, location)
            })
            .collect();

        let allocation = Allocation::new(locations, selection, potential_spills);
        log::info!(
            "chaitin: {} values over {} registers, {} spilled",
            allocation.len(),
            self.palette.len(),
            allocation.spill_count()
        );
        Ok(allocation)
    }

    fn name(&self) -> &'static str {
        "chaitin"
    }
}
