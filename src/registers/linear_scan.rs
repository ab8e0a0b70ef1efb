use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::Error;
use crate::ir::NodeId;
use crate::liveness::LiveInterval;

use super::{Allocation, InterferenceGraph, Location, Palette, Pins, RegisterAllocator};

/// Single pass over intervals sorted by start point. Cheaper than coloring
/// and usually worse.
#[derive(Debug, Clone)]
pub struct LinearScan {
    palette: Palette,
}

impl LinearScan {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

struct Active<'g> {
    interval: &'g LiveInterval,
    register: String,
}

impl RegisterAllocator for LinearScan {
    fn allocate(&self, graph: &mut InterferenceGraph, pins: &Pins) -> Result<Allocation, Error> {
        self.palette.check_pins(graph, pins)?;
        let graph = &*graph;

        let mut locations: IndexMap<NodeId, Location> = IndexMap::new();
        let mut selection = Vec::new();

        // Intervals are already in definition order; the sort only matters for
        // forward references, which start before they are defined.
        let mut pending: Vec<&LiveInterval> = graph
            .nodes()
            .filter(|id| !pins.contains_key(id))
            .filter_map(|id| graph.interval(id))
            .collect();
        pending.sort_by_key(|interval| interval.start);

        let mut active: Vec<Active> = Vec::new();
        for current in pending {
            active.retain(|a| a.interval.span_end() > current.start);

            let pinned: HashSet<&str> = graph
                .neighbors(current.value)
                .filter_map(|neighbor| pins.get(&neighbor))
                .map(String::as_str)
                .collect();
            let blocked: HashSet<&str> = active
                .iter()
                .map(|a| a.register.as_str())
                .chain(pinned.iter().copied())
                .collect();

            if let Some(register) = self.palette.iter().find(|r| !blocked.contains(r)) {
                let register = register.to_string();
                selection.push((current.value, Location::Register(register.clone())));
                locations.insert(current.value, Location::Register(register.clone()));
                active.push(Active {
                    interval: current,
                    register,
                });
                continue;
            }

            // Hand the register of the longest-lived active value to the
            // current one if that frees more of the program.
            let victim = active
                .iter()
                .enumerate()
                .filter(|(_, a)| a.interval.end > current.end)
                .filter(|(_, a)| !pinned.contains(a.register.as_str()))
                .max_by_key(|(_, a)| a.interval.end)
                .map(|(index, _)| index);

            match victim {
                Some(index) => {
                    let evicted = active.remove(index);
                    log::debug!(
                        "linear scan: evicting {} from {} for {}",
                        evicted.interval.temp,
                        evicted.register,
                        current.temp
                    );
                    locations.insert(evicted.interval.value, Location::Spill);
                    selection.push((evicted.interval.value, Location::Spill));
                    locations.insert(current.value, Location::Register(evicted.register.clone()));
                    selection.push((current.value, Location::Register(evicted.register.clone())));
                    active.push(Active {
                        interval: current,
                        register: evicted.register,
                    });
                }
                None => {
                    log::debug!("linear scan: spilling {}", current.temp);
                    locations.insert(current.value, Location::Spill);
                    selection.push((current.value, Location::Spill));
                }
            }
        }

        let locations: IndexMap<NodeId, Location> = graph
            .nodes()
            .map(|id| {
                let location = match pins.get(&id) {
                    Some(register) => Location::Register(register.clone()),
                    None => locations.get(&id).cloned().unwrap_or(Location::Spill),
                };
                (id, location)
            })
            .collect();

        let allocation = Allocation::new(locations, selection, Vec::new());
        log::info!(
            "linear scan: {} values over {} registers, {} spilled",
            allocation.len(),
            self.palette.len(),
            allocation.spill_count()
        );
        Ok(allocation)
    }

    fn name(&self) -> &'static str {
        "linear-scan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Ins, Tree};
    use crate::test_helpers::{graph_of, palette, pressure, scenario};

    fn assert_valid(graph: &InterferenceGraph, allocation: &Allocation) {
        for (a, b) in graph.interference_edges() {
            if let (Some(x), Some(y)) = (allocation.register(a), allocation.register(b)) {
                assert_ne!(x, y, "{a} and {b} interfere but share {x}");
            }
        }
    }

    #[test]
    fn test_pressure() {
        let (tree, mut graph) = graph_of(pressure());
        let allocation = LinearScan::new(palette(&["r0", "r1", "r2"]))
            .allocate(&mut graph, &tree.pins())
            .unwrap();

        let got: Vec<_> = allocation
            .iter()
            .map(|(id, location)| (tree.temp(id).unwrap().0, location.to_string()))
            .collect();
        let expected = [
            (3, "r0"),
            (4, "r1"),
            (5, "r2"),
            (6, "spill"),
            (7, "spill"),
            (2, "r0"),
            (1, "r0"),
        ]
        .map(|(t, r)| (t, r.to_string()));
        assert_eq!(got, expected.to_vec());
        assert!(allocation.potential_spills().is_empty());
    }

    #[test]
    fn test_scenario_fits_in_two_registers() {
        let (tree, mut graph) = graph_of(scenario());
        let allocation = LinearScan::new(palette(&["r0", "r1"]))
            .allocate(&mut graph, &tree.pins())
            .unwrap();
        assert_eq!(allocation.spill_count(), 0);
        assert_valid(&graph, &allocation);
    }

    #[test]
    fn test_evicts_longer_interval() {
        // `a` lives across the whole program; the literal inside `b` is short.
        let (tree, mut graph) = graph_of(Tree::new([
            Ins::assign("a", Ins::literal(1)),
            Ins::assign("b", Ins::add([Ins::literal(2), Ins::literal(3)])),
            Ins::print(Ins::add([Ins::reference("a"), Ins::reference("b")])),
        ]));
        let a = tree.assignment("a").unwrap();
        let allocation = LinearScan::new(palette(&["r0", "r1"]))
            .allocate(&mut graph, &tree.pins())
            .unwrap();
        assert_eq!(allocation.location(a), Some(&Location::Spill));
        assert_eq!(allocation.spill_count(), 1);
        assert_valid(&graph, &allocation);
    }

    #[test]
    fn test_respects_pins() {
        let (tree, mut graph) = graph_of(Tree::new([
            Ins::assign("a", Ins::literal(6)).pinned("r0"),
            Ins::assign("b", Ins::literal(7)),
            Ins::print(Ins::add([Ins::reference("a"), Ins::reference("b")])),
        ]));
        let a = tree.assignment("a").unwrap();
        let allocation = LinearScan::new(palette(&["r0", "r1"]))
            .allocate(&mut graph, &tree.pins())
            .unwrap();
        assert_eq!(allocation.register(a), Some("r0"));
        assert_valid(&graph, &allocation);
    }

    #[test]
    fn test_unknown_pin_is_rejected() {
        let (tree, mut graph) = graph_of(Tree::new([Ins::print(Ins::literal(1)).pinned("r7")]));
        let result = LinearScan::new(palette(&["r0"])).allocate(&mut graph, &tree.pins());
        assert!(matches!(result, Err(Error::UnknownRegister { .. })));
    }
}
