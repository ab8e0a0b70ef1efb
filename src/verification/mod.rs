//! Straight-line interpreter used to check allocations.
//!
//! Without an allocation every value lives in its own slot. With one, values
//! are written to the register or spill slot they were given and every read
//! checks that the register still holds the value it expects.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::anf::Anf;
use crate::error::Error;
use crate::ir::{Kind, NodeId, TempId, Tree};
use crate::registers::{Allocation, Location};

const SPILL_COST: u64 = 3;
const PRINT_COST: u64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    pub output: Vec<i64>,
    pub cycles: u64,
}

struct Vm<'a> {
    tree: &'a Tree,
    allocation: Option<&'a Allocation>,
    slots: HashMap<NodeId, i64>,
    registers: IndexMap<String, (NodeId, i64)>,
    memory: HashMap<NodeId, i64>,
    output: Vec<i64>,
    total_cycles: u64,
}

impl<'a> Vm<'a> {
    fn new(tree: &'a Tree, allocation: Option<&'a Allocation>) -> Self {
        Vm {
            tree,
            allocation,
            slots: HashMap::new(),
            registers: IndexMap::new(),
            memory: HashMap::new(),
            output: Vec::new(),
            total_cycles: 0,
        }
    }

    fn temp(&self, value: NodeId) -> TempId {
        self.tree.temp(value).unwrap_or(TempId(0))
    }

    fn read(&mut self, value: NodeId) -> Result<i64, Error> {
        let Some(allocation) = self.allocation else {
            return self
                .slots
                .get(&value)
                .copied()
                .ok_or(Error::Uninitialized(self.temp(value)));
        };

        match allocation.location(value) {
            Some(Location::Register(register)) => match self.registers.get(register) {
                Some(&(holder, contents)) if holder == value => Ok(contents),
                Some(&(holder, _)) => Err(Error::Clobbered {
                    value: self.temp(value),
                    register: register.clone(),
                    holder: self.temp(holder),
                }),
                None => Err(Error::Uninitialized(self.temp(value))),
            },
            Some(Location::Spill) | None => {
                let contents = self
                    .memory
                    .get(&value)
                    .copied()
                    .ok_or(Error::Uninitialized(self.temp(value)))?;
                self.total_cycles += SPILL_COST;
                Ok(contents)
            }
        }
    }

    fn write(&mut self, value: NodeId, contents: i64) {
        let Some(allocation) = self.allocation else {
            self.slots.insert(value, contents);
            return;
        };

        match allocation.location(value) {
            Some(Location::Register(register)) => {
                self.registers.insert(register.clone(), (value, contents));
            }
            Some(Location::Spill) | None => {
                self.memory.insert(value, contents);
                self.total_cycles += SPILL_COST;
            }
        }
    }

    fn step(&mut self, value: NodeId) -> Result<(), Error> {
        let tree = self.tree;
        let node = tree.node(value);

        // Operands are read before the result is written.
        let mut operands = Vec::with_capacity(node.dependencies().len());
        for &dependency in node.dependencies() {
            operands.push(self.read(dependency)?);
        }
        let first = operands.first().copied().unwrap_or(0);

        let (result, cycles) = match node.kind() {
            Kind::Program => (0, 0),
            Kind::Literal(literal) => (*literal, 1),
            Kind::Reference(_) | Kind::Assign => (first, 1),
            Kind::Add => (operands.iter().fold(0i64, |acc, x| acc.wrapping_add(*x)), 1),
            Kind::Sub => {
                let rest = operands.iter().skip(1);
                (rest.fold(first, |acc, x| acc.wrapping_sub(*x)), 1)
            }
            Kind::Mul => (operands.iter().fold(1i64, |acc, x| acc.wrapping_mul(*x)), 1),
            Kind::Print => {
                self.output.push(first);
                (first, PRINT_COST)
            }
        };

        self.total_cycles += cycles;
        self.write(value, result);
        Ok(())
    }

    fn run(mut self, anf: &Anf) -> Result<Execution, Error> {
        for entry in anf.iter() {
            self.step(entry.node)?;
        }
        log::debug!(
            "executed {} entries in {} cycles",
            anf.len(),
            self.total_cycles
        );
        Ok(Execution {
            output: self.output,
            cycles: self.total_cycles,
        })
    }
}

/// Runs the program in ANF order, optionally through `allocation`.
pub fn execute(tree: &Tree, anf: &Anf, allocation: Option<&Allocation>) -> Result<Execution, Error> {
    Vm::new(tree, allocation).run(anf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Ins;
    use crate::registers::{Chaitin, InterferenceGraph, LinearScan, RegisterAllocator};
    use crate::test_helpers::{palette, prepare, pressure, scenario};

    #[test]
    fn test_unallocated_run() {
        let (tree, anf, _ranges) = prepare(scenario());
        let execution = execute(&tree, &anf, None).unwrap();
        assert_eq!(execution.output, vec![23]);
        // 11 single-cycle entries and one print.
        assert_eq!(execution.cycles, 21);
    }

    #[test]
    fn test_arithmetic() {
        let (tree, anf, _ranges) = prepare(Tree::new([
            Ins::print(Ins::sub([Ins::literal(10), Ins::literal(3), Ins::literal(2)])),
            Ins::print(Ins::mul([Ins::literal(4), Ins::literal(-5)])),
            Ins::print(Ins::add(Vec::new())),
            Ins::print(Ins::mul(Vec::new())),
            Ins::print(Ins::add([Ins::literal(i64::MAX), Ins::literal(1)])),
        ]));
        let execution = execute(&tree, &anf, None).unwrap();
        assert_eq!(execution.output, vec![5, -20, 0, 1, i64::MIN]);
    }

    #[test]
    fn test_chaitin_allocation_runs_clean() {
        let (tree, anf, ranges) = prepare(scenario());
        let mut graph = InterferenceGraph::build(&ranges);
        let allocation = Chaitin::new(palette(&["r0", "r1"]))
            .allocate(&mut graph, &tree.pins())
            .unwrap();
        let execution = execute(&tree, &anf, Some(&allocation)).unwrap();
        assert_eq!(execution.output, vec![23]);
    }

    #[test]
    fn test_spills_cost_cycles() {
        let (tree, anf, ranges) = prepare(pressure());
        let mut graph = InterferenceGraph::build(&ranges);
        let allocation = Chaitin::new(palette(&["r0", "r1", "r2"]))
            .allocate(&mut graph, &tree.pins())
            .unwrap();
        let execution = execute(&tree, &anf, Some(&allocation)).unwrap();
        assert_eq!(execution.output, vec![15]);
        // Six single-cycle entries, one print, two spilled values stored and
        // loaded once each.
        assert_eq!(execution.cycles, 6 + 10 + 2 * 2 * 3);
    }

    #[test]
    fn test_linear_scan_allocation_runs_clean() {
        let (tree, anf, ranges) = prepare(pressure());
        let mut graph = InterferenceGraph::build(&ranges);
        let allocation = LinearScan::new(palette(&["r0", "r1"]))
            .allocate(&mut graph, &tree.pins())
            .unwrap();
        let execution = execute(&tree, &anf, Some(&allocation)).unwrap();
        assert_eq!(execution.output, vec![15]);
    }

    #[test]
    fn test_detects_clobbered_register() {
        let (tree, anf, ranges) = prepare(scenario());
        // Everything in one register: `a` is overwritten long before its use.
        let locations = ranges
            .iter()
            .map(|interval| (interval.value, Location::Register("r0".to_string())))
            .collect();
        let allocation = Allocation::new(locations, Vec::new(), Vec::new());
        let err = execute(&tree, &anf, Some(&allocation)).unwrap_err();
        assert!(matches!(err, Error::Clobbered { ref register, .. } if register == "r0"));
    }

    #[test]
    fn test_forward_reference_reads_uninitialized() {
        let (tree, anf, _ranges) = prepare(Tree::new([
            Ins::print(Ins::reference("late")),
            Ins::assign("late", Ins::literal(1)),
        ]));
        let err = execute(&tree, &anf, None).unwrap_err();
        assert!(matches!(err, Error::Uninitialized(_)));
    }
}
