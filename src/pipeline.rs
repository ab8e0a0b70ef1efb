//! End to end compilation of an instruction tree.

use std::path::Path;

use clap::ValueEnum;

use crate::anf::Anf;
use crate::error::Error;
use crate::export::{GraphDescription, GraphRenderer};
use crate::ir::{DuplicatePolicy, SymbolTable, Tree, assign_temp_ids, resolve_dependencies};
use crate::liveness::{LiveRanges, compute_live_ranges};
use crate::registers::{
    Allocation, Chaitin, InterferenceGraph, LinearScan, Palette, RegisterAllocator,
};
use crate::trace;
use crate::verification::{self, Execution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AllocatorKind {
    #[default]
    Chaitin,
    LinearScan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub palette: Palette,
    pub allocator: AllocatorKind,
    pub duplicates: DuplicatePolicy,
    pub avoid_ancestor_registers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            allocator: AllocatorKind::Chaitin,
            duplicates: DuplicatePolicy::Shadow,
            avoid_ancestor_registers: true,
        }
    }
}

impl Config {
    pub fn allocator(&self) -> Box<dyn RegisterAllocator> {
        match self.allocator {
            AllocatorKind::Chaitin => Box::new(
                Chaitin::new(self.palette.clone())
                    .avoid_ancestor_registers(self.avoid_ancestor_registers),
            ),
            AllocatorKind::LinearScan => Box::new(LinearScan::new(self.palette.clone())),
        }
    }
}

/// Everything the pipeline derived from one tree.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub tree: Tree,
    pub symbols: SymbolTable,
    pub anf: Anf,
    pub ranges: LiveRanges,
    pub graph: InterferenceGraph,
    pub allocation: Allocation,
    pub palette: Palette,
}

pub fn compile(mut tree: Tree, config: &Config) -> Result<Compilation, Error> {
    let symbols = SymbolTable::index(&tree, config.duplicates)?;
    resolve_dependencies(&mut tree, &symbols)?;
    assign_temp_ids(&mut tree)?;

    let anf = Anf::new(&tree)?;
    let ranges = compute_live_ranges(&tree, &anf);
    let mut graph = InterferenceGraph::build(&ranges);

    let allocator = config.allocator();
    log::debug!("allocating with {}", allocator.name());
    let allocation = allocator.allocate(&mut graph, &tree.pins())?;
    tree.apply_allocation(&allocation);

    Ok(Compilation {
        tree,
        symbols,
        anf,
        ranges,
        graph,
        allocation,
        palette: config.palette.clone(),
    })
}

impl Compilation {
    pub fn allocation_lines(&self) -> Vec<String> {
        trace::allocation(&self.tree, &self.allocation)
    }

    pub fn trace_lines(&self) -> Vec<String> {
        let mut lines = trace::walk(&self.tree);
        lines.extend(trace::anf(&self.tree, &self.anf));
        lines
    }

    pub fn description(&self) -> GraphDescription {
        GraphDescription::new(&self.tree, &self.graph, Some(&self.allocation), &self.palette)
    }

    pub fn render(&self, renderer: &dyn GraphRenderer, output: &Path) -> Result<(), Error> {
        renderer.render(&self.description(), output)
    }

    /// Runs the program through its own allocation.
    pub fn execute(&self) -> Result<Execution, Error> {
        verification::execute(&self.tree, &self.anf, Some(&self.allocation))
    }

    pub fn spill_count(&self) -> usize {
        self.allocation.spill_count()
    }
}
