use crate::anf::Anf;
use crate::ir::{
    DuplicatePolicy, NodeId, SymbolTable, TempId, Tree, assign_temp_ids, resolve_dependencies,
};
use crate::liveness::{LiveRanges, compute_live_ranges};
use crate::registers::{InterferenceGraph, Palette};

pub use crate::demos::{pressure, scenario};

// Runs the front half of the pipeline on a freshly built tree.
pub fn prepare(mut tree: Tree) -> (Tree, Anf, LiveRanges) {
    let table = SymbolTable::index(&tree, DuplicatePolicy::Shadow).unwrap();
    resolve_dependencies(&mut tree, &table).unwrap();
    assign_temp_ids(&mut tree).unwrap();
    let anf = Anf::new(&tree).unwrap();
    let ranges = compute_live_ranges(&tree, &anf);
    (tree, anf, ranges)
}

pub fn graph_of(tree: Tree) -> (Tree, InterferenceGraph) {
    let (tree, _anf, ranges) = prepare(tree);
    (tree, InterferenceGraph::build(&ranges))
}

/// Node carrying temp `t{temp}`.
pub fn value(tree: &Tree, temp: u32) -> NodeId {
    tree.pre_order()
        .into_iter()
        .find(|&id| tree.temp(id) == Some(TempId(temp)))
        .unwrap_or_else(|| panic!("no node named t{temp}"))
}

pub fn palette(registers: &[&str]) -> Palette {
    Palette::new(registers.iter().copied()).unwrap()
}
