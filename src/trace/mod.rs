//! Textual traces of a compiled program. Indentation is one space per level
//! of tree depth.

use crate::anf::Anf;
use crate::ir::{NodeId, Tree};
use crate::registers::Allocation;

fn indent(tree: &Tree, id: NodeId) -> String {
    " ".repeat(tree.depth(id))
}

/// One line per node in pre-order, the root excluded.
pub fn walk(tree: &Tree) -> Vec<String> {
    tree.pre_order()
        .into_iter()
        .filter(|&id| id != tree.root())
        .map(|id| {
            format!(
                "{} {} <- {} {}",
                indent(tree, id),
                tree.label(id),
                tree.node(id).name(),
                tree.describe(id)
            )
        })
        .collect()
}

/// One line per entry in evaluation order with its resolved dependencies.
pub fn anf(tree: &Tree, anf: &Anf) -> Vec<String> {
    anf.iter()
        .map(|entry| {
            let dependencies = tree
                .node(entry.node)
                .dependencies()
                .iter()
                .map(|&dependency| tree.label(dependency))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{} {} <- {}, [{}]",
                indent(tree, entry.node),
                entry.temp,
                tree.describe(entry.node),
                dependencies
            )
        })
        .collect()
}

pub fn allocation(tree: &Tree, allocation: &Allocation) -> Vec<String> {
    allocation
        .iter()
        .map(|(id, location)| format!("{} {} -> {}", tree.label(id), tree.describe(id), location))
        .collect()
}
