//! A-normal form: the evaluation order every later pass indexes into.

use std::collections::HashMap;
use std::iter::FusedIterator;

use crate::error::Error;
use crate::ir::{NodeId, TempId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnfEntry {
    pub temp: TempId,
    pub node: NodeId,
}

/// Lazy post-order walk over a named tree. The synthetic root produces no
/// entry.
pub struct Linearize<'t> {
    tree: &'t Tree,
    stack: Vec<(NodeId, usize)>,
}

pub fn linearize(tree: &Tree) -> Result<Linearize<'_>, Error> {
    if !tree.is_named() {
        return Err(Error::NotNamed);
    }
    Ok(Linearize {
        tree,
        stack: vec![(tree.root(), 0)],
    })
}

impl Iterator for Linearize<'_> {
    type Item = AnfEntry;

    fn next(&mut self) -> Option<AnfEntry> {
        loop {
            let (id, cursor) = self.stack.last_mut()?;
            let node = self.tree.node(*id);
            if let Some(&child) = node.children().get(*cursor) {
                *cursor += 1;
                self.stack.push((child, 0));
                continue;
            }
            let id = *id;
            self.stack.pop();
            if id == self.tree.root() {
                return None;
            }
            return Some(AnfEntry {
                temp: node.temp()?,
                node: id,
            });
        }
    }
}

impl FusedIterator for Linearize<'_> {}

/// Collected linear order with a reverse index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Anf {
    entries: Vec<AnfEntry>,
    positions: HashMap<NodeId, usize>,
}

impl Anf {
    pub fn new(tree: &Tree) -> Result<Self, Error> {
        let entries: Vec<AnfEntry> = linearize(tree)?.collect();
        let positions = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.node, index))
            .collect();
        log::debug!("linearized {} entries", entries.len());
        Ok(Self { entries, positions })
    }

    pub fn entries(&self) -> &[AnfEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnfEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of `node` in evaluation order.
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.positions.get(&node).copied()
    }
}
