//! Interference graph built from live intervals.
//!
//! Nodes keep ANF order so every scan over the graph is deterministic. Besides
//! the symmetric interference relation each node records its `ancestors`:
//! the values that read it directly. Selection uses them only as a tie-break.

use std::ops::{Deref, DerefMut};

use indexmap::{IndexMap, IndexSet};

use crate::ir::{NodeId, TempId};
use crate::liveness::{LiveInterval, LiveRanges};

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub interval: LiveInterval,
    adjacent: IndexSet<NodeId>,
    ancestors: IndexSet<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterferenceGraph {
    nodes: IndexMap<NodeId, GraphNode>,
}

/// Full copy of a graph taken before destructive work.
#[derive(Debug, Clone)]
pub struct GraphSnapshot(IndexMap<NodeId, GraphNode>);

impl InterferenceGraph {
    pub fn build(ranges: &LiveRanges) -> Self {
        let mut nodes: IndexMap<NodeId, GraphNode> = ranges
            .iter()
            .map(|interval| {
                let node = GraphNode {
                    interval: interval.clone(),
                    adjacent: IndexSet::new(),
                    ancestors: interval.uses.clone(),
                };
                (interval.value, node)
            })
            .collect();

        let intervals: Vec<&LiveInterval> = ranges.iter().collect();
        let mut edges = 0;
        for (i, a) in intervals.iter().enumerate() {
            for b in &intervals[i + 1..] {
                if a.overlaps(b) {
                    nodes[&a.value].adjacent.insert(b.value);
                    nodes[&b.value].adjacent.insert(a.value);
                    edges += 1;
                }
            }
        }

        log::debug!(
            "interference graph has {} nodes and {} edges",
            nodes.len(),
            edges
        );
        Self { nodes }
    }

    /// Values in ANF order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node(&self, value: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&value)
    }

    pub fn contains(&self, value: NodeId) -> bool {
        self.nodes.contains_key(&value)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn temp(&self, value: NodeId) -> Option<TempId> {
        self.node(value).map(|node| node.interval.temp)
    }

    pub fn interval(&self, value: NodeId) -> Option<&LiveInterval> {
        self.node(value).map(|node| &node.interval)
    }

    pub fn neighbors(&self, value: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&value)
            .into_iter()
            .flat_map(|node| node.adjacent.iter().copied())
    }

    /// Values that use `value` directly.
    pub fn ancestors(&self, value: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&value)
            .into_iter()
            .flat_map(|node| node.ancestors.iter().copied())
    }

    pub fn degree(&self, value: NodeId) -> usize {
        self.nodes.get(&value).map_or(0, |node| node.adjacent.len())
    }

    pub fn interferes(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes
            .get(&a)
            .is_some_and(|node| node.adjacent.contains(&b))
    }

    /// Each interfering pair once, lower ANF position first.
    pub fn interference_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for (index, (&a, node)) in self.nodes.iter().enumerate() {
            for &b in &node.adjacent {
                if self.nodes.get_index_of(&b).is_some_and(|other| other > index) {
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    /// Definition to user pairs.
    pub fn use_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .iter()
            .flat_map(|(&definition, node)| {
                node.ancestors
                    .iter()
                    .filter(|user| self.nodes.contains_key(*user))
                    .map(move |&user| (definition, user))
            })
            .collect()
    }

    /// Drops `value` and every edge touching it.
    pub fn remove(&mut self, value: NodeId) -> Option<GraphNode> {
        let removed = self.nodes.shift_remove(&value)?;
        for neighbor in &removed.adjacent {
            if let Some(node) = self.nodes.get_mut(neighbor) {
                node.adjacent.shift_remove(&value);
            }
        }
        Some(removed)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot(self.nodes.clone())
    }

    pub fn restore(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.0;
    }

    /// Mutable view that puts the graph back the way it was when dropped.
    pub fn scoped(&mut self) -> ScopedGraph<'_> {
        let snapshot = Some(self.snapshot());
        ScopedGraph {
            graph: self,
            snapshot,
        }
    }
}

pub struct ScopedGraph<'g> {
    graph: &'g mut InterferenceGraph,
    snapshot: Option<GraphSnapshot>,
}

impl Deref for ScopedGraph<'_> {
    type Target = InterferenceGraph;

    fn deref(&self) -> &InterferenceGraph {
        self.graph
    }
}

impl DerefMut for ScopedGraph<'_> {
    fn deref_mut(&mut self) -> &mut InterferenceGraph {
        self.graph
    }
}

impl Drop for ScopedGraph<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.graph.restore(snapshot);
        }
    }
}
