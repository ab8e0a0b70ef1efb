//! Instruction trees.
//!
//! Callers describe a program as nested [`Ins`] values. [`Tree::new`] flattens
//! them into an arena where every node is addressed by a stable [`NodeId`],
//! so later passes can key sets and maps by index instead of by identity.

pub mod naming;
pub mod symbols;

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::registers::{Allocation, Location};

pub use naming::assign_temp_ids;
pub use symbols::{DuplicatePolicy, SymbolTable, resolve_dependencies};

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Temporary assigned by the naming pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub u32);

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Synthetic root holding the top-level statements.
    Program,
    Literal(i64),
    Reference(String),
    Add,
    Sub,
    Mul,
    Assign,
    Print,
}

/// Owned instruction value used to build a [`Tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Ins {
    kind: Kind,
    name: String,
    children: Vec<Ins>,
    pin: Option<String>,
}

impl Ins {
    fn new(kind: Kind, name: impl Into<String>, children: Vec<Ins>) -> Self {
        Self {
            kind,
            name: name.into(),
            children,
            pin: None,
        }
    }

    pub fn literal(value: i64) -> Self {
        Self::new(Kind::Literal(value), value.to_string(), vec![])
    }

    pub fn reference(target: impl Into<String>) -> Self {
        let target = target.into();
        let name = format!("ref_{target}");
        Self::new(Kind::Reference(target), name, vec![])
    }

    pub fn add(operands: impl IntoIterator<Item = Ins>) -> Self {
        Self::new(Kind::Add, "add", operands.into_iter().collect())
    }

    pub fn sub(operands: impl IntoIterator<Item = Ins>) -> Self {
        Self::new(Kind::Sub, "sub", operands.into_iter().collect())
    }

    pub fn mul(operands: impl IntoIterator<Item = Ins>) -> Self {
        Self::new(Kind::Mul, "mul", operands.into_iter().collect())
    }

    pub fn assign(name: impl Into<String>, body: Ins) -> Self {
        Self::new(Kind::Assign, name, vec![body])
    }

    pub fn print(operand: Ins) -> Self {
        Self::new(Kind::Print, "print", vec![operand])
    }

    /// Overrides the lookup name, e.g. to make an arithmetic node referable.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fixes the value of this instruction to a physical register.
    pub fn pinned(mut self, register: impl Into<String>) -> Self {
        self.pin = Some(register.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: Kind,
    name: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    pub(crate) temp: Option<TempId>,
    pub(crate) dependencies: IndexSet<NodeId>,
    pin: Option<String>,
    pub(crate) location: Option<Location>,
}

impl Node {
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn temp(&self) -> Option<TempId> {
        self.temp
    }

    /// Values this node reads: its children, then a resolved definition.
    pub fn dependencies(&self) -> &IndexSet<NodeId> {
        &self.dependencies
    }

    pub fn pin(&self) -> Option<&str> {
        self.pin.as_deref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    pub(crate) named: bool,
}

impl Tree {
    pub fn new(statements: impl IntoIterator<Item = Ins>) -> Self {
        let mut tree = Self {
            nodes: vec![Node {
                kind: Kind::Program,
                name: "root".to_string(),
                children: vec![],
                parent: None,
                temp: None,
                dependencies: IndexSet::new(),
                pin: None,
                location: None,
            }],
            named: false,
        };
        let root = tree.root();
        for statement in statements {
            let child = tree.insert(statement, root);
            tree.nodes[root.0].children.push(child);
        }
        tree
    }

    fn insert(&mut self, ins: Ins, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: ins.kind,
            name: ins.name,
            children: vec![],
            parent: Some(parent),
            temp: None,
            dependencies: IndexSet::new(),
            pin: ins.pin,
            location: None,
        });
        let children = ins
            .children
            .into_iter()
            .map(|child| self.insert(child, id))
            .collect();
        self.nodes[id.0].children = children;
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_named(&self) -> bool {
        self.named
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn temp(&self, id: NodeId) -> Option<TempId> {
        self.nodes[id.0].temp
    }

    /// Temp label of a node, `_` before naming.
    pub fn label(&self, id: NodeId) -> String {
        self.temp(id).map_or_else(|| "_".to_string(), |t| t.to_string())
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Children before parents, the root last.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, cursor)) = stack.last_mut() {
            if let Some(&child) = self.nodes[id.0].children.get(*cursor) {
                *cursor += 1;
                stack.push((child, 0));
            } else {
                order.push(*id);
                stack.pop();
            }
        }
        order
    }

    /// Parents before children, siblings left to right, the root first.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }

    /// Enclosing nodes of `id`, innermost first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent(), |&parent| self.node(parent).parent())
    }

    /// Last `Assign` node defining `name`.
    pub fn assignment(&self, name: &str) -> Option<NodeId> {
        self.post_order().into_iter().rev().find(|&id| {
            let node = self.node(id);
            node.kind == Kind::Assign && node.name == name
        })
    }

    pub fn pins(&self) -> IndexMap<NodeId, String> {
        self.post_order()
            .into_iter()
            .filter_map(|id| Some((id, self.node(id).pin.clone()?)))
            .collect()
    }

    pub(crate) fn apply_allocation(&mut self, allocation: &Allocation) {
        for (id, location) in allocation.iter() {
            self.nodes[id.0].location = Some(location.clone());
        }
    }

    /// Short rendering of a node using the temps of its operands.
    pub fn describe(&self, id: NodeId) -> String {
        let node = self.node(id);
        let operands = || {
            node.children
                .iter()
                .map(|&child| self.label(child))
                .collect::<Vec<_>>()
                .join(" ")
        };
        match &node.kind {
            Kind::Program => "program".to_string(),
            Kind::Literal(value) => format!("literal {value}"),
            Kind::Reference(target) => format!("ref {target}"),
            Kind::Add => format!("add {}", operands()),
            Kind::Sub => format!("sub {}", operands()),
            Kind::Mul => format!("mul {}", operands()),
            Kind::Assign => format!("assign {} = {}", node.name, operands()),
            Kind::Print => format!("print {}", operands()),
        }
    }
}
