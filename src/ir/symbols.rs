use indexmap::{IndexMap, IndexSet};

use crate::error::Error;
use crate::ir::{Kind, NodeId, Tree};

/// What to do when a later node takes over the name of an `Assign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The later definition in post-order replaces the earlier one.
    #[default]
    Shadow,
    Reject,
}

/// Definition name to defining node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: IndexMap<String, NodeId>,
}

impl SymbolTable {
    /// Indexes every node except the root, children before parents.
    pub fn index(tree: &Tree, policy: DuplicatePolicy) -> Result<Self, Error> {
        let mut symbols: IndexMap<String, NodeId> = IndexMap::new();
        for id in tree.post_order() {
            if id == tree.root() {
                continue;
            }
            let node = tree.node(id);
            // Generated names share the namespace, so any node can replace
            // an assignment.
            let overwritten = symbols
                .get(node.name())
                .copied()
                .filter(|&previous| *tree.node(previous).kind() == Kind::Assign);
            if let Some(previous) = overwritten {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(Error::DuplicateDefinition {
                            name: node.name().to_string(),
                            first: previous,
                            second: id,
                        });
                    }
                    DuplicatePolicy::Shadow => {
                        log::warn!(
                            "definition of `{}` at {} shadows the one at {}",
                            node.name(),
                            id,
                            previous
                        );
                    }
                }
            }
            symbols.insert(node.name().to_string(), id);
        }
        log::debug!("indexed {} symbols", symbols.len());
        Ok(Self { symbols })
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.symbols.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.symbols.iter().map(|(name, &id)| (name.as_str(), id))
    }
}

/// Fills in `dependencies` for every node: its children, plus the definition
/// a `Reference` resolves to.
pub fn resolve_dependencies(tree: &mut Tree, table: &SymbolTable) -> Result<(), Error> {
    let order = tree.post_order();
    let position: IndexMap<NodeId, usize> = order
        .iter()
        .enumerate()
        .map(|(position, &id)| (id, position))
        .collect();

    for &id in &order {
        let node = tree.node(id);
        let mut dependencies: IndexSet<NodeId> = node.children().iter().copied().collect();
        if let Kind::Reference(target) = node.kind() {
            let Some(definition) = table.get(target) else {
                return Err(Error::UndefinedSymbol {
                    name: target.clone(),
                    reference: id,
                });
            };
            // A definition that encloses the reference is not available yet.
            if tree.ancestors(id).any(|ancestor| ancestor == definition) {
                return Err(Error::UndefinedSymbol {
                    name: target.clone(),
                    reference: id,
                });
            }
            if position[&definition] > position[&id] {
                log::warn!(
                    "reference to `{}` at {} resolves to a later definition",
                    target,
                    id
                );
            }
            dependencies.insert(definition);
        }
        tree.node_mut(id).dependencies = dependencies;
    }
    Ok(())
}
