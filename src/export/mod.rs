//! Graph description for visualizing allocations.
//!
//! [`GraphDescription`] is a plain data view of the interference graph with
//! colors already resolved. Renderers turn it into files; the Graphviz one
//! shells out to `dot`.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::error::Error;
use crate::ir::Tree;
use crate::registers::{Allocation, InterferenceGraph, Location, Palette};

const COLORS: [&str; 8] = [
    "lightblue",
    "palegreen",
    "gold",
    "salmon",
    "plum",
    "orange",
    "turquoise",
    "pink",
];
const SPILL_COLOR: &str = "gray";
const UNALLOCATED_COLOR: &str = "white";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescription {
    pub id: String,
    pub label: String,
    pub register: Option<String>,
    pub spilled: bool,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Interference,
    /// Definition to user.
    Use,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDescription {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDescription {
    pub nodes: Vec<NodeDescription>,
    pub edges: Vec<EdgeDescription>,
}

impl GraphDescription {
    pub fn new(
        tree: &Tree,
        graph: &InterferenceGraph,
        allocation: Option<&Allocation>,
        palette: &Palette,
    ) -> Self {
        let nodes = graph
            .nodes()
            .map(|id| {
                let location = allocation.and_then(|a| a.location(id));
                let color = match location {
                    Some(Location::Register(register)) => palette
                        .position(register)
                        .map_or(UNALLOCATED_COLOR, |index| COLORS[index % COLORS.len()]),
                    Some(Location::Spill) => SPILL_COLOR,
                    None => UNALLOCATED_COLOR,
                };
                NodeDescription {
                    id: tree.label(id),
                    label: format!("{} {}", tree.label(id), tree.describe(id)),
                    register: location.and_then(Location::register).map(str::to_string),
                    spilled: location.is_some_and(Location::is_spill),
                    color,
                }
            })
            .collect();

        let interference = graph
            .interference_edges()
            .into_iter()
            .map(|edge| (edge, EdgeKind::Interference));
        let uses = graph
            .use_edges()
            .into_iter()
            .map(|edge| (edge, EdgeKind::Use));
        let edges = interference
            .chain(uses)
            .map(|((from, to), kind)| EdgeDescription {
                from: tree.label(from),
                to: tree.label(to),
                kind,
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::from("graph interference {\n    node [style=filled];\n");
        for node in &self.nodes {
            let mut label = escape(&node.label);
            if let Some(register) = &node.register {
                let _ = write!(label, "\\n{}", escape(register));
            } else if node.spilled {
                label.push_str("\\nspill");
            }
            let _ = writeln!(
                dot,
                "    {} [label=\"{}\", fillcolor=\"{}\"];",
                node.id, label, node.color
            );
        }
        for edge in &self.edges {
            let _ = match edge.kind {
                EdgeKind::Interference => writeln!(dot, "    {} -- {};", edge.from, edge.to),
                EdgeKind::Use => writeln!(
                    dot,
                    "    {} -- {} [dir=forward, style=dashed];",
                    edge.from, edge.to
                ),
            };
        }
        dot.push_str("}\n");
        dot
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub trait GraphRenderer {
    fn render(&self, graph: &GraphDescription, output: &Path) -> Result<(), Error>;
}

/// Writes the DOT source itself.
pub struct DotSource;

impl GraphRenderer for DotSource {
    fn render(&self, graph: &GraphDescription, output: &Path) -> Result<(), Error> {
        std::fs::write(output, graph.to_dot())?;
        Ok(())
    }
}

/// Runs a Graphviz layout program over a temporary DOT file.
pub struct Graphviz {
    pub program: String,
    pub format: String,
}

impl Default for Graphviz {
    fn default() -> Self {
        Self {
            program: "dot".to_string(),
            format: "png".to_string(),
        }
    }
}

impl GraphRenderer for Graphviz {
    fn render(&self, graph: &GraphDescription, output: &Path) -> Result<(), Error> {
        let mut source = NamedTempFile::new()?;
        source.write_all(graph.to_dot().as_bytes())?;
        source.flush()?;

        let status = Command::new(&self.program)
            .arg(format!("-T{}", self.format))
            .arg(source.path())
            .arg("-o")
            .arg(output)
            .status()
            .map_err(|err| Error::Render(format!("could not run `{}`: {err}", self.program)))?;

        if !status.success() {
            return Err(Error::Render(format!("`{}` exited with {status}", self.program)));
        }
        log::info!("rendered graph to {}", output.display());
        Ok(())
    }
}
