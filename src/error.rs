use thiserror::Error;

use crate::ir::{NodeId, TempId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("undefined symbol `{name}` referenced by node {reference}")]
    UndefinedSymbol { name: String, reference: NodeId },

    #[error("tree has already been named")]
    AlreadyNamed,

    #[error("tree must be named before it can be linearized")]
    NotNamed,

    #[error("duplicate definition of `{name}` (nodes {first} and {second})")]
    DuplicateDefinition {
        name: String,
        first: NodeId,
        second: NodeId,
    },

    #[error("register palette is empty")]
    EmptyPalette,

    #[error("register `{0}` appears more than once in the palette")]
    DuplicateRegister(String),

    #[error("register `{register}` pinned on {value} is not in the palette")]
    UnknownRegister { register: String, value: TempId },

    #[error("{first} and {second} interfere but are both pinned to `{register}`")]
    PinConflict {
        register: String,
        first: TempId,
        second: TempId,
    },

    #[error("{} value(s) could not be given a register: {}", .values.len(), join(.values))]
    SpillRequired { values: Vec<TempId> },

    #[error("{value} expected in `{register}` but it holds {holder}")]
    Clobbered {
        value: TempId,
        register: String,
        holder: TempId,
    },

    #[error("{0} was read before it was written")]
    Uninitialized(TempId),

    #[error("graph rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn join(values: &[TempId]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
