//! Built-in programs for the command line. There is no parser; trees are
//! assembled with the [`Ins`] builders.

use crate::ir::{Ins, Tree};

pub const PROGRAMS: [&str; 6] = [
    "original",
    "scenario",
    "pressure",
    "undefined",
    "pinned",
    "shadowed",
];

pub fn program(name: &str) -> Option<Tree> {
    let tree = match name {
        "original" => original(),
        "scenario" => scenario(),
        "pressure" => pressure(),
        "undefined" => undefined(),
        "pinned" => pinned(),
        "shadowed" => shadowed(),
        _ => return None,
    };
    Some(tree)
}

/// `a = 6 + 7; b = 8; m = a + b`
pub fn original() -> Tree {
    Tree::new([
        Ins::assign("a", Ins::add([Ins::literal(6), Ins::literal(7)])),
        Ins::assign("b", Ins::literal(8)),
        Ins::assign("m", Ins::add([Ins::reference("a"), Ins::reference("b")])),
    ])
}

/// `a = 6 + 7; b = 10; m = a + b; print m`
pub fn scenario() -> Tree {
    Tree::new([
        Ins::assign("a", Ins::add([Ins::literal(6), Ins::literal(7)])),
        Ins::assign("b", Ins::literal(10)),
        Ins::assign("m", Ins::add([Ins::reference("a"), Ins::reference("b")])),
        Ins::print(Ins::reference("m")),
    ])
}

/// Five operands that are all live when the sum is taken.
pub fn pressure() -> Tree {
    Tree::new([Ins::print(Ins::add((1..=5).map(Ins::literal)))])
}

pub fn undefined() -> Tree {
    Tree::new([Ins::print(Ins::reference("z"))])
}

pub fn pinned() -> Tree {
    Tree::new([
        Ins::assign("a", Ins::literal(6)).pinned("rax"),
        Ins::assign("b", Ins::literal(7)),
        Ins::print(Ins::add([Ins::reference("a"), Ins::reference("b")])),
    ])
}

/// `x` is assigned twice; the reference sees the second one.
pub fn shadowed() -> Tree {
    Tree::new([
        Ins::assign("x", Ins::literal(1)),
        Ins::assign("x", Ins::literal(2)),
        Ins::print(Ins::reference("x")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_program_exists() {
        for name in PROGRAMS {
            assert!(program(name).is_some(), "{name}");
        }
        assert!(program("missing").is_none());
    }
}
