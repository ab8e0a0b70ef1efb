//! Live intervals over the ANF index space.
//!
//! Every value gets one contiguous interval running from its definition (or
//! an earlier use, for references that resolve forward) to its last use.
//! Gaps between uses never split an interval.

use indexmap::{IndexMap, IndexSet};

use crate::anf::Anf;
use crate::ir::{NodeId, TempId, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveInterval {
    pub value: NodeId,
    pub temp: TempId,
    /// ANF index of the defining entry.
    pub def: usize,
    pub start: usize,
    pub end: usize,
    /// Entries that read this value, in ANF order.
    pub uses: IndexSet<NodeId>,
}

impl LiveInterval {
    fn new(value: NodeId, temp: TempId, def: usize) -> Self {
        Self {
            value,
            temp,
            def,
            start: def,
            end: def,
            uses: IndexSet::new(),
        }
    }

    fn add_use(&mut self, user: NodeId, point: usize) {
        self.start = self.start.min(point);
        self.end = self.end.max(point);
        self.uses.insert(user);
    }

    pub fn is_dead(&self) -> bool {
        self.uses.is_empty()
    }

    pub fn covers(&self, point: usize) -> bool {
        self.start <= point && point <= self.end
    }

    /// Exclusive end used for interference. A last use shares its point with
    /// the value defined there; a dead value still occupies its own point.
    pub fn span_end(&self) -> usize {
        self.end.max(self.start + 1)
    }

    pub fn overlaps(&self, other: &LiveInterval) -> bool {
        self.start < other.span_end() && other.start < self.span_end()
    }
}

/// Intervals keyed by value, in ANF order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveRanges {
    intervals: IndexMap<NodeId, LiveInterval>,
}

impl LiveRanges {
    pub fn get(&self, value: NodeId) -> Option<&LiveInterval> {
        self.intervals.get(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveInterval> {
        self.intervals.values()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Values live at `point`.
    pub fn live_at(&self, point: usize) -> impl Iterator<Item = &LiveInterval> {
        self.iter().filter(move |interval| interval.covers(point))
    }
}

pub fn compute_live_ranges(tree: &Tree, anf: &Anf) -> LiveRanges {
    let mut intervals: IndexMap<NodeId, LiveInterval> = anf
        .iter()
        .enumerate()
        .map(|(index, entry)| (entry.node, LiveInterval::new(entry.node, entry.temp, index)))
        .collect();

    for (point, entry) in anf.iter().enumerate() {
        for dependency in tree.node(entry.node).dependencies() {
            if let Some(interval) = intervals.get_mut(dependency) {
                interval.add_use(entry.node, point);
            }
        }
    }

    log::debug!(
        "computed {} live intervals ({} dead)",
        intervals.len(),
        intervals.values().filter(|i| i.is_dead()).count()
    );
    LiveRanges { intervals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{prepare, scenario, value};

    fn span(ranges: &LiveRanges, tree: &Tree, temp: u32) -> (usize, usize) {
        let interval = ranges.get(value(tree, temp)).unwrap();
        (interval.start, interval.end)
    }

    #[test]
    fn test_scenario_intervals() {
        let (tree, _anf, ranges) = prepare(scenario());
        let expected = [
            (3, (0, 2)),
            (4, (1, 2)),
            (2, (2, 3)),
            (1, (3, 6)),
            (6, (4, 5)),
            (5, (5, 7)),
            (9, (6, 8)),
            (10, (7, 8)),
            (8, (8, 9)),
            (7, (9, 10)),
            (12, (10, 11)),
            (11, (11, 11)),
        ];
        for (temp, bounds) in expected {
            assert_eq!(span(&ranges, &tree, temp), bounds, "t{temp}");
        }
    }

    #[test]
    fn test_dead_value_is_degenerate() {
        let (tree, anf, ranges) = prepare(scenario());
        let print = value(&tree, 11);
        let interval = ranges.get(print).unwrap();
        assert!(interval.is_dead());
        assert_eq!(interval.def, anf.position(print).unwrap());
        assert_eq!(interval.start, interval.end);
    }

    #[test]
    fn test_every_use_is_covered() {
        let (tree, anf, ranges) = prepare(scenario());
        for interval in ranges.iter() {
            for &user in &interval.uses {
                assert!(interval.covers(anf.position(user).unwrap()));
            }
            for (point, entry) in anf.iter().enumerate() {
                if tree.node(entry.node).dependencies().contains(&interval.value) {
                    assert!(interval.covers(point));
                }
            }
        }
    }

    #[test]
    fn test_gap_between_uses_keeps_value_live() {
        use crate::ir::Ins;
        let (tree, _anf, ranges) = prepare(crate::ir::Tree::new([
            Ins::assign("a", Ins::literal(1)),
            Ins::print(Ins::reference("a")),
            Ins::print(Ins::literal(2)),
            Ins::print(Ins::reference("a")),
        ]));
        let a = tree.assignment("a").unwrap();
        let interval = ranges.get(a).unwrap();
        assert_eq!(interval.uses.len(), 2);
        for point in interval.start..=interval.end {
            assert!(interval.covers(point));
        }
        assert_eq!((interval.start, interval.end), (1, 6));
    }

    #[test]
    fn test_overlap_rules() {
        let interval = |start, end| LiveInterval {
            value: NodeId(0),
            temp: TempId(0),
            def: start,
            start,
            end,
            uses: IndexSet::new(),
        };
        assert!(interval(0, 2).overlaps(&interval(1, 2)));
        assert!(!interval(0, 2).overlaps(&interval(2, 3)));
        assert!(interval(1, 5).overlaps(&interval(3, 3)));
        assert!(!interval(1, 5).overlaps(&interval(5, 5)));
        assert!(!interval(4, 4).overlaps(&interval(5, 5)));
    }

    #[test]
    fn test_live_at_point() {
        let (tree, _anf, ranges) = prepare(scenario());
        let live: Vec<_> = ranges.live_at(6).map(|i| i.temp.0).collect();
        assert_eq!(live, vec![1, 5, 9]);
        assert!(tree.assignment("a").is_some());
    }
}
