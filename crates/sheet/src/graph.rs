//! Walks over the cell dependency graph.
//!
//! Forward edges live in each formula's references, back-edges in each
//! cell's dependent set. All walks use an explicit stack so that deep
//! reference chains cannot exhaust the call stack.

use crate::cell::Cell;
use cellgrid_primitives::Position;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

pub(crate) type CellMap = HashMap<Position, Cell>;

/// Look for a path from any of `references` back to `target` through the
/// existing forward edges.
///
/// Returns the cycle that installing those references at `target` would
/// close, starting and ending at `target`.
pub(crate) fn find_cycle(
    cells: &CellMap,
    target: Position,
    references: &[Position],
) -> Option<Vec<Position>> {
    let mut parent: HashMap<Position, Position> = HashMap::new();
    let mut stack: Vec<Position> = Vec::new();

    for &next in references.iter().filter(|pos| pos.is_valid()) {
        if next == target {
            return Some(vec![target, target]);
        }
        if let Entry::Vacant(entry) = parent.entry(next) {
            entry.insert(target);
            stack.push(next);
        }
    }

    while let Some(pos) = stack.pop() {
        let Some(cell) = cells.get(&pos) else {
            continue;
        };
        for &next in cell.references().iter().filter(|pos| pos.is_valid()) {
            if next == target {
                return Some(trace_path(&parent, target, pos));
            }
            if let Entry::Vacant(entry) = parent.entry(next) {
                entry.insert(pos);
                stack.push(next);
            }
        }
    }
    None
}

fn trace_path(parent: &HashMap<Position, Position>, target: Position, last: Position) -> Vec<Position> {
    let mut path = vec![target];
    let mut current = last;
    while current != target {
        path.push(current);
        match parent.get(&current) {
            Some(&prev) => current = prev,
            None => break,
        }
    }
    path.push(target);
    path.reverse();
    path
}

/// Every position reachable from `start` through dependent sets, `start`
/// excluded, in discovery order.
pub(crate) fn transitive_dependents(cells: &CellMap, start: Position) -> Vec<Position> {
    let mut visited: HashSet<Position> = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![start];
    visited.insert(start);

    while let Some(pos) = stack.pop() {
        let Some(cell) = cells.get(&pos) else {
            continue;
        };
        for &dependent in cell.dependents() {
            if visited.insert(dependent) {
                order.push(dependent);
                stack.push(dependent);
            }
        }
    }
    order
}

/// Drop the cache at `start` and at every transitive dependent. Returns how
/// many memoized values were discarded.
pub(crate) fn invalidate(cells: &mut CellMap, start: Position) -> usize {
    let mut dropped = 0;
    if let Some(cell) = cells.get_mut(&start) {
        dropped += usize::from(cell.invalidate_cache());
    }
    for pos in transitive_dependents(cells, start) {
        if let Some(cell) = cells.get_mut(&pos) {
            dropped += usize::from(cell.invalidate_cache());
        }
    }
    dropped
}

/// Uncached formula cells that reading `start` would evaluate, ordered so
/// that every cell comes after the cells it reads.
pub(crate) fn evaluation_order(cells: &CellMap, start: Position) -> Vec<Position> {
    let mut order = Vec::new();
    let mut visited: HashSet<Position> = HashSet::new();
    let mut stack: Vec<(Position, bool)> = vec![(start, false)];

    while let Some((pos, expanded)) = stack.pop() {
        if expanded {
            order.push(pos);
            continue;
        }
        let Some(cell) = cells.get(&pos) else {
            continue;
        };
        if !cell.is_formula() || cell.is_cached() || !visited.insert(pos) {
            continue;
        }
        stack.push((pos, true));
        for &next in cell.references().iter().rev() {
            if next.is_valid() && !visited.contains(&next) {
                stack.push((next, false));
            }
        }
    }
    order
}
