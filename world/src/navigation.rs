//! Breadth-first route planner used by the board.

use std::collections::VecDeque;

use duel_defence_core::{Extent, Point};

/// Neighbour expansion order; ties between equally short routes follow it.
const NEIGHBOR_OFFSETS: [Point; 4] = [
    Point::new(1, 0),
    Point::new(-1, 0),
    Point::new(0, 1),
    Point::new(0, -1),
];

/// Finds a minimum-hop route from `start` to `end` over 4-connected cells.
///
/// The start cell is always expanded; every other cell is skipped when
/// `is_blocked` reports it as impassable. The search stops as soon as the
/// destination is dequeued and the route is rebuilt from back-pointers, so the
/// returned sequence begins with `start` and ends with `end`. An empty vector
/// means the destination cannot be reached.
pub(crate) fn shortest_path<F>(extent: Extent, start: Point, end: Point, mut is_blocked: F) -> Vec<Point>
where
    F: FnMut(Point) -> bool,
{
    if !extent.contains(start) || !extent.contains(end) {
        return Vec::new();
    }

    let cell_count = extent.area();
    let mut parents: Vec<Option<Point>> = vec![None; cell_count];
    let mut visited = vec![false; cell_count];
    let mut queue = VecDeque::new();

    let Some(start_index) = index(extent, start) else {
        return Vec::new();
    };
    visited[start_index] = true;
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        if cell == end {
            break;
        }

        for neighbor in neighbors(cell, extent) {
            let Some(neighbor_index) = index(extent, neighbor) else {
                continue;
            };

            if visited[neighbor_index] || is_blocked(neighbor) {
                continue;
            }

            visited[neighbor_index] = true;
            parents[neighbor_index] = Some(cell);
            queue.push_back(neighbor);
        }
    }

    let reached = index(extent, end).is_some_and(|end_index| visited[end_index]);
    if !reached {
        return Vec::new();
    }

    let mut route = vec![end];
    let mut cursor = end;
    while cursor != start {
        let Some(parent) = index(extent, cursor).and_then(|offset| parents[offset]) else {
            return Vec::new();
        };
        route.push(parent);
        cursor = parent;
    }
    route.reverse();
    route
}

fn neighbors(cell: Point, extent: Extent) -> impl Iterator<Item = Point> {
    NEIGHBOR_OFFSETS
        .into_iter()
        .map(move |offset| cell.offset(offset))
        .filter(move |candidate| extent.contains(*candidate))
}

fn index(extent: Extent, cell: Point) -> Option<usize> {
    if !extent.contains(cell) {
        return None;
    }
    let column = usize::try_from(cell.x()).ok()?;
    let row = usize::try_from(cell.y()).ok()?;
    let width = usize::try_from(extent.width()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
