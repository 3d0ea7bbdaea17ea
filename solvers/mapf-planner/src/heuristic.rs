//! Distance oracle: Manhattan or true-distance-with-rotation (spec.md §4.A).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use mapf_core::{cell_of, pose_key, row_col_of, CellIndex, Environment, Facing, HeuristicKind};

/// One entry on the reverse-Dijkstra frontier: lower distance pops first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    dist: u32,
    cell: CellIndex,
    facing: Facing,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.cmp(&self.dist) // min-heap
    }
}
impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-goal reverse-Dijkstra distance map: (cell, facing) -> exact action
/// count to reach the goal. Lazily expanded and resumable across calls.
struct DistanceMap {
    settled: HashMap<u64, u32>,
    open: BinaryHeap<Frontier>,
}

impl DistanceMap {
    fn new(goal: CellIndex) -> Self {
        let mut open = BinaryHeap::new();
        for facing in Facing::ALL {
            open.push(Frontier { dist: 0, cell: goal, facing });
        }
        Self { settled: HashMap::new(), open }
    }

    /// Expand the reverse frontier until `(cell, facing)` is settled or the
    /// frontier is exhausted (goal unreachable). Returns the settled
    /// distance, if any.
    fn distance_to(&mut self, env: &dyn Environment, cell: CellIndex, facing: Facing) -> Option<u32> {
        let key = pose_key(cell, facing);
        if let Some(&d) = self.settled.get(&key) {
            return Some(d);
        }

        while let Some(Frontier { dist, cell: cur_cell, facing: cur_facing }) = self.open.pop() {
            let cur_key = pose_key(cur_cell, cur_facing);
            if self.settled.contains_key(&cur_key) {
                continue; // already settled via a shorter frontier entry
            }
            self.settled.insert(cur_key, dist);

            // Reverse edges: rotations are their own inverse; the reverse of
            // a forward step is "the cell one step behind `cur_facing`,
            // still facing `cur_facing`" (undoing the forward move that
            // would have produced `cur_cell` while facing `cur_facing`).
            for (next_cell, next_facing) in reverse_successors(env, cur_cell, cur_facing) {
                let next_key = pose_key(next_cell, next_facing);
                if !self.settled.contains_key(&next_key) {
                    self.open.push(Frontier { dist: dist + 1, cell: next_cell, facing: next_facing });
                }
            }

            if cur_key == key {
                return Some(dist);
            }
        }

        self.settled.get(&key).copied()
    }
}

/// The reverse neighbors of `(cell, facing)`: states that could have
/// transitioned into `(cell, facing)` via one forward/rotate action.
fn reverse_successors(
    env: &dyn Environment,
    cell: CellIndex,
    facing: Facing,
) -> Vec<(CellIndex, Facing)> {
    let mut out = Vec::with_capacity(3);
    // Rotations are self-inverse: whoever rotated into `facing` was at the
    // same cell, one rotation away.
    out.push((cell, facing.rotate_cw()));
    out.push((cell, facing.rotate_ccw()));

    // A forward step into `cell` while facing `facing` came from the cell
    // behind `cell` along `facing`, with the same facing.
    let cols = env.cols();
    let (row, col) = row_col_of(cell, cols);
    let (dr, dc) = facing.forward_delta();
    let (pr, pc) = (row as i32 - dr, col as i32 - dc);
    if pr >= 0 && pc >= 0 && (pr as u32) < env.rows() && (pc as u32) < cols {
        let prev_cell = cell_of(pr as u32, pc as u32, cols);
        if !env.is_obstacle(prev_cell) {
            out.push((prev_cell, facing));
        }
    }

    out
}

/// Manhattan distance between two cells, ignoring facing.
fn manhattan(env: &dyn Environment, a: CellIndex, b: CellIndex) -> u32 {
    let cols = env.cols();
    let (ar, ac) = row_col_of(a, cols);
    let (br, bc) = row_col_of(b, cols);
    ar.abs_diff(br) + ac.abs_diff(bc)
}

/// Distance oracle the single-agent planner queries for its heuristic.
pub struct DistanceOracle {
    kind: HeuristicKind,
    maps: HashMap<CellIndex, DistanceMap>,
}

impl DistanceOracle {
    pub fn new(kind: HeuristicKind) -> Self {
        Self { kind, maps: HashMap::new() }
    }

    /// The heuristic value for moving from `(cell, facing)` to `goal`.
    pub fn heuristic(&mut self, env: &dyn Environment, cell: CellIndex, facing: Facing, goal: CellIndex) -> u32 {
        match self.kind {
            HeuristicKind::Manhattan => manhattan(env, cell, goal),
            HeuristicKind::TrueDistance => {
                let map = self.maps.entry(goal).or_insert_with(|| DistanceMap::new(goal));
                // Reachability under "ignore other robots" should always
                // hold on a connected map; an unreachable query (e.g. a
                // fully enclosed goal) degrades to Manhattan so the caller
                // still gets an admissible-enough estimate rather than a
                // panic.
                map.distance_to(env, cell, facing).unwrap_or_else(|| manhattan(env, cell, goal))
            }
        }
    }
}
