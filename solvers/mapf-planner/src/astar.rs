//! Time-expanded space-time A* for one robot (spec.md §4.C).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use mapf_core::{cell_of, pose_key, row_col_of, CellIndex, Environment, Facing, RobotState};

use crate::heuristic::DistanceOracle;
use crate::reservation::{ReservationTable, RobotId};

/// One open-list entry: key is `(g+h, h, tiebreak)`, matching spec.md §3 —
/// lower `f` first, ties broken by lower `h`, remaining ties broken by
/// insertion order (earlier insertion wins) so the search is deterministic.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct OpenEntry {
    f: u32,
    h: u32,
    tiebreak: u64,
    cell: CellIndex,
    facing: Facing,
    g: u32,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.tiebreak.cmp(&self.tiebreak))
    }
}
impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The three rotations/forward plus wait, as (cell, facing) successors of
/// `(cell, facing)`, honoring bounds and obstacles for the forward move.
fn successors(env: &dyn Environment, cell: CellIndex, facing: Facing) -> Vec<(CellIndex, Facing)> {
    let mut out = Vec::with_capacity(4);
    out.push((cell, facing.rotate_cw()));
    out.push((cell, facing.rotate_ccw()));
    out.push((cell, facing)); // wait

    let cols = env.cols();
    let (row, col) = row_col_of(cell, cols);
    let (dr, dc) = facing.forward_delta();
    let (nr, nc) = (row as i32 + dr, col as i32 + dc);
    if nr >= 0 && nc >= 0 && (nr as u32) < env.rows() && (nc as u32) < cols {
        let next_cell = cell_of(nr as u32, nc as u32, cols);
        if !env.is_obstacle(next_cell) {
            out.push((next_cell, facing));
        }
    }

    out
}

/// Find a collision-free trajectory for robot `robot` from `(start_cell,
/// start_facing)` to `goal`, respecting `reservations`. Returns the
/// trajectory starting at step 1 (excludes the start pose), or `None` if no
/// reachable goal respects the table within `horizon` steps.
pub fn plan_single_agent(
    env: &dyn Environment,
    oracle: &mut DistanceOracle,
    reservations: &ReservationTable,
    robot: RobotId,
    start_cell: CellIndex,
    start_facing: Facing,
    goal: CellIndex,
    horizon: u32,
) -> Option<Vec<RobotState>> {
    let mut open = BinaryHeap::new();
    let mut closed: HashMap<(u64, u32), ()> = HashMap::new();
    let mut parent: HashMap<(u64, u32), Option<(u64, u32)>> = HashMap::new();
    let mut tiebreak_counter: u64 = 0;

    let h0 = oracle.heuristic(env, start_cell, start_facing, goal);
    open.push(OpenEntry {
        f: h0,
        h: h0,
        tiebreak: tiebreak_counter,
        cell: start_cell,
        facing: start_facing,
        g: 0,
    });
    parent.insert((pose_key(start_cell, start_facing), 0), None);

    while let Some(entry) = open.pop() {
        let key = (pose_key(entry.cell, entry.facing), entry.g);
        if closed.contains_key(&key) {
            continue;
        }
        closed.insert(key, ());

        if entry.cell == goal {
            return Some(reconstruct(&parent, key));
        }

        if entry.g >= horizon {
            continue;
        }

        let next_g = entry.g + 1;
        for (next_cell, next_facing) in successors(env, entry.cell, entry.facing) {
            if reservations.is_blocked(entry.cell, next_cell, next_g, robot) {
                continue;
            }

            let next_key = (pose_key(next_cell, next_facing), next_g);
            if closed.contains_key(&next_key) {
                continue;
            }

            // First arrival at a (pose, g) key wins; re-expansion is
            // forbidden since every edge costs 1 and h is consistent, so the
            // first pop of any (pose, g) key is already optimal. A later,
            // no-better rediscovery of the same key is simply dropped here
            // (the original planner mutated a throwaway tuple on this path
            // and never wrote it back — dead code, omitted per spec.md §9).
            if parent.contains_key(&next_key) {
                continue;
            }

            tiebreak_counter += 1;
            let next_h = oracle.heuristic(env, next_cell, next_facing, goal);
            open.push(OpenEntry {
                f: next_g + next_h,
                h: next_h,
                tiebreak: tiebreak_counter,
                cell: next_cell,
                facing: next_facing,
                g: next_g,
            });
            parent.insert(next_key, Some(key));
        }
    }

    None
}

fn reconstruct(
    parent: &HashMap<(u64, u32), Option<(u64, u32)>>,
    goal_key: (u64, u32),
) -> Vec<RobotState> {
    let mut poses = Vec::new();
    let mut cur = Some(goal_key);
    while let Some(key) = cur {
        let (pose, _g) = key;
        let cell = (pose / 4) as CellIndex;
        let facing = Facing::try_from((pose % 4) as u8).expect("pose_key packs a valid facing");
        poses.push(RobotState { cell, facing });
        cur = *parent.get(&key).unwrap_or(&None);
    }
    poses.pop(); // drop the start pose, per spec.md §4.C
    poses.reverse();
    poses
}
