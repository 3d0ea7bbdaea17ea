//! Sequential, per-robot reservation coordinator with conflict propagation
//! (spec.md §4.D).

use std::collections::HashSet;

use mapf_core::{ActionKind, CellIndex, Environment, RobotState};

use crate::astar::plan_single_agent;
use crate::commit::try_commit_strict;
use crate::encode::encode_step;
use crate::heuristic::DistanceOracle;
use crate::reservation::{RobotId, ReservationTable};

/// Outcome of one coordinator call: a tape of shape `replanning_period x
/// num_agents`, the total (possibly penalized) path length used to score
/// this plan against alternatives, and which robots ended up stuck.
#[derive(Debug, Clone)]
pub struct CoordinatorResult {
    pub tape: Vec<Vec<ActionKind>>,
    pub total_length: u64,
    pub stuck_ids: HashSet<RobotId>,
}

impl CoordinatorResult {
    pub fn stuck_count(&self) -> usize {
        self.stuck_ids.len()
    }

    /// Lexicographic score: fewer stuck robots first, then shorter total
    /// path length. Lower is better.
    pub fn score(&self) -> (usize, u64) {
        (self.stuck_count(), self.total_length)
    }
}

fn empty_tape(replanning_period: u32, num_agents: usize) -> Vec<Vec<ActionKind>> {
    vec![vec![ActionKind::Wait; num_agents]; replanning_period as usize]
}

fn write_path_into_tape(
    tape: &mut [Vec<ActionKind>],
    robot: RobotId,
    start: RobotState,
    path: &[RobotState],
) {
    let mut prev = start;
    for (i, row) in tape.iter_mut().enumerate() {
        let next = path.get(i).copied().unwrap_or_else(|| *path.last().unwrap_or(&start));
        row[robot] = encode_step(prev, next);
        prev = next;
    }
}

fn ahead_cell(env: &dyn Environment, state: RobotState) -> Option<CellIndex> {
    let cols = env.cols();
    let (row, col) = mapf_core::row_col_of(state.cell, cols);
    let (dr, dc) = state.facing.forward_delta();
    let (nr, nc) = (row as i32 + dr, col as i32 + dc);
    if nr >= 0 && nc >= 0 && (nr as u32) < env.rows() && (nc as u32) < cols {
        Some(mapf_core::cell_of(nr as u32, nc as u32, cols))
    } else {
        None
    }
}

/// Revoke `robot`'s reservations, park it in place for the whole horizon,
/// and overwrite its tape rows to WAIT. If parking conflicts with another
/// robot's already-committed reservation, that robot is resolved first
/// (depth-first via an explicit stack — no native recursion, per spec.md
/// §9's preference for an iterative worklist over recursion).
fn stop_and_park(
    env: &dyn Environment,
    table: &mut ReservationTable,
    tape: &mut [Vec<ActionKind>],
    horizon: u32,
    stopped: &mut HashSet<RobotId>,
    start: RobotId,
) {
    let mut stack: Vec<(RobotId, u32)> = vec![(start, 1)];

    while let Some((r, from_t)) = stack.pop() {
        if from_t == 1 {
            if stopped.contains(&r) {
                continue;
            }
            stopped.insert(r);
            table.revoke_all_of(r);
            for row in tape.iter_mut() {
                row[r] = ActionKind::Wait;
            }
        }

        let cell = env.robot_state(r).cell;
        let mut blocked_by: Option<(RobotId, u32)> = None;
        let mut t = from_t;
        while t <= horizon {
            match table.owner_of_cell(cell, t) {
                Some(owner) if owner != r => {
                    if stopped.contains(&owner) {
                        // Every already-stopped robot only ever holds a
                        // reservation on its own (distinct) current cell;
                        // reaching this branch means the reservation table
                        // and the stopped-set disagree about who owns what.
                        debug_assert!(
                            false,
                            "reservation/owner-map desync: robot {r} blocked by already-stopped robot {owner} at its own cell"
                        );
                    } else {
                        blocked_by = Some((owner, t));
                        break;
                    }
                }
                _ => {}
            }
            table.reserve(cell, cell, t, r, false).expect("non-strict reserve never conflicts");
            t += 1;
        }

        if let Some((owner, resume_t)) = blocked_by {
            stack.push((r, resume_t));
            stack.push((owner, 1));
        }
    }
}

/// Sequential priority coordinator (spec.md §4.D).
pub struct PriorityCoordinator<'a> {
    env: &'a dyn Environment,
    oracle: &'a mut DistanceOracle,
    replanning_period: u32,
    time_horizon: u32,
}

impl<'a> PriorityCoordinator<'a> {
    pub fn new(
        env: &'a dyn Environment,
        oracle: &'a mut DistanceOracle,
        replanning_period: u32,
        time_horizon: u32,
    ) -> Self {
        Self { env, oracle, replanning_period, time_horizon }
    }

    /// Plan for every agent in `order`, granting an extra held-cell tick
    /// (t=1 and t=2) to robots named in `fix_stuck` per spec.md §4.D step 2.
    pub fn plan(&mut self, order: &[usize], fix_stuck: &HashSet<RobotId>) -> CoordinatorResult {
        let n = self.env.num_agents();
        let mut table = ReservationTable::new();
        let mut tape = empty_tape(self.replanning_period, n);
        let mut stuck_ids: HashSet<RobotId> = HashSet::new();
        let mut stopped: HashSet<RobotId> = HashSet::new();
        let mut total_length: u64 = 0;

        // Step 2: pre-reserve stuck cells (ahead is an obstacle, or ahead is
        // currently occupied by another robot).
        for robot in 0..n {
            let state = self.env.robot_state(robot);
            let ahead_blocked = match ahead_cell(self.env, state) {
                None => true,
                Some(ahead) => {
                    self.env.is_obstacle(ahead)
                        || (0..n).any(|other| other != robot && self.env.robot_state(other).cell == ahead)
                }
            };
            if ahead_blocked {
                let extra_tick = if fix_stuck.contains(&robot) { 2 } else { 1 };
                for t in 1..=extra_tick {
                    // Idempotent; a later strict path reservation for this
                    // robot at t=1 will simply no-op against its own entry.
                    let _ = table.reserve(state.cell, state.cell, t, robot, false);
                }
            }
        }

        for &robot in order {
            let state = self.env.robot_state(robot);
            let goals = self.env.goal_queue(robot);

            if goals.is_empty() {
                for t in 1..=self.time_horizon {
                    let _ = table.reserve(state.cell, state.cell, t, robot, false);
                }
                continue;
            }

            let goal = goals[0];
            let found = plan_single_agent(
                self.env,
                self.oracle,
                &table,
                robot,
                state.cell,
                state.facing,
                goal,
                self.time_horizon,
            );

            let committed_path = found.and_then(|path| {
                if try_commit_strict(&mut table, robot, state, &path, self.time_horizon) {
                    Some(path)
                } else {
                    None
                }
            });

            if let Some(path) = committed_path {
                write_path_into_tape(&mut tape, robot, state, &path);
                total_length += path.len() as u64;
            } else {
                // No path (or rollback after a conflict): wait in place,
                // propagating conflicts against whoever already holds the
                // robot's own cell at some t.
                stuck_ids.insert(robot);
                total_length += self.time_horizon as u64;

                for t in 1..=self.time_horizon {
                    match table.owner_of_cell(state.cell, t) {
                        Some(owner) if owner != robot => {
                            stuck_ids.insert(owner);
                            stop_and_park(
                                self.env,
                                &mut table,
                                &mut tape,
                                self.time_horizon,
                                &mut stopped,
                                owner,
                            );
                            let _ = table.reserve(state.cell, state.cell, t, robot, false);
                        }
                        _ => {
                            let _ = table.reserve(state.cell, state.cell, t, robot, false);
                        }
                    }
                }
            }
        }

        CoordinatorResult { tape, total_length, stuck_ids }
    }
}
