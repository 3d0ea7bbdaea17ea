//! Independent-planning-then-improve coordinator (spec.md §4.E).
//!
//! Every robot first plans as if all the others were standing still (each
//! "parks" on its own current cell for the whole horizon); successful
//! robots then get repeated chances to shorten their committed path while
//! budget remains. This avoids the priority coordinator's starvation of
//! low-priority robots in narrow corridors, at the cost of needing more
//! sweeps to converge.

use std::collections::HashSet;

use mapf_core::{ActionKind, Environment, RobotState};

use crate::astar::plan_single_agent;
use crate::commit::try_commit_strict;
use crate::deadline::Deadline;
use crate::heuristic::DistanceOracle;
use crate::priority::CoordinatorResult;
use crate::reservation::{ReservationTable, RobotId};

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
        row[robot] = crate::encode::encode_step(prev, next);
        prev = next;
    }
}

fn park(table: &mut ReservationTable, robot: RobotId, cell: mapf_core::CellIndex, horizon: u32) {
    for t in 1..=horizon {
        let _ = table.reserve(cell, cell, t, robot, false);
    }
}

/// Independent-planning coordinator with an improvement pass (spec.md §4.E).
pub struct DetourCoordinator<'a> {
    env: &'a dyn Environment,
    oracle: &'a mut DistanceOracle,
    replanning_period: u32,
    time_horizon: u32,
}

impl<'a> DetourCoordinator<'a> {
    pub fn new(
        env: &'a dyn Environment,
        oracle: &'a mut DistanceOracle,
        replanning_period: u32,
        time_horizon: u32,
    ) -> Self {
        Self { env, oracle, replanning_period, time_horizon }
    }

    pub fn plan(&mut self, order: &[usize], deadline: &Deadline) -> CoordinatorResult {
        let n = self.env.num_agents();
        let mut table = ReservationTable::new();
        let mut committed: Vec<Option<Vec<RobotState>>> = vec![None; n];
        let mut goal_less: HashSet<RobotId> = HashSet::new();

        for robot in 0..n {
            let state = self.env.robot_state(robot);
            park(&mut table, robot, state.cell, self.time_horizon);
            if self.env.goal_queue(robot).is_empty() {
                goal_less.insert(robot);
            }
        }

        // FIND_PATH: sweep until a full sweep commits nothing new.
        loop {
            let mut made_progress = false;
            for &robot in order {
                if goal_less.contains(&robot) || committed[robot].is_some() {
                    continue;
                }

                let state = self.env.robot_state(robot);
                let goal = self.env.goal_queue(robot)[0];
                if let Some(path) = plan_single_agent(
                    self.env,
                    self.oracle,
                    &table,
                    robot,
                    state.cell,
                    state.facing,
                    goal,
                    self.time_horizon,
                ) {
                    table.revoke_all_of(robot); // release the parking slots
                    if try_commit_strict(&mut table, robot, state, &path, self.time_horizon) {
                        committed[robot] = Some(path);
                        made_progress = true;
                    } else {
                        park(&mut table, robot, state.cell, self.time_horizon);
                    }
                }

                if deadline.expired() {
                    return self.finish(&committed, &goal_less);
                }
            }
            if !made_progress {
                break;
            }
            if deadline.expired() {
                return self.finish(&committed, &goal_less);
            }
        }

        // IMPROVE: sweep robots with a committed path, replacing it with a
        // strictly shorter one when one can be found, until a sweep
        // produces zero replacements.
        loop {
            let mut improved_any = false;
            for &robot in order {
                if deadline.expired() {
                    return self.finish(&committed, &goal_less);
                }
                let Some(old_path) = committed[robot].clone() else { continue };

                let state = self.env.robot_state(robot);
                let goal = self.env.goal_queue(robot)[0];
                table.revoke_all_of(robot);

                let candidate = plan_single_agent(
                    self.env,
                    self.oracle,
                    &table,
                    robot,
                    state.cell,
                    state.facing,
                    goal,
                    self.time_horizon,
                );

                let replaced = candidate.as_ref().is_some_and(|p| p.len() < old_path.len())
                    && candidate
                        .as_ref()
                        .is_some_and(|p| try_commit_strict(&mut table, robot, state, p, self.time_horizon));

                if replaced {
                    committed[robot] = candidate;
                    improved_any = true;
                } else {
                    // restore the previous path; it was already proven to
                    // fit the table before we revoked it, so this cannot fail.
                    try_commit_strict(&mut table, robot, state, &old_path, self.time_horizon);
                }
            }
            if !improved_any || deadline.expired() {
                break;
            }
        }

        self.finish(&committed, &goal_less)
    }

    fn finish(
        &self,
        committed: &[Option<Vec<RobotState>>],
        goal_less: &HashSet<RobotId>,
    ) -> CoordinatorResult {
        let n = self.env.num_agents();
        let mut tape = empty_tape(self.replanning_period, n);
        let mut stuck_ids = HashSet::new();
        let mut total_length: u64 = 0;

        for robot in 0..n {
            let state = self.env.robot_state(robot);
            match &committed[robot] {
                Some(path) => {
                    write_path_into_tape(&mut tape, robot, state, path);
                    total_length += path.len() as u64;
                }
                None if goal_less.contains(&robot) => {
                    // tape row already WAIT; no score penalty, matching the
                    // priority coordinator's treatment of goal-less robots.
                }
                None => {
                    stuck_ids.insert(robot);
                    total_length += self.time_horizon as u64;
                }
            }
        }

        CoordinatorResult { tape, total_length, stuck_ids }
    }
}
