//! The `Environment` trait: the external, per-tick view the planner queries.
//!
//! The simulation environment itself — grid storage, obstacle placement,
//! goal assignment — is an external collaborator, out of scope for this
//! workspace. This trait is the seam the planner core is written against; a
//! `GridEnvironment` reference implementation is provided below for the
//! planner's own test suite and examples.

use std::collections::VecDeque;

use crate::cell::CellIndex;
use crate::facing::Facing;
use crate::map::GridMap;

/// The instantaneous pose of one robot: cell plus facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RobotState {
    pub cell: CellIndex,
    pub facing: Facing,
}

/// An immutable-per-tick view of the grid, obstacles, and every robot's
/// current pose and goal queue.
pub trait Environment {
    /// Number of grid rows.
    fn rows(&self) -> u32;

    /// Number of grid columns.
    fn cols(&self) -> u32;

    /// True if `cell` is an obstacle (impassable).
    fn is_obstacle(&self, cell: CellIndex) -> bool;

    /// Number of robots in the simulation.
    fn num_agents(&self) -> usize;

    /// The current pose of robot `agent`.
    fn robot_state(&self, agent: usize) -> RobotState;

    /// The goal queue of robot `agent`; the first entry, if any, is the
    /// active target cell. An empty slice means the robot has no goal.
    fn goal_queue(&self, agent: usize) -> &[CellIndex];
}

/// A reference `Environment` over a parsed [`GridMap`], used by this crate's
/// and `mapf-planner`'s own tests and examples. Not part of the HARD CORE.
#[derive(Debug, Clone)]
pub struct GridEnvironment {
    map: GridMap,
    robots: Vec<RobotState>,
    goals: Vec<VecDeque<CellIndex>>,
}

impl GridEnvironment {
    pub fn new(map: GridMap, robots: Vec<RobotState>, goals: Vec<VecDeque<CellIndex>>) -> Self {
        assert_eq!(
            robots.len(),
            goals.len(),
            "every robot needs a (possibly empty) goal queue"
        );
        Self { map, robots, goals }
    }

    /// Pop the active goal of `agent`, if any, revealing the next one.
    pub fn advance_goal(&mut self, agent: usize) {
        self.goals[agent].pop_front();
    }

    /// Overwrite the pose of `agent` (used by the outer tick loop after
    /// applying an action; kept here for test convenience).
    pub fn set_robot_state(&mut self, agent: usize, state: RobotState) {
        self.robots[agent] = state;
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }
}

impl Environment for GridEnvironment {
    fn rows(&self) -> u32 {
        self.map.height()
    }

    fn cols(&self) -> u32 {
        self.map.width()
    }

    fn is_obstacle(&self, cell: CellIndex) -> bool {
        let cols = self.cols();
        let (row, col) = crate::cell::row_col_of(cell, cols);
        !self.map.is_passable(col, row)
    }

    fn num_agents(&self) -> usize {
        self.robots.len()
    }

    fn robot_state(&self, agent: usize) -> RobotState {
        self.robots[agent]
    }

    fn goal_queue(&self, agent: usize) -> &[CellIndex] {
        self.goals[agent].as_slices().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::GridMap;

    fn open_map(width: u32, height: u32) -> GridMap {
        GridMap::from_bytes(width, height, &vec![1u8; (width * height) as usize]).unwrap()
    }

    #[test]
    fn grid_environment_reports_obstacles_by_cell_index() {
        let mut data = vec![1u8; 9];
        data[4] = 0; // (1,1) blocked in a 3x3 map
        let map = GridMap::from_bytes(3, 3, &data).unwrap();
        let env = GridEnvironment::new(
            map,
            vec![RobotState { cell: 0, facing: Facing::East }],
            vec![VecDeque::new()],
        );
        assert!(env.is_obstacle(crate::cell::cell_of(1, 1, 3)));
        assert!(!env.is_obstacle(crate::cell::cell_of(0, 0, 3)));
    }

    #[test]
    fn empty_goal_queue_means_no_active_target() {
        let map = open_map(2, 2);
        let env = GridEnvironment::new(
            map,
            vec![RobotState { cell: 0, facing: Facing::East }],
            vec![VecDeque::new()],
        );
        assert!(env.goal_queue(0).is_empty());
    }

    #[test]
    fn advance_goal_pops_the_active_target() {
        let map = open_map(2, 2);
        let mut goals = VecDeque::new();
        goals.push_back(1);
        goals.push_back(3);
        let mut env = GridEnvironment::new(
            map,
            vec![RobotState { cell: 0, facing: Facing::East }],
            vec![goals],
        );
        assert_eq!(env.goal_queue(0), &[1, 3]);
        env.advance_goal(0);
        assert_eq!(env.goal_queue(0), &[3]);
    }
}
