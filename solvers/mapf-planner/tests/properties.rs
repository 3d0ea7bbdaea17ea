//! Property tests for the invariants listed in spec.md §8.

use std::collections::{HashSet, VecDeque};

use mapf_core::{ActionKind, Budget, Config, Environment, Facing, GridEnvironment, GridMap, RobotState};
use mapf_planner::Planner;
use proptest::prelude::*;

/// Build an open `width x height` grid with `n` robots placed on distinct
/// cells along row 0, each with a goal on the opposite end of its row,
/// facing East/West as appropriate. Small and regular enough that most
/// random seeds produce a solvable instance while still exercising genuine
/// inter-robot contention.
fn open_grid_scenario(width: u32, n: usize) -> GridEnvironment {
    let map = GridMap::from_bytes(width, 1, &vec![1u8; width as usize]).unwrap();
    let mut robots = Vec::with_capacity(n);
    let mut goals = Vec::with_capacity(n);
    for i in 0..n {
        let cell = i as u32;
        let goal = width - 1 - i as u32;
        let facing = if goal >= cell { Facing::East } else { Facing::West };
        robots.push(RobotState { cell, facing });
        goals.push(VecDeque::from([goal]));
    }
    GridEnvironment::new(map, robots, goals)
}

fn apply(env: &mut GridEnvironment, actions: &[ActionKind]) {
    for (agent, action) in actions.iter().enumerate() {
        let state = env.robot_state(agent);
        let next = match action {
            ActionKind::Forward => {
                let cols = env.cols();
                let (row, col) = mapf_core::row_col_of(state.cell, cols);
                let (dr, dc) = state.facing.forward_delta();
                let cell = mapf_core::cell_of((row as i32 + dr) as u32, (col as i32 + dc) as u32, cols);
                RobotState { cell, facing: state.facing }
            }
            ActionKind::RotateCw => RobotState { cell: state.cell, facing: state.facing.rotate_cw() },
            ActionKind::RotateCcw => RobotState { cell: state.cell, facing: state.facing.rotate_ccw() },
            ActionKind::Wait => state,
        };
        env.set_robot_state(agent, next);
    }
}

proptest! {
    /// Invariant 1 & 2: applying one planned action vector never puts two
    /// robots on the same cell, and never swaps two robots through each
    /// other.
    #[test]
    fn no_cell_or_swap_collisions(
        width in 4u32..9,
        n in 2usize..5,
        seed in any::<u64>(),
        ticks in 1usize..6,
    ) {
        let n = n.min(width as usize);
        let mut env = open_grid_scenario(width, n);
        let mut config = Config::default();
        config.replanning_period = 3;
        config.time_horizon = 6;
        config.restart_count = Some(3);
        let mut planner = Planner::new(config, seed).unwrap();

        for _ in 0..ticks {
            let before_cells: Vec<_> = (0..n).map(|a| env.robot_state(a).cell).collect();
            let actions = planner.plan_tick(&env, Budget::Unbounded);
            prop_assert_eq!(actions.len(), n);
            apply(&mut env, &actions);
            let after_cells: Vec<_> = (0..n).map(|a| env.robot_state(a).cell).collect();

            let mut seen = HashSet::new();
            for &cell in &after_cells {
                prop_assert!(seen.insert(cell), "two robots share cell {}", cell);
            }
            for a in 0..n {
                for b in (a + 1)..n {
                    prop_assert!(
                        !(before_cells[a] == after_cells[b] && before_cells[b] == after_cells[a] && before_cells[a] != after_cells[a]),
                        "robots {} and {} swapped cells", a, b
                    );
                }
            }
        }
    }

    /// Invariant 3: every emitted Forward action was executable — the cell
    /// ahead was in-bounds and not an obstacle — at the moment it was
    /// emitted.
    #[test]
    fn forward_actions_are_always_legal(
        width in 4u32..9,
        n in 1usize..4,
        seed in any::<u64>(),
        ticks in 1usize..6,
    ) {
        let n = n.min(width as usize);
        let mut env = open_grid_scenario(width, n);
        let mut config = Config::default();
        config.replanning_period = 3;
        config.time_horizon = 6;
        let mut planner = Planner::new(config, seed).unwrap();

        for _ in 0..ticks {
            let actions = planner.plan_tick(&env, Budget::Unbounded);
            for (agent, action) in actions.iter().enumerate() {
                if *action == ActionKind::Forward {
                    let state = env.robot_state(agent);
                    let cols = env.cols();
                    let (row, col) = mapf_core::row_col_of(state.cell, cols);
                    let (dr, dc) = state.facing.forward_delta();
                    let (nr, nc) = (row as i32 + dr, col as i32 + dc);
                    prop_assert!(nr >= 0 && nc >= 0 && (nr as u32) < env.rows() && (nc as u32) < cols);
                    let ahead = mapf_core::cell_of(nr as u32, nc as u32, cols);
                    prop_assert!(!env.is_obstacle(ahead));
                }
            }
            apply(&mut env, &actions);
        }
    }

    /// Invariant 4: a robot with an empty goal queue always emits WAIT.
    #[test]
    fn goal_less_robot_always_waits(width in 2u32..8, seed in any::<u64>()) {
        let map = GridMap::from_bytes(width, 1, &vec![1u8; width as usize]).unwrap();
        let env = GridEnvironment::new(
            map,
            vec![RobotState { cell: 0, facing: Facing::East }],
            vec![VecDeque::new()],
        );
        let mut planner = Planner::new(Config::default(), seed).unwrap();
        let actions = planner.plan_tick(&env, Budget::Unbounded);
        prop_assert_eq!(actions, vec![ActionKind::Wait]);
    }

    /// Invariant 7: a fixed seed, fixed environment, and a fixed (iteration
    /// count, not wall-clock) budget yield identical action tapes.
    #[test]
    fn deterministic_given_fixed_seed_and_bounded_iterations(
        width in 4u32..9,
        n in 2usize..4,
        seed in any::<u64>(),
    ) {
        let n = n.min(width as usize);
        let env = open_grid_scenario(width, n);
        let mut config = Config::default();
        config.restart_count = Some(4);
        config.shuffle_on_first_replan = true;

        let mut p1 = Planner::new(config.clone(), seed).unwrap();
        let mut p2 = Planner::new(config, seed).unwrap();
        prop_assert_eq!(
            p1.plan_tick(&env, Budget::Unbounded),
            p2.plan_tick(&env, Budget::Unbounded)
        );
    }
}
