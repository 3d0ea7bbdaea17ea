//! End-to-end scenarios from spec.md §8.

use std::collections::VecDeque;

use mapf_core::{
    cell_of, ActionKind, Budget, Config, Environment, Facing, GridEnvironment, GridMap,
    HeuristicKind, RobotState, StrategyKind,
};
use mapf_planner::Planner;
use pretty_assertions::assert_eq;

fn grid_env(rows: &[&str], robots: Vec<RobotState>, goals: Vec<Vec<u32>>) -> GridEnvironment {
    let height = rows.len() as u32;
    let width = rows[0].len() as u32;
    let mut data = Vec::with_capacity((width * height) as usize);
    for row in rows {
        for ch in row.chars() {
            data.push(if ch == '#' { 0 } else { 1 });
        }
    }
    let map = GridMap::from_bytes(width, height, &data).expect("valid grid");
    let goals = goals.into_iter().map(VecDeque::from).collect();
    GridEnvironment::new(map, robots, goals)
}

/// Apply one action vector to an environment's robots in place, enough to
/// advance the scenarios below without needing the (out-of-scope) outer tick
/// loop's full semantics.
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
        if env.goal_queue(agent).first() == Some(&next.cell) {
            env.advance_goal(agent);
        }
    }
}

fn verify_no_collisions(before: &GridEnvironment, actions: &[ActionKind], after: &GridEnvironment) {
    let n = before.num_agents();
    let mut occupied = std::collections::HashMap::new();
    for agent in 0..n {
        let cell = after.robot_state(agent).cell;
        assert!(
            occupied.insert(cell, agent).is_none(),
            "two robots occupy cell {cell} after applying {actions:?}"
        );
    }
    for a in 0..n {
        for b in (a + 1)..n {
            let a_before = before.robot_state(a).cell;
            let a_after = after.robot_state(a).cell;
            let b_before = before.robot_state(b).cell;
            let b_after = after.robot_state(b).cell;
            assert!(
                !(a_before == b_after && b_before == a_after && a_before != a_after),
                "robots {a} and {b} swapped cells"
            );
        }
    }
}

#[test]
fn s1_turn_to_goal() {
    // 4x4 grid, robot at (0,0) facing East, obstacles at (0,1) and (1,1),
    // goal at (0,2): the wall sits directly ahead (in the robot's own row)
    // so the first action must be a turn, not an attempted forward.
    let env = grid_env(
        &[".#..", ".#..", "....", "...."],
        vec![RobotState { cell: cell_of(0, 0, 4), facing: Facing::East }],
        vec![vec![cell_of(0, 2, 4)]],
    );
    let mut config = Config::default();
    config.heuristic = HeuristicKind::Manhattan;
    let mut planner = Planner::new(config, 0).unwrap();
    let actions = planner.plan_tick(&env, Budget::Unbounded);
    assert_ne!(actions[0], ActionKind::Forward);
    assert!(matches!(actions[0], ActionKind::RotateCw | ActionKind::RotateCcw));
}

#[test]
fn s2_head_on_deadlock_returns_all_wait() {
    let env = grid_env(
        &[".."],
        vec![
            RobotState { cell: 0, facing: Facing::East },
            RobotState { cell: 1, facing: Facing::West },
        ],
        vec![vec![1], vec![0]],
    );
    let mut config = Config::default();
    config.replanning_period = 2;
    config.time_horizon = 2;
    config.restarts = true;
    config.restart_count = Some(4);
    let mut planner = Planner::new(config, 0).unwrap();
    let actions = planner.plan_tick(&env, Budget::Unbounded);
    assert_eq!(actions, vec![ActionKind::Wait, ActionKind::Wait]);
}

#[test]
fn s3_one_gap_standoff_both_wait() {
    let env = grid_env(
        &["..."],
        vec![
            RobotState { cell: 0, facing: Facing::East },
            RobotState { cell: 2, facing: Facing::West },
        ],
        vec![vec![2], vec![0]],
    );
    let mut config = Config::default();
    config.replanning_period = 2;
    config.time_horizon = 4;
    let mut planner = Planner::new(config, 0).unwrap();
    let actions = planner.plan_tick(&env, Budget::Unbounded);
    assert_eq!(actions, vec![ActionKind::Wait, ActionKind::Wait]);
}

#[test]
fn s4_cross_junction_all_reach_goals_within_20_ticks() {
    // 4-wide corridor, one robot east-bound along the top row, the other
    // south-bound through the middle column; exactly one must yield.
    let rows = ["....", "....", "....", "...."];
    let env = grid_env(
        rows,
        vec![
            RobotState { cell: cell_of(0, 0, 4), facing: Facing::East },
            RobotState { cell: cell_of(0, 2, 4), facing: Facing::South },
        ],
        vec![vec![cell_of(0, 3, 4)], vec![cell_of(3, 2, 4)]],
    );
    let mut config = Config::default();
    config.replanning_period = 4;
    config.time_horizon = 6;
    config.restart_count = Some(6);
    let mut planner = Planner::new(config, 3).unwrap();

    let mut env = env;
    let mut reached = [false; 2];
    for _ in 0..20 {
        if reached.iter().all(|&r| r) {
            break;
        }
        let before = env.clone();
        let actions = planner.plan_tick(&env, Budget::Unbounded);
        assert_eq!(actions.len(), 2);
        apply(&mut env, &actions);
        verify_no_collisions(&before, &actions, &env);
        for agent in 0..2 {
            if env.goal_queue(agent).is_empty() {
                reached[agent] = true;
            }
        }
    }
    assert!(reached.iter().all(|&r| r), "both robots should reach their goals within 20 ticks");
}

#[test]
fn s5_priority_sensitive_deadlock_needs_restarts_and_horizon() {
    // Narrow corridor with a side-pocket only the westbound robot can use;
    // with restarts and a sufficiently large horizon both robots succeed.
    let rows = ["#....#", "......"];
    let env = grid_env(
        rows,
        vec![
            RobotState { cell: cell_of(1, 0, 6), facing: Facing::East },
            RobotState { cell: cell_of(1, 5, 6), facing: Facing::West },
        ],
        vec![vec![cell_of(1, 5, 6)], vec![cell_of(1, 0, 6)]],
    );
    let mut config = Config::default();
    config.replanning_period = 3;
    config.time_horizon = 10;
    config.restarts = true;
    config.restart_count = Some(12);
    config.shuffle_on_first_replan = true;
    let mut planner = Planner::new(config, 11).unwrap();

    let mut env = env;
    let mut reached = [false; 2];
    for _ in 0..40 {
        if reached.iter().all(|&r| r) {
            break;
        }
        let before = env.clone();
        let actions = planner.plan_tick(&env, Budget::Unbounded);
        assert_eq!(actions.len(), 2);
        apply(&mut env, &actions);
        verify_no_collisions(&before, &actions, &env);
        for agent in 0..2 {
            if env.goal_queue(agent).is_empty() {
                reached[agent] = true;
            }
        }
    }
    // With restarts enabled and a generous horizon, the restart driver's
    // permutation search should find the ordering that lets the side-pocket
    // robot yield and both robots finish (spec.md §8 S5).
    assert!(reached.iter().all(|&r| r), "both robots should reach their goals with restarts enabled");
}

#[test]
fn s6_stuck_cell_pre_reservation_lets_trailing_robot_move() {
    let env = grid_env(
        &["#..", "..."],
        vec![
            RobotState { cell: cell_of(0, 1, 3), facing: Facing::North },
            RobotState { cell: cell_of(1, 1, 3), facing: Facing::East },
        ],
        vec![vec![], vec![cell_of(1, 2, 3)]],
    );
    let mut config = Config::default();
    config.replanning_period = 2;
    config.time_horizon = 4;
    let mut planner = Planner::new(config, 0).unwrap();
    let actions = planner.plan_tick(&env, Budget::Unbounded);
    assert_eq!(actions[1], ActionKind::Forward);
}

#[test]
fn goal_fixpoint_empty_queue_emits_wait() {
    let env = grid_env(
        &["..."],
        vec![RobotState { cell: 1, facing: Facing::East }],
        vec![vec![]],
    );
    let mut planner = Planner::new(Config::default(), 0).unwrap();
    let actions = planner.plan_tick(&env, Budget::Unbounded);
    assert_eq!(actions, vec![ActionKind::Wait]);
}

#[test]
fn determinism_given_fixed_seed_and_iteration_bound() {
    let env = grid_env(
        &["....."],
        vec![
            RobotState { cell: 0, facing: Facing::East },
            RobotState { cell: 4, facing: Facing::West },
        ],
        vec![vec![4], vec![0]],
    );
    let mut config = Config::default();
    config.restart_count = Some(5);
    config.shuffle_on_first_replan = true;

    let mut p1 = Planner::new(config.clone(), 99).unwrap();
    let mut p2 = Planner::new(config, 99).unwrap();
    assert_eq!(p1.plan_tick(&env, Budget::Unbounded), p2.plan_tick(&env, Budget::Unbounded));
}

#[test]
fn priority_detour_strategy_reaches_goals_in_open_corridor() {
    let env = grid_env(
        &["....."],
        vec![
            RobotState { cell: 0, facing: Facing::East },
            RobotState { cell: 4, facing: Facing::West },
        ],
        vec![vec![4], vec![0]],
    );
    let mut config = Config::default();
    config.high_level_planner = StrategyKind::PriorityDetour;
    config.restart_count = Some(6);
    config.replanning_period = 4;
    config.time_horizon = 8;
    let mut planner = Planner::new(config, 5).unwrap();

    let mut env = env;
    let mut reached = [false; 2];
    for _ in 0..15 {
        if reached.iter().all(|&r| r) {
            break;
        }
        let actions = planner.plan_tick(&env, Budget::Unbounded);
        apply(&mut env, &actions);
        for agent in 0..2 {
            if env.goal_queue(agent).is_empty() {
                reached[agent] = true;
            }
        }
    }
    assert!(reached.iter().all(|&r| r));
}
