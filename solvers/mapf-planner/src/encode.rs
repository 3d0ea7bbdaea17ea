//! Converts a (cell, facing) trajectory into the action tape (spec.md §4.D.ii).

use mapf_core::{ActionKind, RobotState};

/// The action that moves a robot from `prev` to `next` in one step.
///
/// - cell changed → Forward
/// - facing changed by +1 mod 4 (or -3) → RotateCw
/// - facing changed by -1 mod 4 (or +3) → RotateCcw
/// - neither changed → Wait
pub fn encode_step(prev: RobotState, next: RobotState) -> ActionKind {
    if next.cell != prev.cell {
        return ActionKind::Forward;
    }
    if next.facing == prev.facing {
        return ActionKind::Wait;
    }
    let prev_ord = prev.facing as i32;
    let next_ord = next.facing as i32;
    let delta = (next_ord - prev_ord).rem_euclid(4);
    match delta {
        1 => ActionKind::RotateCw,
        3 => ActionKind::RotateCcw,
        _ => unreachable!("facing changed without a unit rotation: {} -> {}", prev_ord, next_ord),
    }
}

/// Fill one row of the action tape for every agent, comparing each agent's
/// pose at `path[i]` (or the terminal pose, if the path is shorter) against
/// its pose at `path[i-1]`.
pub fn write_tape_row(prev: &[RobotState], next: &[RobotState], row: &mut [ActionKind]) {
    debug_assert_eq!(prev.len(), next.len());
    debug_assert_eq!(prev.len(), row.len());
    for i in 0..prev.len() {
        row[i] = encode_step(prev[i], next[i]);
    }
}
