//! Shared "commit a planned path under strict reservation" discipline used
//! by both coordinators (spec.md §4.D step 3, §4.E).

use mapf_core::RobotState;

use crate::reservation::{ReservationTable, RobotId};

/// Attempt to reserve every step of `path` (padded with its terminal pose
/// out to `horizon`) strictly for `robot`, starting from `start`. On the
/// first conflict, rolls back every reservation this call made and returns
/// `false` with the table unchanged; on full success the reservations are
/// left in place and `true` is returned.
pub fn try_commit_strict(
    table: &mut ReservationTable,
    robot: RobotId,
    start: RobotState,
    path: &[RobotState],
    horizon: u32,
) -> bool {
    let mut prev = start;
    for step in 1..=horizon {
        let pose = path
            .get((step - 1) as usize)
            .copied()
            .unwrap_or_else(|| *path.last().unwrap_or(&start));
        if table.reserve(prev.cell, pose.cell, step, robot, true).is_err() {
            table.revoke_all_of(robot);
            return false;
        }
        prev = pose;
    }
    true
}
