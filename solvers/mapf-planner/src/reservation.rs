//! Space-time occupancy and swap-edge registry (spec.md §4.B).
//!
//! Keys are packed integers rather than tuples, per spec.md §9's design
//! note: a cell reservation at time `t` and a swap reservation `from -> to`
//! at time `t` are folded into disjoint `u64` key spaces so one `HashMap`
//! per relation suffices and no tuple hashing overhead is paid per lookup.

use std::collections::HashMap;

use mapf_core::CellIndex;

pub type RobotId = usize;

/// One entry revoked by [`ReservationTable::revoke_all_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokedEntry {
    Cell { cell: CellIndex, t: u32 },
    Swap { from: CellIndex, to: CellIndex, t: u32 },
}

#[inline]
fn cell_time_key(cell: CellIndex, t: u32) -> u64 {
    ((cell as u64) << 32) | (t as u64)
}

#[inline]
fn swap_key(from: CellIndex, to: CellIndex, t: u32) -> u128 {
    ((from as u128) << 64) | ((to as u128) << 32) | (t as u128)
}

/// Space-time reservation table shared by every single-agent search within
/// one coordinator pass.
#[derive(Debug, Default)]
pub struct ReservationTable {
    cells: HashMap<u64, RobotId>,
    swaps: HashMap<u128, RobotId>,
    owned_cells: HashMap<RobotId, Vec<(CellIndex, u32)>>,
    owned_swaps: HashMap<RobotId, Vec<(CellIndex, CellIndex, u32)>>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff moving `from -> to` at time `t` would collide with another
    /// robot's reservation: either `to` is already held by someone other
    /// than `asking`, or the opposing swap `to -> from` at `t` is taken.
    pub fn is_blocked(&self, from: CellIndex, to: CellIndex, t: u32, asking: RobotId) -> bool {
        if let Some(&owner) = self.cells.get(&cell_time_key(to, t)) {
            if owner != asking {
                return true;
            }
        }
        if from != to && self.swaps.contains_key(&swap_key(to, from, t)) {
            return true;
        }
        false
    }

    /// Reserve the move `from -> to` at time `t` for `owner`. Inserts the
    /// cell entry and, if `from != to`, the swap entry — atomically: either
    /// both land or neither does. Idempotent self-reservation (same owner,
    /// same key) is a no-op. With `strict`, a cell entry already held by a
    /// different owner fails with `ReservationConflict` and nothing is
    /// mutated.
    pub fn reserve(
        &mut self,
        from: CellIndex,
        to: CellIndex,
        t: u32,
        owner: RobotId,
        strict: bool,
    ) -> Result<(), mapf_core::PlannerError> {
        let ck = cell_time_key(to, t);
        if let Some(&existing) = self.cells.get(&ck) {
            if existing == owner {
                // Idempotent self-reservation; the swap entry (if any) is
                // already present from the same call that set the cell.
                return Ok(());
            }
            if strict {
                return Err(mapf_core::PlannerError::ReservationConflict {
                    cell: to,
                    t,
                    owner: existing,
                });
            }
        }

        self.cells.insert(ck, owner);
        self.owned_cells.entry(owner).or_default().push((to, t));

        if from != to {
            let sk = swap_key(from, to, t);
            self.swaps.insert(sk, owner);
            self.owned_swaps.entry(owner).or_default().push((from, to, t));
        }

        Ok(())
    }

    /// Remove every entry owned by `owner`, returning what was removed so
    /// the caller may roll back or re-reserve elsewhere.
    pub fn revoke_all_of(&mut self, owner: RobotId) -> Vec<RevokedEntry> {
        let mut removed = Vec::new();

        if let Some(cells) = self.owned_cells.remove(&owner) {
            for (cell, t) in cells {
                self.cells.remove(&cell_time_key(cell, t));
                removed.push(RevokedEntry::Cell { cell, t });
            }
        }
        if let Some(swaps) = self.owned_swaps.remove(&owner) {
            for (from, to, t) in swaps {
                self.swaps.remove(&swap_key(from, to, t));
                removed.push(RevokedEntry::Swap { from, to, t });
            }
        }

        removed
    }

    /// The robot owning the cell reservation at `(cell, t)`, if any.
    pub fn owner_of_cell(&self, cell: CellIndex, t: u32) -> Option<RobotId> {
        self.cells.get(&cell_time_key(cell, t)).copied()
    }
}
