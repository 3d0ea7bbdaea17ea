//! Error taxonomy for the planner core.
//!
//! `ReservationConflict` and `NoPath` are recovered locally by the
//! coordinators (see `mapf-planner`) and never escape `Planner::plan_tick`.
//! `ConfigError` is the only variant that surfaces to a caller, at
//! `Planner::new` construction time.

use thiserror::Error;

use crate::cell::CellIndex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlannerError {
    #[error("reservation conflict on cell {cell} at t={t}, held by robot {owner}")]
    ReservationConflict {
        cell: CellIndex,
        t: u32,
        owner: usize,
    },

    #[error("no path found for robot {robot}")]
    NoPath { robot: usize },

    #[error("unknown {field}: {value}")]
    ConfigError { field: &'static str, value: String },
}
