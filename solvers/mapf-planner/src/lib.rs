//! Space-time A* MAPF planner core for rotating robots.
//!
//! Wires together the distance oracle, reservation table, single-agent
//! planner, priority/detour coordinators, and restart driver behind the two
//! entry points an outer tick loop consumes: [`Planner::new`] and
//! [`Planner::plan_tick`].

mod astar;
mod commit;
mod deadline;
mod detour;
mod driver;
mod encode;
mod heuristic;
mod priority;
mod reservation;

pub use astar::plan_single_agent;
pub use deadline::Deadline;
pub use detour::DetourCoordinator;
pub use driver::RestartDriver;
pub use encode::{encode_step, write_tape_row};
pub use heuristic::DistanceOracle;
pub use priority::{CoordinatorResult, PriorityCoordinator};
pub use reservation::{ReservationTable, RevokedEntry, RobotId};

use mapf_core::{ActionKind, Budget, Config, Environment, PlannerError};

/// Top-level entry point consumed by the outer simulation loop (spec.md
/// §6): construct once per run, then call [`Planner::plan_tick`] once per
/// simulation tick.
pub struct Planner {
    driver: RestartDriver,
}

impl Planner {
    /// Build a planner from a recognized [`Config`] (spec.md §6). The only
    /// fallible path in the planner's lifetime: an unrecognized heuristic or
    /// strategy name is a [`PlannerError::ConfigError`], surfaced here and
    /// nowhere else (spec.md §7).
    pub fn new(config: Config, seed: u64) -> Result<Self, PlannerError> {
        if config.replanning_period == 0 {
            return Err(PlannerError::ConfigError {
                field: "replanningPeriod",
                value: config.replanning_period.to_string(),
            });
        }
        if config.time_horizon == 0 || config.time_horizon < config.replanning_period {
            return Err(PlannerError::ConfigError {
                field: "timeHorizon",
                value: config.time_horizon.to_string(),
            });
        }

        let oracle = DistanceOracle::new(config.heuristic);
        let driver = RestartDriver::new(
            seed,
            oracle,
            config.replanning_period,
            config.time_horizon,
            config.restarts,
            config.restart_count,
            config.shuffle_on_first_replan,
            config.try_fix_waiting_robots,
            config.high_level_planner,
        );

        Ok(Self { driver })
    }

    /// Preprocessing hook (spec.md §6's `initialize(preprocessBudget)`). The
    /// HARD CORE has no work to front-load before the first tick — the
    /// distance-map cache fills lazily on first query (spec.md §4.A) — so
    /// this always succeeds; it exists so the outer loop has a uniform
    /// two-entry-point contract regardless of strategy.
    pub fn initialize(&mut self, _preprocess_budget: Budget) -> bool {
        true
    }

    /// Plan one tick for every agent in `env`, returning exactly N actions
    /// (spec.md §7's "must always return exactly N actions" policy).
    pub fn plan_tick(&mut self, env: &dyn Environment, budget: Budget) -> Vec<ActionKind> {
        self.driver.plan_tick(env, budget)
    }
}
