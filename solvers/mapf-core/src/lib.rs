//! Core MAPF types, the `Environment` seam, and the MovingAI format parser.
//!
//! Provides the data model the planner core (`mapf-planner`) is written
//! against — cell/facing arithmetic, the `Environment` trait, recognized
//! configuration, and the error taxonomy — plus parsers for the MovingAI
//! `.map` and `.scen` formats used to build test/example environments.

mod action;
mod cell;
mod config;
mod environment;
mod error;
mod facing;
mod map;
mod scenario;

pub use action::ActionKind;
pub use cell::{cell_of, pose_key, row_col_of, CellIndex};
pub use config::{Budget, Config, HeuristicKind, StrategyKind, UNBOUNDED_BUDGET_MS};
pub use environment::{Environment, GridEnvironment, RobotState};
pub use error::PlannerError;
pub use facing::Facing;
pub use map::{GridMap, MapError, Tile};
pub use scenario::{Scenario, ScenarioEntry, ScenarioError};
