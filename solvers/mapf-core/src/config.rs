//! Recognized planner configuration (spec.md §6).

use std::env;
use std::time::Duration;

use crate::error::PlannerError;

/// Sentinel budget value meaning "no limit", per the arena wire protocol.
pub const UNBOUNDED_BUDGET_MS: i64 = 2_147_483_647;

/// A wall-clock budget, with the arena's "unbounded" sentinel already
/// resolved to `None` at this boundary so internal code never tests the
/// magic constant directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Unbounded,
    Bounded(Duration),
}

impl Budget {
    /// Build a `Budget` from a millisecond count using the arena's sentinel
    /// convention.
    pub fn from_millis(ms: i64) -> Self {
        if ms >= UNBOUNDED_BUDGET_MS {
            Budget::Unbounded
        } else {
            Budget::Bounded(Duration::from_millis(ms.max(0) as u64))
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, Budget::Unbounded)
    }

    /// `None` if unbounded, else the remaining duration.
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Budget::Unbounded => None,
            Budget::Bounded(d) => Some(d),
        }
    }
}

/// Heuristic choice for the distance oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicKind {
    Manhattan,
    TrueDistance,
}

impl HeuristicKind {
    fn parse(value: &str) -> Result<Self, PlannerError> {
        match value.to_ascii_uppercase().as_str() {
            "MANHATTAN" => Ok(HeuristicKind::Manhattan),
            "TRUE_DISTANCE" => Ok(HeuristicKind::TrueDistance),
            other => Err(PlannerError::ConfigError {
                field: "heuristic",
                value: other.to_string(),
            }),
        }
    }
}

/// High-level planning strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Priority,
    Detour,
    PriorityDetour,
}

impl StrategyKind {
    fn parse(value: &str) -> Result<Self, PlannerError> {
        match value.to_ascii_uppercase().as_str() {
            "PRIORITY" => Ok(StrategyKind::Priority),
            "DETOUR" => Ok(StrategyKind::Detour),
            "PRIORITY_DETOUR" => Ok(StrategyKind::PriorityDetour),
            other => Err(PlannerError::ConfigError {
                field: "highLevelPlanner",
                value: other.to_string(),
            }),
        }
    }
}

/// Recognized planner configuration options (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Ticks between full replans. Must be >= 1.
    pub replanning_period: u32,
    /// Length of each committed path / reservation span. Must be >= 1 and
    /// >= `replanning_period`.
    pub time_horizon: u32,
    /// Enable the restart loop.
    pub restarts: bool,
    /// Max restart iterations per planning step. `None` means unbounded.
    pub restart_count: Option<u32>,
    /// Randomize the initial permutation on the very first replan.
    pub shuffle_on_first_replan: bool,
    /// Distance oracle choice.
    pub heuristic: HeuristicKind,
    /// Enable the fix-step in the restart driver.
    pub try_fix_waiting_robots: bool,
    /// High-level strategy selector.
    pub high_level_planner: StrategyKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replanning_period: 8,
            time_horizon: 10,
            restarts: true,
            restart_count: None,
            shuffle_on_first_replan: false,
            heuristic: HeuristicKind::Manhattan,
            try_fix_waiting_robots: false,
            high_level_planner: StrategyKind::Priority,
        }
    }
}

impl Config {
    /// Build a `Config` from `MAPF_*` environment variables, falling back to
    /// [`Config::default`] for anything unset. This is a convenience for
    /// embedding the planner in a process that wants env-var configuration;
    /// it is not the "configuration loading" spec.md scopes out (that is
    /// the outer simulator's CLI/config-file job) — it is simply an
    /// idiomatic constructor for the recognized-keys table in spec.md §6.
    pub fn from_env() -> Result<Self, PlannerError> {
        let defaults = Self::default();

        let parse_env = |name: &'static str, default: String| -> Result<String, PlannerError> {
            Ok(env::var(name).unwrap_or(default))
        };

        let replanning_period = parse_env(
            "MAPF_REPLANNING_PERIOD",
            defaults.replanning_period.to_string(),
        )?
        .parse()
        .map_err(|_| PlannerError::ConfigError {
            field: "replanningPeriod",
            value: env::var("MAPF_REPLANNING_PERIOD").unwrap_or_default(),
        })?;

        let time_horizon = parse_env("MAPF_TIME_HORIZON", defaults.time_horizon.to_string())?
            .parse()
            .map_err(|_| PlannerError::ConfigError {
                field: "timeHorizon",
                value: env::var("MAPF_TIME_HORIZON").unwrap_or_default(),
            })?;

        let restarts = parse_env("MAPF_RESTARTS", defaults.restarts.to_string())?
            .parse()
            .map_err(|_| PlannerError::ConfigError {
                field: "restarts",
                value: env::var("MAPF_RESTARTS").unwrap_or_default(),
            })?;

        let restart_count = match env::var("MAPF_RESTART_COUNT") {
            Ok(v) if v.eq_ignore_ascii_case("inf") || v.eq_ignore_ascii_case("unbounded") => None,
            Ok(v) => Some(v.parse().map_err(|_| PlannerError::ConfigError {
                field: "restartCount",
                value: v,
            })?),
            Err(_) => defaults.restart_count,
        };

        let shuffle_on_first_replan = parse_env(
            "MAPF_SHUFFLE_ON_FIRST_REPLAN",
            defaults.shuffle_on_first_replan.to_string(),
        )?
        .parse()
        .map_err(|_| PlannerError::ConfigError {
            field: "shuffleOnFirstReplan",
            value: env::var("MAPF_SHUFFLE_ON_FIRST_REPLAN").unwrap_or_default(),
        })?;

        let heuristic = HeuristicKind::parse(&parse_env("MAPF_HEURISTIC", "MANHATTAN".to_string())?)?;

        let try_fix_waiting_robots = parse_env(
            "MAPF_TRY_FIX_WAITING_ROBOTS",
            defaults.try_fix_waiting_robots.to_string(),
        )?
        .parse()
        .map_err(|_| PlannerError::ConfigError {
            field: "tryFixWaitingRobots",
            value: env::var("MAPF_TRY_FIX_WAITING_ROBOTS").unwrap_or_default(),
        })?;

        let high_level_planner =
            StrategyKind::parse(&parse_env("MAPF_HIGH_LEVEL_PLANNER", "PRIORITY".to_string())?)?;

        Ok(Self {
            replanning_period,
            time_horizon,
            restarts,
            restart_count,
            shuffle_on_first_replan,
            heuristic,
            try_fix_waiting_robots,
            high_level_planner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let c = Config::default();
        assert_eq!(c.replanning_period, 8);
        assert_eq!(c.time_horizon, 10);
        assert!(c.restarts);
        assert_eq!(c.restart_count, None);
        assert_eq!(c.heuristic, HeuristicKind::Manhattan);
        assert_eq!(c.high_level_planner, StrategyKind::Priority);
    }

    #[test]
    fn unbounded_budget_sentinel_maps_to_none() {
        let b = Budget::from_millis(UNBOUNDED_BUDGET_MS);
        assert!(b.is_unbounded());
        assert_eq!(b.as_duration(), None);
    }

    #[test]
    fn bounded_budget_keeps_its_duration() {
        let b = Budget::from_millis(500);
        assert_eq!(b.as_duration(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn heuristic_kind_rejects_unknown_names() {
        let err = HeuristicKind::parse("nope").unwrap_err();
        assert!(matches!(err, PlannerError::ConfigError { field: "heuristic", .. }));
    }

    #[test]
    fn strategy_kind_parses_case_insensitively() {
        assert_eq!(StrategyKind::parse("priority_detour").unwrap(), StrategyKind::PriorityDetour);
    }
}
