//! Wall-clock budget tracking (spec.md §5 "suspension points").
//!
//! The planner never yields mid-search; it only *observes* elapsed time at
//! well-defined checkpoints (before each restart iteration, after every
//! robot in the detour sweep). `Deadline` is that observation point, built
//! once per `plan_tick` call from the already-resolved [`mapf_core::Budget`].

use std::time::{Duration, Instant};

use mapf_core::Budget;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn new(budget: Budget) -> Self {
        Self { start: Instant::now(), budget: budget.as_duration() }
    }

    /// A deadline that never expires, for unit tests that don't care about
    /// wall-clock behavior.
    pub fn unbounded() -> Self {
        Self::new(Budget::Unbounded)
    }

    pub fn expired(&self) -> bool {
        match self.budget {
            None => false,
            Some(d) => self.start.elapsed() >= d,
        }
    }

    /// Time left before expiry, or `None` if unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget.map(|d| d.saturating_sub(self.start.elapsed()))
    }
}
