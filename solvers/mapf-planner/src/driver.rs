//! Time-bounded restart loop over priority permutations (spec.md §4.F).

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use mapf_core::{ActionKind, Budget, Environment, StrategyKind};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::deadline::Deadline;
use crate::detour::DetourCoordinator;
use crate::heuristic::DistanceOracle;
use crate::priority::{CoordinatorResult, PriorityCoordinator};
use crate::reservation::RobotId;

/// Safety factor applied to the rolling-window max when deciding whether
/// there's enough budget left for another restart iteration (spec.md §4.F
/// step 4's "default 2").
const SAFETY_FACTOR: u32 = 2;

/// How many consecutive shuffle draws to retry before concluding the
/// permutation space is exhausted for practical purposes.
const MAX_SHUFFLE_ATTEMPTS: u32 = 64;

/// `n!`, saturating at `u128::MAX` rather than overflowing — `n` beyond
/// about 34 already saturates a `u128` product, and at that size the
/// permutation space is effectively unbounded anyway, so saturation is the
/// right answer rather than a panic.
fn total_permutations(n: usize) -> u128 {
    (1..=n as u128).fold(1u128, |acc, k| acc.saturating_mul(k))
}

/// Time-bounded driver that explores priority permutations and alternates
/// high-level strategies, keeping the best-scoring tape found (spec.md §4.F).
pub struct RestartDriver {
    rng: StdRng,
    oracle: DistanceOracle,
    replanning_period: u32,
    time_horizon: u32,
    restarts: bool,
    restart_count: Option<u32>,
    shuffle_on_first_replan: bool,
    try_fix_waiting_robots: bool,
    high_level_planner: StrategyKind,

    ticks_since_replan: u32,
    tape: Vec<Vec<ActionKind>>,
    rolling_window: VecDeque<Duration>,
    first_replan_done: bool,
}

impl RestartDriver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seed: u64,
        oracle: DistanceOracle,
        replanning_period: u32,
        time_horizon: u32,
        restarts: bool,
        restart_count: Option<u32>,
        shuffle_on_first_replan: bool,
        try_fix_waiting_robots: bool,
        high_level_planner: StrategyKind,
    ) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            oracle,
            replanning_period,
            time_horizon,
            restarts,
            restart_count,
            shuffle_on_first_replan,
            try_fix_waiting_robots,
            high_level_planner,
            ticks_since_replan: replanning_period, // force a replan on first call
            tape: Vec::new(),
            rolling_window: VecDeque::with_capacity(10),
            first_replan_done: false,
        }
    }

    fn push_rolling(&mut self, d: Duration) {
        if self.rolling_window.len() == 10 {
            self.rolling_window.pop_front();
        }
        self.rolling_window.push_back(d);
    }

    fn rolling_max(&self) -> Duration {
        self.rolling_window.iter().max().copied().unwrap_or(Duration::ZERO)
    }

    /// Strategy used on restart-iteration `i` (fix-steps don't advance `i`).
    fn strategy_for(&self, i: u32) -> StrategyKind {
        match self.high_level_planner {
            StrategyKind::Priority => StrategyKind::Priority,
            StrategyKind::Detour => StrategyKind::Detour,
            StrategyKind::PriorityDetour => {
                if i % 2 == 0 {
                    StrategyKind::Priority
                } else {
                    StrategyKind::Detour
                }
            }
        }
    }

    fn run_strategy(
        &mut self,
        env: &dyn Environment,
        strategy: StrategyKind,
        order: &[usize],
        fix_stuck: &HashSet<RobotId>,
        deadline: &Deadline,
    ) -> CoordinatorResult {
        match strategy {
            StrategyKind::Priority => {
                let mut coord = PriorityCoordinator::new(
                    env,
                    &mut self.oracle,
                    self.replanning_period,
                    self.time_horizon,
                );
                coord.plan(order, fix_stuck)
            }
            StrategyKind::Detour => {
                let mut coord = DetourCoordinator::new(
                    env,
                    &mut self.oracle,
                    self.replanning_period,
                    self.time_horizon,
                );
                coord.plan(order, deadline)
            }
            StrategyKind::PriorityDetour => unreachable!("resolved to Priority/Detour before dispatch"),
        }
    }

    /// Draw a permutation not yet in `tried`, or `None` once the permutation
    /// space is exhausted (every one of the `n!` orderings has been tried, or
    /// `MAX_SHUFFLE_ATTEMPTS` consecutive draws all landed on one already
    /// tried — treated the same way, as exhaustion rather than a reason to
    /// keep spinning). Callers must stop restarting on `None`: otherwise, for
    /// a fully-explored (or tiny, e.g. `n<=1`) permutation space with no
    /// `restart_count` configured and an unbounded budget, the restart loop
    /// would never terminate.
    fn draw_fresh_permutation(&mut self, n: usize, tried: &HashSet<Vec<usize>>) -> Option<Vec<usize>> {
        if tried.len() as u128 >= total_permutations(n) {
            return None;
        }
        let mut candidate: Vec<usize> = (0..n).collect();
        for _ in 0..MAX_SHUFFLE_ATTEMPTS {
            candidate.shuffle(&mut self.rng);
            if !tried.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Called once per simulation tick; streams out a stored tape row until
    /// `replanning_period` ticks have elapsed, then replans from scratch
    /// within `budget` (spec.md §4.F).
    pub fn plan_tick(&mut self, env: &dyn Environment, budget: Budget) -> Vec<ActionKind> {
        if self.ticks_since_replan < self.replanning_period && !self.tape.is_empty() {
            let row = self.tape[self.ticks_since_replan as usize].clone();
            self.ticks_since_replan += 1;
            return row;
        }

        let deadline = Deadline::new(budget);
        let n = env.num_agents();
        let mut order: Vec<usize> = (0..n).collect();
        if !self.first_replan_done && self.shuffle_on_first_replan {
            order.shuffle(&mut self.rng);
        }
        self.first_replan_done = true;

        let mut tried: HashSet<Vec<usize>> = HashSet::new();
        tried.insert(order.clone());

        let mut iterations: u32 = 0;
        let mut best: Option<CoordinatorResult> = None;
        let mut last_stuck_ids: HashSet<RobotId> = HashSet::new();

        loop {
            let iter_start = Instant::now();

            // Fix-steps (below) don't alternate the PRIORITY_DETOUR strategy
            // and don't count toward `iterations` themselves, but the
            // iteration that follows one does, so this always reads the
            // current `iterations` count regardless of how we got here.
            let strategy = self.strategy_for(iterations);
            let result = self.run_strategy(env, strategy, &order, &HashSet::new(), &deadline);

            last_stuck_ids = result.stuck_ids.clone();
            let better = match &best {
                Some(b) => result.score() < b.score(),
                None => true,
            };
            tracing::trace!(
                iteration = iterations,
                ?strategy,
                ?order,
                score = ?result.score(),
                accepted = better,
                "restart iteration",
            );
            if better {
                best = Some(result);
            }

            self.push_rolling(iter_start.elapsed());
            iterations += 1;

            if !self.restarts {
                break;
            }
            if let Some(limit) = self.restart_count {
                if iterations >= limit {
                    break;
                }
            }
            if deadline.expired() {
                break;
            }
            if let Some(remaining) = deadline.remaining() {
                if remaining < self.rolling_max().saturating_mul(SAFETY_FACTOR) {
                    break;
                }
            }

            if self.try_fix_waiting_robots && !last_stuck_ids.is_empty() {
                let fix_start = Instant::now();
                let fix_result = {
                    let mut coord = PriorityCoordinator::new(
                        env,
                        &mut self.oracle,
                        self.replanning_period,
                        self.time_horizon,
                    );
                    coord.plan(&order, &last_stuck_ids)
                };
                let fix_better = match &best {
                    Some(b) => fix_result.score() < b.score(),
                    None => true,
                };
                if fix_better {
                    best = Some(fix_result);
                }
                self.push_rolling(fix_start.elapsed());

                if deadline.expired() {
                    break;
                }
                if let Some(remaining) = deadline.remaining() {
                    if remaining < self.rolling_max().saturating_mul(SAFETY_FACTOR) {
                        break;
                    }
                }
            }

            match self.draw_fresh_permutation(n, &tried) {
                Some(next_order) => {
                    order = next_order;
                    tried.insert(order.clone());
                }
                None => break,
            }
        }

        let best = best.expect("at least one iteration always runs");
        if best.stuck_count() == n && n > 0 {
            tracing::warn!(
                iterations,
                "no agent could be advanced this planning step; degrading to all-WAIT"
            );
        }
        tracing::debug!(iterations, score = ?best.score(), "replan complete");

        self.tape = best.tape;
        self.ticks_since_replan = 1;
        self.tape[0].clone()
    }
}
