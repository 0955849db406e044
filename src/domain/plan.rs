use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ConfigError;

/// Pass threshold applied when the configuration does not set one.
pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 100.0;
/// How long the engine waits for workers after a stop before force-cancelling.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
/// Interval between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

const MIN_THRESHOLD: f64 = 0.0;
const MAX_THRESHOLD: f64 = 100.0;

/// When a worker stops iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    Iterations(u64),
    Elapsed(Duration),
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    threads: u64,
    iterations: u64,
    ramp_up: Duration,
    hold: Duration,
    duration: Option<Duration>,
    pacing: Duration,
    success_threshold_percent: f64,
    drain_timeout: Duration,
    max_duration: Option<Duration>,
    progress_interval: Duration,
    global_variables: BTreeMap<String, String>,
}

impl ExecutionPlan {
    #[must_use]
    pub fn builder(threads: u64, iterations: u64) -> ExecutionPlanBuilder {
        ExecutionPlanBuilder::new(threads, iterations)
    }

    #[must_use]
    pub const fn threads(&self) -> u64 {
        self.threads
    }

    #[must_use]
    pub const fn iterations(&self) -> u64 {
        self.iterations
    }

    #[must_use]
    pub const fn ramp_up(&self) -> Duration {
        self.ramp_up
    }

    #[must_use]
    pub const fn hold(&self) -> Duration {
        self.hold
    }

    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    #[must_use]
    pub const fn pacing(&self) -> Duration {
        self.pacing
    }

    #[must_use]
    pub const fn success_threshold_percent(&self) -> f64 {
        self.success_threshold_percent
    }

    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    #[must_use]
    pub const fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    #[must_use]
    pub const fn progress_interval(&self) -> Duration {
        self.progress_interval
    }

    #[must_use]
    pub const fn global_variables(&self) -> &BTreeMap<String, String> {
        &self.global_variables
    }

    /// Count-based unless `iterations` is 0, in which case `duration` bounds
    /// each worker's loop.
    #[must_use]
    pub fn stop_condition(&self) -> StopCondition {
        match (self.iterations, self.duration) {
            (0, Some(duration)) => StopCondition::Elapsed(duration),
            (iterations, _) => StopCondition::Iterations(iterations),
        }
    }

    /// Hard stop implied by the plan: the explicit `max_duration`, or for
    /// duration-based plans `ramp_up + duration + hold`.
    #[must_use]
    pub fn implied_deadline(&self) -> Option<Duration> {
        if let Some(max_duration) = self.max_duration {
            return Some(max_duration);
        }
        match self.stop_condition() {
            StopCondition::Elapsed(duration) => Some(
                self.ramp_up
                    .saturating_add(duration)
                    .saturating_add(self.hold),
            ),
            StopCondition::Iterations(_) => None,
        }
    }

    /// Returns the plan a scenario runs with after applying its overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when the merged plan fails validation.
    pub fn with_overrides(&self, overrides: &PlanOverrides) -> Result<Self, ConfigError> {
        let mut builder = ExecutionPlanBuilder::from_plan(self);
        if let Some(threads) = overrides.threads {
            builder.threads = threads;
        }
        if let Some(iterations) = overrides.iterations {
            builder.iterations = iterations;
        }
        if let Some(ramp_up) = overrides.ramp_up {
            builder.ramp_up = ramp_up;
        }
        if let Some(hold) = overrides.hold {
            builder.hold = hold;
        }
        if overrides.duration.is_some() {
            builder.duration = overrides.duration;
        }
        if let Some(pacing) = overrides.pacing {
            builder.pacing = pacing;
        }
        if let Some(threshold) = overrides.success_threshold_percent {
            builder.success_threshold_percent = threshold;
        }
        builder.build()
    }
}

/// Collects plan fields and freezes them into an [`ExecutionPlan`].
#[derive(Debug, Clone)]
pub struct ExecutionPlanBuilder {
    threads: u64,
    iterations: u64,
    ramp_up: Duration,
    hold: Duration,
    duration: Option<Duration>,
    pacing: Duration,
    success_threshold_percent: f64,
    drain_timeout: Duration,
    max_duration: Option<Duration>,
    progress_interval: Duration,
    global_variables: BTreeMap<String, String>,
}

impl ExecutionPlanBuilder {
    #[must_use]
    pub const fn new(threads: u64, iterations: u64) -> Self {
        Self {
            threads,
            iterations,
            ramp_up: Duration::ZERO,
            hold: Duration::ZERO,
            duration: None,
            pacing: Duration::ZERO,
            success_threshold_percent: DEFAULT_SUCCESS_THRESHOLD,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            max_duration: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            global_variables: BTreeMap::new(),
        }
    }

    fn from_plan(plan: &ExecutionPlan) -> Self {
        Self {
            threads: plan.threads,
            iterations: plan.iterations,
            ramp_up: plan.ramp_up,
            hold: plan.hold,
            duration: plan.duration,
            pacing: plan.pacing,
            success_threshold_percent: plan.success_threshold_percent,
            drain_timeout: plan.drain_timeout,
            max_duration: plan.max_duration,
            progress_interval: plan.progress_interval,
            global_variables: plan.global_variables.clone(),
        }
    }

    #[must_use]
    pub const fn ramp_up(mut self, ramp_up: Duration) -> Self {
        self.ramp_up = ramp_up;
        self
    }

    #[must_use]
    pub const fn hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    #[must_use]
    pub const fn duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub const fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub const fn success_threshold_percent(mut self, threshold: f64) -> Self {
        self.success_threshold_percent = threshold;
        self
    }

    #[must_use]
    pub const fn drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    #[must_use]
    pub const fn max_duration(mut self, max_duration: Option<Duration>) -> Self {
        self.max_duration = max_duration;
        self
    }

    #[must_use]
    pub const fn progress_interval(mut self, progress_interval: Duration) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    #[must_use]
    pub fn global_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.global_variables = variables;
        self
    }

    #[must_use]
    pub fn global_variable(mut self, name: &str, value: &str) -> Self {
        self.global_variables
            .insert(name.to_owned(), value.to_owned());
        self
    }

    /// Validates and freezes the plan.
    ///
    /// # Errors
    ///
    /// Returns an error when `threads` is 0, the threshold is outside
    /// `[0, 100]`, or a duration-based plan has no duration.
    pub fn build(self) -> Result<ExecutionPlan, ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ThreadsMustBePositive {
                value: self.threads,
            });
        }
        let threshold = self.success_threshold_percent;
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange { value: threshold });
        }
        if self.iterations == 0 && self.duration.is_none() {
            return Err(ConfigError::DurationRequired);
        }
        if self.duration.is_some_and(|duration| duration.is_zero()) {
            return Err(ConfigError::DurationZero { field: "duration" });
        }
        if self.progress_interval.is_zero() {
            return Err(ConfigError::DurationZero {
                field: "progress_interval",
            });
        }

        Ok(ExecutionPlan {
            threads: self.threads,
            iterations: self.iterations,
            ramp_up: self.ramp_up,
            hold: self.hold,
            duration: self.duration,
            pacing: self.pacing,
            success_threshold_percent: threshold,
            drain_timeout: self.drain_timeout,
            max_duration: self.max_duration,
            progress_interval: self.progress_interval,
            global_variables: self.global_variables,
        })
    }
}

/// Scenario-level replacements for plan fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanOverrides {
    pub threads: Option<u64>,
    pub iterations: Option<u64>,
    pub ramp_up: Option<Duration>,
    pub hold: Option<Duration>,
    pub duration: Option<Duration>,
    pub pacing: Option<Duration>,
    pub success_threshold_percent: Option<f64>,
}

impl PlanOverrides {
    #[must_use]
    pub const fn overrides_threshold(&self) -> bool {
        self.success_threshold_percent.is_some()
    }
}
