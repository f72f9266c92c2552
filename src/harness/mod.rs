//! Verification harness: named scenarios that drive the mutation operations
//! and check every reference count along the way.
//!
//! Each scenario runs against a fresh `Runtime`, creates probe objects with a
//! known count, performs a scripted sequence and asserts the counts it expects.
//! Afterwards the runner checks that the heap is empty again, so a scenario
//! that balances its probes but forgets a container still fails.

mod check;
mod report;
pub mod scenarios;

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::exceptions::{ErrorKind, RefError};
use crate::resource::{LimitedTracker, ResourceLimits};
use crate::runtime::Runtime;

pub use check::{expect_count, expect_count_of, expect_failure, expect_len, expect_steal_failure, expect_true, Step};
pub use report::{Outcome, Report, ScenarioReport};

pub type ScenarioResult = Result<(), ScenarioError>;

/// The container a scenario exercises, used to group scenarios in listings and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Tuple,
    List,
    Dict,
    Set,
}

/// How a scenario's error message is compared against the expected text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageMatch {
    Exact(&'static str),
    EndsWith(&'static str),
}

impl MessageMatch {
    #[must_use]
    pub fn matches(self, message: &str) -> bool {
        match self {
            Self::Exact(expected) => message == expected,
            Self::EndsWith(suffix) => message.ends_with(suffix),
        }
    }
}

impl fmt::Display for MessageMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(expected) => write!(f, "{expected:?}"),
            Self::EndsWith(suffix) => write!(f, "...{suffix:?}"),
        }
    }
}

/// What a scenario is expected to end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Every count balances and the scenario returns `Ok`.
    Balanced,
    /// The scenario surfaces an error of this kind, with counts still preserved.
    Raises { kind: ErrorKind, message: MessageMatch },
}

impl Expect {
    /// A `TypeMismatch` whose message ends with `"bad argument to internal function"`.
    #[must_use]
    pub const fn bad_internal_call() -> Self {
        Self::Raises {
            kind: ErrorKind::TypeMismatch,
            message: MessageMatch::EndsWith("bad argument to internal function"),
        }
    }

    #[must_use]
    pub const fn index_error(message: &'static str) -> Self {
        Self::Raises {
            kind: ErrorKind::IndexOutOfRange,
            message: MessageMatch::Exact(message),
        }
    }

    #[must_use]
    pub const fn unhashable(message: &'static str) -> Self {
        Self::Raises {
            kind: ErrorKind::Unhashable,
            message: MessageMatch::Exact(message),
        }
    }

    /// Checks a scenario result against this expectation, returning a failure description.
    pub fn judge(self, result: &ScenarioResult) -> Result<(), String> {
        match (self, result) {
            (Self::Balanced, Ok(())) => Ok(()),
            (Self::Raises { kind, message }, Err(ScenarioError::Raised(err))) => {
                if err.kind() == kind && message.matches(err.message()) {
                    Ok(())
                } else {
                    Err(format!("raised {err} ({}), expected {kind} with message {message}", err.kind()))
                }
            }
            (Self::Raises { kind, .. }, Ok(())) => Err(format!("expected {kind} but the scenario succeeded")),
            (_, Err(err)) => Err(err.to_string()),
        }
    }
}

/// Why a scenario did not return `Ok`.
#[derive(Debug)]
pub enum ScenarioError {
    /// A count assertion failed.
    CountMismatch {
        step: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Some other observation failed, e.g. a slot held the wrong object.
    Check { step: &'static str, detail: String },
    /// The scenario's operation failed as intended; counts were checked first.
    Raised(RefError),
    /// An operation failed where the scenario expected it to succeed.
    Unexpected { step: &'static str, error: RefError },
    /// An operation succeeded where the scenario expected it to fail.
    MissingError { step: &'static str },
    /// Objects were still live on the heap when the scenario finished.
    Leaked { live: usize },
    /// No scenario is registered under this name.
    UnknownScenario(String),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch { step, expected, actual } => {
                write!(f, "{step}: expected refcount {expected}, found {actual}")
            }
            Self::Check { step, detail } => write!(f, "{step}: {detail}"),
            Self::Raised(err) => write!(f, "{err}"),
            Self::Unexpected { step, error } => write!(f, "{step}: unexpected error {error}"),
            Self::MissingError { step } => write!(f, "{step}: expected an error but the call succeeded"),
            Self::Leaked { live } => write!(f, "{live} object(s) still live after the scenario"),
            Self::UnknownScenario(name) => write!(f, "no scenario named {name:?}"),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Raised(error) | Self::Unexpected { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub type ScenarioFn = fn(&mut Runtime<LimitedTracker>) -> ScenarioResult;

/// A registered scenario.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub container: Container,
    pub expect: Expect,
    pub run: ScenarioFn,
}

/// Settings for a harness run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Only run scenarios whose name contains this substring.
    pub filter: Option<String>,
    /// Stop at the first scenario that misses its expectation.
    pub fail_fast: bool,
    /// Limits applied to each scenario's runtime.
    pub limits: ResourceLimits,
}

/// Runs registered scenarios, each against its own fresh runtime.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    scenarios: Vec<Scenario>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl Harness {
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        let mut scenarios = scenarios::catalogue();
        scenarios.sort_by_key(|s| s.name);
        Self { config, scenarios }
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Every registered scenario name, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.scenarios.iter().map(|s| s.name).collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios
            .binary_search_by(|s| s.name.cmp(name))
            .ok()
            .map(|i| &self.scenarios[i])
    }

    /// Runs one scenario the way a host-side caller sees it: `Ok(0)` when it
    /// balanced, otherwise the error it raised.
    ///
    /// # Errors
    /// Expected-failure scenarios return `ScenarioError::Raised` with the
    /// operation's error. Any other variant means the scenario itself failed.
    pub fn call(&self, name: &str) -> Result<i32, ScenarioError> {
        let scenario = self
            .get(name)
            .ok_or_else(|| ScenarioError::UnknownScenario(name.to_owned()))?;
        self.execute(scenario).map(|()| 0)
    }

    /// Runs `scenario` on a fresh runtime and checks for leftover objects.
    pub fn execute(&self, scenario: &Scenario) -> ScenarioResult {
        let _span = tracing::debug_span!("scenario", name = scenario.name).entered();
        let mut rt = Runtime::with_limits(self.config.limits.clone());
        let result = (scenario.run)(&mut rt);
        let live = rt.live_objects();
        if live > 0 {
            tracing::warn!(scenario = scenario.name, live, "scenario leaked objects");
            if matches!(result, Ok(()) | Err(ScenarioError::Raised(_))) {
                return Err(ScenarioError::Leaked { live });
            }
        }
        result
    }

    /// Runs a scenario and compares the result with its expectation.
    #[must_use]
    pub fn check(&self, scenario: &Scenario) -> ScenarioReport {
        let result = self.execute(scenario);
        let judged = scenario.expect.judge(&result);
        if let Err(detail) = &judged {
            tracing::warn!(scenario = scenario.name, %detail, "scenario failed");
        }
        ScenarioReport::new(scenario, judged)
    }

    /// Runs every registered scenario.
    #[must_use]
    pub fn run_all(&self) -> Report {
        self.run_where(|_| true)
    }

    /// Runs the scenarios whose name contains `filter`.
    #[must_use]
    pub fn run_matching(&self, filter: &str) -> Report {
        self.run_where(|s| s.name.contains(filter))
    }

    /// Runs the scenarios selected by the configured filter.
    #[must_use]
    pub fn run(&self) -> Report {
        match &self.config.filter {
            Some(filter) => self.run_matching(filter),
            None => self.run_all(),
        }
    }

    fn run_where(&self, select: impl Fn(&Scenario) -> bool) -> Report {
        let mut report = Report::default();
        for scenario in self.scenarios.iter().filter(|s| select(s)) {
            let entry = self.check(scenario);
            let failed = entry.outcome == Outcome::Failed;
            report.push(entry);
            if failed && self.config.fail_fast {
                break;
            }
        }
        report
    }
}
