use std::fmt;

use serde::Serialize;
use strum::Display;

use crate::harness::{Container, Scenario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
}

/// The result of checking one scenario against its expectation.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub container: Container,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ScenarioReport {
    pub(crate) fn new(scenario: &Scenario, judged: Result<(), String>) -> Self {
        let (outcome, detail) = match judged {
            Ok(()) => (Outcome::Passed, None),
            Err(detail) => (Outcome::Failed, Some(detail)),
        };
        Self {
            name: scenario.name,
            container: scenario.container,
            outcome,
            detail,
        }
    }
}

/// Results of a harness run, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub scenarios: Vec<ScenarioReport>,
}

impl Report {
    pub(crate) fn push(&mut self, entry: ScenarioReport) {
        self.scenarios.push(entry);
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.outcome == Outcome::Passed).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| s.outcome == Outcome::Failed)
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Only fails if serialization itself fails, which the report's types never do.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.scenarios {
            match &entry.detail {
                None => writeln!(f, "{:<6} {:<5} {}", entry.outcome, entry.container, entry.name)?,
                Some(detail) => writeln!(f, "{:<6} {:<5} {}: {detail}", entry.outcome, entry.container, entry.name)?,
            }
        }
        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}
