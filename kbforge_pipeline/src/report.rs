//! What happened during one scheduler run.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Per-run lifecycle of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Pending,
    InputsResolved,
    OutputOpen,
    Extracting,
    OutputClosed,
    FollowupsDispatched,
    Done,
    Failed,
}

impl UnitState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InputsResolved => "inputs-resolved",
            Self::OutputOpen => "output-open",
            Self::Extracting => "extracting",
            Self::OutputClosed => "output-closed",
            Self::FollowupsDispatched => "followups-dispatched",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRun {
    pub unit: String,
    /// The unit whose completion dispatched this one, for follow-ups.
    pub parent: Option<String>,
    pub facts_written: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    /// State the unit was in when it failed.
    pub state: UnitState,
    pub message: String,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed while {}: {}", self.unit, self.state, self.message)
    }
}

/// A unit that never started because something it depends on is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedUnit {
    pub unit: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub executed: Vec<UnitRun>,
    pub failed: Vec<UnitFailure>,
    pub skipped: Vec<SkippedUnit>,
    /// Themes taken from the cache instead of being produced.
    pub cache_hits: Vec<String>,
    pub elapsed_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Names of executed units in completion order.
    #[must_use]
    pub fn executed_names(&self) -> Vec<&str> {
        self.executed.iter().map(|run| run.unit.as_str()).collect()
    }

    #[must_use]
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|failure| failure.unit.as_str()).collect()
    }

    #[must_use]
    pub fn skipped_names(&self) -> Vec<&str> {
        self.skipped.iter().map(|skip| skip.unit.as_str()).collect()
    }

    #[must_use]
    pub fn facts_written(&self) -> usize {
        self.executed.iter().map(|run| run.facts_written).sum()
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = millis(elapsed);
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} units executed, {} failed, {} skipped, {} cached themes reused, {} facts written in {} ms",
            self.executed.len(),
            self.failed.len(),
            self.skipped.len(),
            self.cache_hits.len(),
            self.facts_written(),
            self.elapsed_ms
        )?;
        for run in &self.executed {
            match &run.parent {
                Some(parent) => writeln!(
                    f,
                    "  done    {} (after {parent}): {} facts",
                    run.unit, run.facts_written
                )?,
                None => writeln!(f, "  done    {}: {} facts", run.unit, run.facts_written)?,
            }
        }
        for failure in &self.failed {
            writeln!(f, "  failed  {failure}")?;
        }
        for skip in &self.skipped {
            writeln!(f, "  skipped {}: {}", skip.unit, skip.reason)?;
        }
        Ok(())
    }
}

pub(crate) fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
