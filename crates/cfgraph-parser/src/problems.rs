use std::fmt;

use cfgraph_metadata::ClassMetadata;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    CircularImport,
    FinalConfigurationClass,
    NonOverridableBeanMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Description of the resource the offending class was read from.
    pub resource: String,
    pub class_name: Option<String>,
}

impl Location {
    pub fn of(resource: impl Into<String>, metadata: &ClassMetadata) -> Self {
        Self {
            resource: resource.into(),
            class_name: Some(metadata.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub severity: Severity,
    pub kind: ProblemKind,
    pub message: String,
    pub location: Location,
}

impl Problem {
    pub fn error(kind: ProblemKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Configuration problem: {}\nOffending resource: {}",
            self.message, self.location.resource
        )
    }
}

/// A problem escalated to a failure by a fail-fast reporter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{problem}")]
pub struct ProblemError {
    pub problem: Problem,
}

pub trait ProblemReporter: Send + Sync {
    fn error(&self, problem: Problem) -> Result<(), ProblemError>;

    fn warning(&self, problem: Problem) -> Result<(), ProblemError> {
        tracing::warn!(target: "cfgraph.parser", "{problem}");
        Ok(())
    }
}

/// Aborts on the first error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFastProblemReporter;

impl ProblemReporter for FailFastProblemReporter {
    fn error(&self, problem: Problem) -> Result<(), ProblemError> {
        Err(ProblemError { problem })
    }
}

/// Records problems and lets the run continue.
#[derive(Debug, Default)]
pub struct CollectingProblemReporter {
    problems: Mutex<Vec<Problem>>,
}

impl CollectingProblemReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.problems.lock().clone()
    }

    pub fn take(&self) -> Vec<Problem> {
        std::mem::take(&mut *self.problems.lock())
    }
}

impl ProblemReporter for CollectingProblemReporter {
    fn error(&self, problem: Problem) -> Result<(), ProblemError> {
        tracing::warn!(target: "cfgraph.parser", kind = ?problem.kind, "{}", problem.message);
        self.problems.lock().push(problem);
        Ok(())
    }

    fn warning(&self, problem: Problem) -> Result<(), ProblemError> {
        self.problems.lock().push(problem);
        Ok(())
    }
}
