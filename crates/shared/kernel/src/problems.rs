//! Non-fatal problems collected during a run and reported in one batch at the end.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// One collected problem. `code` is a reason code such as `missing_feature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub severity: Severity,
    pub code: Cow<'static, str>,
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        write!(f, "[{level}] {} ({}): {}", self.subject, self.code, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProblemLog {
    problems: Vec<Problem>,
}

impl ProblemLog {
    pub fn record(&mut self, problem: Problem) {
        match problem.severity {
            Severity::Info => {
                tracing::info!(code = %problem.code, subject = %problem.subject, "{}", problem.message);
            },
            Severity::Warning => {
                tracing::warn!(code = %problem.code, subject = %problem.subject, "{}", problem.message);
            },
        }
        self.problems.push(problem);
    }

    pub fn warn(
        &mut self,
        code: impl Into<Cow<'static, str>>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.record(Problem {
            severity: Severity::Warning,
            code: code.into(),
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn info(
        &mut self,
        code: impl Into<Cow<'static, str>>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.record(Problem {
            severity: Severity::Info,
            code: code.into(),
            subject: subject.into(),
            message: message.into(),
        });
    }

    /// Number of problems recorded under `code`.
    #[must_use]
    pub fn count(&self, code: &str) -> usize {
        self.problems.iter().filter(|p| p.code == code).count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
