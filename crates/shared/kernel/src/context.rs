//! Per-run context threaded by reference through the recursive generation calls.

use crate::problems::ProblemLog;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Everything a generation run carries besides the feature model: the cancellation
/// flag checked at the top of each iteration, and the non-fatal problems collected so far.
#[derive(Debug, Default)]
pub struct BuildContext {
    cancellation: CancellationToken,
    problems: ProblemLog,
}

impl BuildContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self { cancellation, problems: ProblemLog::default() }
    }

    /// A handle that cancels this run when triggered.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    #[must_use]
    pub const fn problems(&self) -> &ProblemLog {
        &self.problems
    }

    pub const fn problems_mut(&mut self) -> &mut ProblemLog {
        &mut self.problems
    }

    /// Consumes the context, keeping the collected problems.
    #[must_use]
    pub fn into_problems(self) -> ProblemLog {
        self.problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let ctx = BuildContext::with_cancellation(token.clone());
        assert!(!ctx.is_cancelled());

        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.cancellation().is_cancelled());
    }
}
