//! Recursion guard for nested inject expansion.
//!
//! One budget is shared by the whole call tree of a single top-level
//! resolution. Entering a nested expansion spends one step; finishing it
//! successfully refunds the step. Siblings that complete do not drain the
//! budget, chains do.
//!
//! Expansion is recursive, so the budget also bounds stack depth. Budgets
//! above `MAX_BUDGET` are clamped.

use tracing::trace;

use crate::error::InjectError;

/// Steps allowed per top-level `post_process` call.
pub const DEFAULT_BUDGET: i32 = 64;

/// Largest budget honoured; larger requests are clamped to it.
pub const MAX_BUDGET: i32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionBudget {
    remaining: i32,
}

impl ResolutionBudget {
    pub fn new(steps: i32) -> Self {
        Self {
            remaining: steps.min(MAX_BUDGET),
        }
    }

    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    /// Spend one step before a nested expansion.
    ///
    /// Fails once the budget is at or below zero after spending. A failed
    /// enter is not refunded.
    pub fn enter(&mut self) -> Result<(), InjectError> {
        self.remaining -= 1;
        trace!(remaining = self.remaining, "inject budget spent");
        if self.remaining <= 0 {
            return Err(InjectError::RecursionLimit);
        }
        Ok(())
    }

    /// Give back the step spent by a nested expansion that succeeded.
    pub fn refund(&mut self) {
        self.remaining += 1;
        trace!(remaining = self.remaining, "inject budget refunded");
    }
}

impl Default for ResolutionBudget {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_exhausts_on_64th_enter() {
        let mut budget = ResolutionBudget::default();
        for _ in 0..63 {
            budget.enter().unwrap();
        }
        assert_eq!(budget.remaining(), 1);
        assert_eq!(budget.enter(), Err(InjectError::RecursionLimit));
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_siblings_refund() {
        let mut budget = ResolutionBudget::new(2);
        for _ in 0..100 {
            budget.enter().unwrap();
            budget.refund();
        }
        assert_eq!(budget.remaining(), 2);
    }

    #[test]
    fn test_oversized_budget_is_clamped() {
        assert_eq!(ResolutionBudget::new(1_000_000).remaining(), MAX_BUDGET);
        assert_eq!(ResolutionBudget::new(MAX_BUDGET).remaining(), MAX_BUDGET);
    }

    #[test]
    fn test_budget_of_one_refuses_any_nesting() {
        let mut budget = ResolutionBudget::new(1);
        assert!(budget.enter().is_err());
    }
}
