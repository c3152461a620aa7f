//! Resolver configuration.
//!
//! Resolution order, later wins:
//! 1. Built-in default (budget 64)
//! 2. YAML config file (`--config`)
//! 3. `YAML_INJECT_BUDGET` environment variable
//! 4. Explicit `--budget` flag
//!
//! Every layer clamps the budget to `MAX_BUDGET`.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::budget::{DEFAULT_BUDGET, MAX_BUDGET};
use crate::error::DocumentError;

/// Environment variable overriding the resolution budget.
pub const BUDGET_ENV: &str = "YAML_INJECT_BUDGET";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InjectConfig {
    /// Nested expansion steps allowed per top-level marker.
    pub budget: i32,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
        }
    }
}

impl InjectConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup` (normally `std::env::var`).
    ///
    /// Unparseable or non-positive values are ignored with a warning.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(BUDGET_ENV) {
            match raw.trim().parse::<i32>() {
                Ok(budget) if budget > 0 => self = self.with_budget(budget),
                _ => warn!(
                    "Ignoring {}={:?}: expected a positive integer, keeping {}",
                    BUDGET_ENV, raw, self.budget
                ),
            }
        }
        self
    }

    /// Set the budget, clamped to `MAX_BUDGET`.
    pub fn with_budget(mut self, budget: i32) -> Self {
        if budget > MAX_BUDGET {
            warn!(
                "Budget {} exceeds the maximum, using {}",
                budget, MAX_BUDGET
            );
        }
        self.budget = budget.min(MAX_BUDGET);
        self
    }

    /// Parse a YAML config. The budget must be positive.
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        let config: Self = serde_yaml::from_str(content).map_err(DocumentError::Parse)?;
        if config.budget <= 0 {
            return Err(DocumentError::InvalidBudget {
                budget: config.budget,
            });
        }
        Ok(config.with_budget(config.budget))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_is_64() {
        assert_eq!(InjectConfig::default().budget, 64);
    }

    #[test]
    fn test_env_override() {
        let config = InjectConfig::default().with_env_overrides(|name| {
            (name == BUDGET_ENV).then(|| "12".to_string())
        });
        assert_eq!(config.budget, 12);
    }

    #[test]
    fn test_bad_env_override_is_ignored() {
        for raw in ["zero", "0", "-4", ""] {
            let config =
                InjectConfig::default().with_env_overrides(|_| Some(raw.to_string()));
            assert_eq!(config.budget, 64, "{raw:?} should be ignored");
        }
    }

    #[test]
    fn test_from_yaml() {
        assert_eq!(InjectConfig::from_yaml_str("budget: 8").unwrap().budget, 8);
        assert_eq!(InjectConfig::from_yaml_str("{}").unwrap().budget, 64);
        assert!(InjectConfig::from_yaml_str("depth: 8").is_err());
    }

    #[test]
    fn test_non_positive_yaml_budget_is_rejected() {
        for content in ["budget: 0", "budget: -5"] {
            let err = InjectConfig::from_yaml_str(content).unwrap_err();
            assert!(
                matches!(err, DocumentError::InvalidBudget { .. }),
                "{content:?} gave {err}"
            );
        }
        assert_eq!(
            InjectConfig::from_yaml_str("budget: -5").unwrap_err().to_string(),
            "budget must be a positive integer, got -5"
        );
    }

    #[test]
    fn test_oversized_budget_is_clamped_everywhere() {
        assert_eq!(
            InjectConfig::from_yaml_str("budget: 1000000").unwrap().budget,
            MAX_BUDGET
        );
        assert_eq!(
            InjectConfig::default().with_budget(1_000_000).budget,
            MAX_BUDGET
        );
        let config =
            InjectConfig::default().with_env_overrides(|_| Some("1000000".to_string()));
        assert_eq!(config.budget, MAX_BUDGET);
    }
}
