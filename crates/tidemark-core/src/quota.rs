//! Byte budgets governing the key-value store.
//!
//! Two ceilings coexist. [`SAFE_LIMIT_BYTES`] drives admission and eviction
//! decisions; [`REPORT_LIMIT_BYTES`] is only the denominator of the usage
//! percentage shown to users. The "storage nearly full" warning therefore
//! fires relative to the larger ceiling while writes start being refused at
//! the smaller one.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Admission ceiling: 4.5 MiB.
pub const SAFE_LIMIT_BYTES: usize = 4_718_592;

/// Theoretical ceiling used for usage percentage reporting: 5 MiB.
pub const REPORT_LIMIT_BYTES: usize = 5_242_880;

/// Usage percentage (of the report ceiling) above which usage is "near limit".
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Error returned by [`QuotaBudget::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    #[error("safe_limit ({safe}) must be strictly below report_limit ({report})")]
    SafeNotBelowReport { safe: usize, report: usize },

    #[error("near_limit_percent must be within 0..=100, got {0}")]
    NearLimitOutOfRange(f64),
}

impl BudgetError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SafeNotBelowReport { .. } | Self::NearLimitOutOfRange(_) => {
                ErrorCode::InvalidQuotaBudget
            }
        }
    }
}

/// Process-wide byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaBudget {
    #[serde(default = "default_safe_limit")]
    pub safe_limit: usize,
    #[serde(default = "default_report_limit")]
    pub report_limit: usize,
    #[serde(default = "default_near_limit_percent")]
    pub near_limit_percent: f64,
}

impl Default for QuotaBudget {
    fn default() -> Self {
        Self {
            safe_limit: SAFE_LIMIT_BYTES,
            report_limit: REPORT_LIMIT_BYTES,
            near_limit_percent: NEAR_LIMIT_PERCENT,
        }
    }
}

impl QuotaBudget {
    /// Check the `safe_limit < report_limit` invariant.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError`] when the invariant does not hold or the
    /// near-limit threshold is not a percentage.
    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.safe_limit >= self.report_limit {
            return Err(BudgetError::SafeNotBelowReport {
                safe: self.safe_limit,
                report: self.report_limit,
            });
        }
        if !(0.0..=100.0).contains(&self.near_limit_percent) {
            return Err(BudgetError::NearLimitOutOfRange(self.near_limit_percent));
        }
        Ok(())
    }

    /// Whether `used + required` stays within the admission ceiling.
    #[must_use]
    pub const fn admits(&self, used: usize, required: usize) -> bool {
        used.saturating_add(required) <= self.safe_limit
    }
}

const fn default_safe_limit() -> usize {
    SAFE_LIMIT_BYTES
}

const fn default_report_limit() -> usize {
    REPORT_LIMIT_BYTES
}

const fn default_near_limit_percent() -> f64 {
    NEAR_LIMIT_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_mebibyte_arithmetic() {
        assert_eq!(SAFE_LIMIT_BYTES, 9 * 1024 * 1024 / 2);
        assert_eq!(REPORT_LIMIT_BYTES, 5 * 1024 * 1024);
    }

    #[test]
    fn default_budget_is_valid() {
        QuotaBudget::default().validate().expect("defaults must validate");
    }

    #[test]
    fn equal_limits_are_rejected() {
        let budget = QuotaBudget {
            safe_limit: 100,
            report_limit: 100,
            near_limit_percent: 80.0,
        };
        assert_eq!(
            budget.validate(),
            Err(BudgetError::SafeNotBelowReport {
                safe: 100,
                report: 100
            })
        );
    }

    #[test]
    fn admits_is_inclusive_at_the_ceiling() {
        let budget = QuotaBudget::default();
        assert!(budget.admits(SAFE_LIMIT_BYTES - 10, 10));
        assert!(!budget.admits(SAFE_LIMIT_BYTES - 10, 11));
        assert!(!budget.admits(usize::MAX, 1));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let budget: QuotaBudget = toml::from_str("safe_limit = 1024").expect("parse");
        assert_eq!(budget.safe_limit, 1024);
        assert_eq!(budget.report_limit, REPORT_LIMIT_BYTES);
    }
}
