//! Rule trait and core types
//!
//! Provides the [`Rule`] trait: a named, independently testable comparison
//! unit that declares its data requirements and produces findings from a
//! shared, read-only [`RuleContext`].

use crate::context::RuleContext;
use crate::requirements::DataRequirements;
use precheck_model::CheckResult;

/// A comparison unit evaluated by the analyzer
///
/// # Contract
/// Rules must be side-effect free and must not depend on evaluation order:
/// every rule only reads from the context and returns a fresh list of
/// findings, so rules may run sequentially or concurrently.
pub trait Rule: Send + Sync + std::fmt::Debug {
    /// Stable rule identifier, used as `rule_id` on findings
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    /// Category assigned to produced findings
    fn category(&self) -> &'static str;

    /// Data this rule needs from the snapshot and knowledge bases
    fn data_requirements(&self) -> DataRequirements;

    /// Produce findings
    ///
    /// # Errors
    /// Returns [`RuleError`] when the context is unusable for this rule. The
    /// analyzer converts the error into an error finding and keeps going.
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<CheckResult>, RuleError>;
}

/// Rule evaluation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// Required data absent from the context
    #[error("rule {rule}: missing {what}")]
    MissingData {
        /// Failing rule
        rule: &'static str,
        /// What was missing
        what: String,
    },

    /// Context content malformed for this rule
    #[error("rule {rule}: invalid input: {reason}")]
    InvalidInput {
        /// Failing rule
        rule: &'static str,
        /// Diagnostic
        reason: String,
    },
}

impl RuleError {
    /// Create missing-data error
    #[inline]
    #[must_use]
    pub fn missing(rule: &'static str, what: impl Into<String>) -> Self {
        Self::MissingData {
            rule,
            what: what.into(),
        }
    }

    /// Create invalid-input error
    #[inline]
    #[must_use]
    pub fn invalid(rule: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            rule,
            reason: reason.into(),
        }
    }

    /// Name of the failing rule
    #[must_use]
    pub fn rule(&self) -> &'static str {
        match self {
            Self::MissingData { rule, .. } | Self::InvalidInput { rule, .. } => rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_rule() {
        let err = RuleError::missing("CONSISTENCY", "instance list");
        assert_eq!(err.to_string(), "rule CONSISTENCY: missing instance list");
        assert_eq!(err.rule(), "CONSISTENCY");
    }

    #[test]
    fn invalid_input_display() {
        let err = RuleError::invalid("HIGH_RISK_PARAMS", "empty table");
        assert!(err.to_string().contains("invalid input: empty table"));
    }
}
