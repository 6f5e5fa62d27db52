//! Rule registry
//!
//! Provides [`RuleSet`], the ordered list of rules an analyzer evaluates.
//! Registration order is evaluation order and therefore output order.

use crate::consistency::ConsistencyRule;
use crate::high_risk::HighRiskRule;
use crate::requirements::DataRequirements;
use crate::rule::Rule;
use crate::upgrade_differences::UpgradeDifferencesRule;
use crate::user_modified::UserModifiedRule;

/// Ordered set of rules, unique by name
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Create new empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create set with the built-in rules
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.register(UserModifiedRule::new());
        set.register(UpgradeDifferencesRule::new());
        set.register(ConsistencyRule::new());
        set.register(HighRiskRule::new());
        set
    }

    /// Register a rule, replacing any rule with the same name in place
    pub fn register(&mut self, rule: impl Rule + 'static) {
        self.register_boxed(Box::new(rule));
    }

    /// Register a boxed rule, replacing any rule with the same name in place
    pub fn register_boxed(&mut self, rule: Box<dyn Rule>) {
        match self.rules.iter().position(|r| r.name() == rule.name()) {
            Some(index) => self.rules[index] = rule,
            None => self.rules.push(rule),
        }
    }

    /// Remove a rule by name
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name() != name);
        self.rules.len() != before
    }

    /// Check if a rule is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name() == name)
    }

    /// Registered rule names in evaluation order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Get number of registered rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Merged requirements of every registered rule
    #[must_use]
    pub fn requirements(&self) -> DataRequirements {
        let all: Vec<DataRequirements> = self.rules.iter().map(|r| r.data_requirements()).collect();
        DataRequirements::merged(&all)
    }
}
