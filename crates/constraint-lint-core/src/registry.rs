//! The ordered set of active rules.

use crate::rule::Rule;

/// Registry mutation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RegistryError {
    /// A rule with this identifier is already registered.
    #[error("rule `{0}` is already registered")]
    #[diagnostic(
        code(constraint_lint::registry::duplicate_rule),
        help("remove the existing rule first or give the new one a different id")
    )]
    DuplicateRule(String),
}

/// Holds rules in registration order, which is also violation order within a file.
///
/// Identifiers are unique: adding a rule whose id is already present is rejected.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule at the end of the order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRule`] if the id is taken.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), RegistryError> {
        if self.contains(rule.id()) {
            return Err(RegistryError::DuplicateRule(rule.id().to_string()));
        }
        tracing::debug!("Registered rule: {}", rule.id());
        self.rules.push(rule);
        Ok(())
    }

    /// Registers rules in order, stopping at the first duplicate.
    ///
    /// Rules before the duplicate stay registered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRule`] for the first id that is taken.
    pub fn add_rules<I>(&mut self, rules: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Rule>,
    {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(())
    }

    /// Removes the rule with this id, returning it.
    pub fn remove_rule(&mut self, id: &str) -> Option<Rule> {
        let index = self.rules.iter().position(|r| r.id() == id)?;
        Some(self.rules.remove(index))
    }

    /// Rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Looks a rule up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    /// Whether a rule with this id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
