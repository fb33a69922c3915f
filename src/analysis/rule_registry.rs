use crate::SpeclintError;
use crate::analysis::rule::StyleRule;
use crate::analysis::rules;

/// Rules in registration order, ids unique
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn StyleRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// A registry holding every built-in rule
    pub fn with_builtin_rules() -> Result<Self, SpeclintError> {
        let mut registry = Self::new();
        for rule in rules::builtin_rules() {
            registry.register_boxed(rule)?;
        }
        Ok(registry)
    }

    pub fn register<R: StyleRule + 'static>(&mut self, rule: R) -> Result<(), SpeclintError> {
        self.register_boxed(Box::new(rule))
    }

    pub fn register_boxed(&mut self, rule: Box<dyn StyleRule>) -> Result<(), SpeclintError> {
        if self.get_rule(rule.id()).is_some() {
            return Err(SpeclintError::DuplicateRule(rule.id().to_string()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn get_rule(&self, rule_id: &str) -> Option<&dyn StyleRule> {
        self.rules
            .iter()
            .find(|r| r.id() == rule_id)
            .map(|r| r.as_ref())
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn StyleRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
