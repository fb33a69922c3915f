pub mod context;
pub mod diagnostic;
pub mod rule;
pub mod rule_registry;
pub mod rules;

use crate::SpeclintError;
use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity, Violation};
use crate::analysis::rule::StyleRule;
use crate::analysis::rule_registry::RuleRegistry;
use crate::config::LintConfig;
use crate::parser::ast::{Node, SpecTree};
use log::{error, trace};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

/// Runs the enabled rules of a registry over parsed trees.
/// Holds no per-tree state, so one engine is shared by every worker
pub struct RuleEngine {
    registry: RuleRegistry,
    enabled: Vec<&'static str>,
    config: LintConfig,
}

/// Per-tree bookkeeping of a single `evaluate` call
struct Evaluation<'e> {
    rules: Vec<(&'e dyn StyleRule, Severity)>,
    quarantined: HashSet<&'static str>,
    violations: Vec<Violation>,
}

impl RuleEngine {
    /// An engine over the built-in rules
    pub fn new(config: &LintConfig) -> Result<Self, SpeclintError> {
        Self::with_registry(RuleRegistry::with_builtin_rules()?, config)
    }

    /// Fails when the config names a rule the registry does not know
    pub fn with_registry(
        registry: RuleRegistry,
        config: &LintConfig,
    ) -> Result<Self, SpeclintError> {
        let unknown: Vec<&str> = config
            .referenced_rules()
            .filter(|id| registry.get_rule(id).is_none())
            .collect();
        if !unknown.is_empty() {
            return Err(SpeclintError::Config(format!(
                "unknown rule id(s): {}",
                unknown.join(", ")
            )));
        }

        let enabled = registry
            .all()
            .filter(|rule| {
                let explicitly = config.enabled_rules.iter().any(|id| id == rule.id());
                (explicitly || rule.enabled_by_default()) && config.should_run(rule.id())
            })
            .map(|rule| rule.id())
            .collect();

        Ok(Self {
            registry,
            enabled,
            config: config.clone(),
        })
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Ids of the rules `evaluate` runs, in registration order
    pub fn enabled_rules(&self) -> &[&'static str] {
        &self.enabled
    }

    /// Severity a rule reports at once overrides are applied
    pub fn effective_severity(&self, rule: &dyn StyleRule) -> Severity {
        self.config
            .severity_overrides
            .get(rule.id())
            .copied()
            .unwrap_or_else(|| rule.severity())
    }

    /// Runs every enabled rule over `tree`, results sorted by location then rule id
    pub fn evaluate(&self, tree: &SpecTree) -> Vec<Violation> {
        self.evaluate_rules(tree, &self.enabled)
    }

    /// Runs the rules named in `rule_ids` over `tree`. Unknown ids are ignored
    pub fn evaluate_rules(&self, tree: &SpecTree, rule_ids: &[&str]) -> Vec<Violation> {
        let mut evaluation = Evaluation {
            rules: self
                .registry
                .all()
                .filter(|rule| rule_ids.contains(&rule.id()))
                .map(|rule| (rule, self.effective_severity(rule)))
                .collect(),
            quarantined: HashSet::new(),
            violations: Vec::new(),
        };

        let mut ancestors: Vec<&Node> = Vec::new();
        for node in &tree.nodes {
            self.visit(tree, node, &mut ancestors, &mut evaluation);
        }

        let mut violations = evaluation.violations;
        violations.sort();
        violations
    }

    fn visit<'t>(
        &self,
        tree: &'t SpecTree,
        node: &'t Node,
        ancestors: &mut Vec<&'t Node>,
        evaluation: &mut Evaluation,
    ) {
        let ctx = RuleContext::new(tree, ancestors.as_slice(), &self.config);
        for &(rule, severity) in &evaluation.rules {
            if evaluation.quarantined.contains(rule.id())
                || !rule.applies_to().contains(&node.kind)
            {
                continue;
            }

            let mut out = DiagnosticCollector::new(rule.id(), severity);
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| rule.check(&ctx, node, &mut out)));
            let failure = match outcome {
                Ok(Ok(())) => {
                    trace!(
                        "{} found {} issue(s) at {}",
                        rule.id(),
                        out.violations().len(),
                        node.location
                    );
                    evaluation.violations.extend(out.into_violations());
                    continue;
                }
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };

            error!("rule '{}' failed at {}: {}", rule.id(), node.location, failure);
            evaluation.quarantined.insert(rule.id());
            evaluation
                .violations
                .push(Violation::internal_error(rule.id(), &failure, node.location.clone()));
        }

        ancestors.push(node);
        for child in &node.children {
            self.visit(tree, child, ancestors, evaluation);
        }
        ancestors.pop();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}
