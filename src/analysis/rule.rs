use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity};
use crate::parser::ast::{Node, NodeKind};
use thiserror::Error;

/// A rule that gave up on a node, reported as an `internal-rule-error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RuleError(pub String);

pub trait StyleRule: Send + Sync {
    // Unique identifier for this rule
    fn id(&self) -> &'static str;

    // Short description of what this rule checks
    fn description(&self) -> &'static str;

    // Severity of violations unless configuration overrides it
    fn severity(&self) -> Severity;

    // Node kinds the engine hands to `check`
    fn applies_to(&self) -> &'static [NodeKind];

    // Inspect one node, findings go to `out`
    fn check(
        &self,
        ctx: &RuleContext,
        node: &Node,
        out: &mut DiagnosticCollector,
    ) -> Result<(), RuleError>;

    // Optional: whether this rule is enabled by default
    fn enabled_by_default(&self) -> bool {
        true
    }
}
