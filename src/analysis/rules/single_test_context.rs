use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity};
use crate::analysis::rule::{RuleError, StyleRule};
use crate::parser::ast::{Node, NodeKind};

// Rule against contexts that wrap a single example
pub struct NoSingleTestContextRule;

impl StyleRule for NoSingleTestContextRule {
    fn id(&self) -> &'static str {
        "no-single-test-context"
    }

    fn description(&self) -> &'static str {
        "A context holding a single example adds nesting without grouping anything"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Context]
    }

    fn check(
        &self,
        _ctx: &RuleContext,
        node: &Node,
        out: &mut DiagnosticCollector,
    ) -> Result<(), RuleError> {
        if let [only] = node.children.as_slice()
            && only.kind == NodeKind::It
        {
            out.report(
                format!("context '{}' contains a single example", node.label.text),
                node.location.clone(),
            )
            .suggestion = Some("fold the context into the example description".to_string());
        }
        Ok(())
    }
}
