use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity};
use crate::analysis::rule::{RuleError, StyleRule};
use crate::parser::ast::{Node, NodeKind, Receiver, Statement};

const ASSERTION_CALLS: &[&str] = &["expect", "is_expected", "are_expected", "expect_any_instance_of"];

// Rule to keep one expectation per example
pub struct SingleExpectationRule;

fn is_assertion(statement: &Statement) -> bool {
    if statement
        .calls
        .iter()
        .any(|call| call.name == "should" || call.name == "should_not")
    {
        return true;
    }
    statement.head().is_some_and(|head| {
        head.receiver == Receiver::None
            && (ASSERTION_CALLS.contains(&head.name.as_str())
                || head.name.starts_with("assert")
                || head.name.starts_with("refute"))
    })
}

impl StyleRule for SingleExpectationRule {
    fn id(&self) -> &'static str {
        "single-expectation"
    }

    fn description(&self) -> &'static str {
        "Each example should make a single assertion"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::It]
    }

    fn check(
        &self,
        _ctx: &RuleContext,
        node: &Node,
        out: &mut DiagnosticCollector,
    ) -> Result<(), RuleError> {
        let assertions: Vec<&Statement> = node.body.iter().filter(|s| is_assertion(s)).collect();
        if let [_, second, ..] = assertions.as_slice() {
            out.report(
                format!("example makes {} assertions, expected one", assertions.len()),
                second.location.clone(),
            )
            .suggestion = Some("split it into separate examples".to_string());
        }
        Ok(())
    }
}
