use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity};
use crate::analysis::rule::{RuleError, StyleRule};
use crate::parser::ast::{CallSite, LabelKind, Node, NodeKind, SourceLocation, SourceSpan, Statement};

/// Calls that build a double or stub around their first argument
const TARGETED_DOUBLES: &[&str] = &[
    "allow",
    "allow_any_instance_of",
    "instance_double",
    "class_double",
    "instance_spy",
    "class_spy",
    "object_double",
    "stub_const",
    "hide_const",
];

/// `expect(x)` only mocks when paired with one of these matchers
const MESSAGE_MATCHERS: &[&str] = &["receive", "receive_messages", "receive_message_chain", "have_received"];

/// Old style stubbing sent straight to the stubbed object
const RECEIVER_STUBS: &[&str] = &[
    "stub",
    "stub!",
    "stubs",
    "expects",
    "stub_chain",
    "should_receive",
    "should_not_receive",
];

/// Names that refer to the object under test inside its own spec
const SELF_REFERENCES: &[&str] = &["described_class", "subject"];

// Rule against stubbing the model a model spec is about
pub struct AvoidModelMockingRule;

fn is_model_spec(ctx: &RuleContext, node: &Node) -> bool {
    let tagged = node
        .metadata
        .iter()
        .any(|meta| meta == "type: :model" || meta == ":type => :model");
    if tagged {
        return true;
    }
    let file: &str = &ctx.tree.file;
    let mut directories: Vec<&str> = file.split(['/', '\\']).collect();
    directories.pop();
    directories
        .iter()
        .any(|dir| ctx.config.model_paths.iter().any(|m| m == dir))
}

fn targets_model(target: &str, model: &str) -> bool {
    let root = target
        .split(['.', '(', ' '])
        .next()
        .unwrap_or(target)
        .trim_start_matches("::");
    root == model || SELF_REFERENCES.contains(&root)
}

/// The call in `statement` that stubs `model`, if any
fn stubbing_call<'a>(statement: &'a Statement, model: &str) -> Option<&'a CallSite> {
    statement.calls.iter().find(|call| {
        let name = call.name.as_str();
        let argument_targets = || call.first_arg_unquoted().is_some_and(|arg| targets_model(arg, model));

        if TARGETED_DOUBLES.contains(&name) {
            argument_targets()
        } else if name == "expect" || name == "expect_any_instance_of" {
            argument_targets() && MESSAGE_MATCHERS.iter().any(|m| statement.calls_named(m))
        } else if RECEIVER_STUBS.contains(&name) {
            call.receiver.root().is_some_and(|root| targets_model(root, model))
        } else {
            false
        }
    })
}

impl StyleRule for AvoidModelMockingRule {
    fn id(&self) -> &'static str {
        "avoid-unnecessary-mocking-in-model-specs"
    }

    fn description(&self) -> &'static str {
        "Model specs exercise the real model instead of stubbing it"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Describe]
    }

    fn check(
        &self,
        ctx: &RuleContext,
        node: &Node,
        out: &mut DiagnosticCollector,
    ) -> Result<(), RuleError> {
        if !ctx.is_top_level() || node.label.kind != LabelKind::Constant || !is_model_spec(ctx, node)
        {
            return Ok(());
        }

        let model = node.label.text.trim_start_matches("::");
        for statement in node.all_statements() {
            let Some(call) = stubbing_call(statement, model) else {
                continue;
            };
            out.report(
                format!("`{}` stubs the model under test `{}`", call.name, model),
                SourceLocation::new(ctx.tree.file.clone(), SourceSpan::point(call.position)),
            )
            .suggestion = Some(format!("exercise a real `{}` instead of stubbing it", model));
        }
        Ok(())
    }
}
