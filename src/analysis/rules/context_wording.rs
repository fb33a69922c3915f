use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity};
use crate::analysis::rule::{RuleError, StyleRule};
use crate::parser::ast::{LabelKind, Node, NodeKind};

// Rule to make context labels read as conditions
pub struct ContextStartsWithWhenRule;

impl StyleRule for ContextStartsWithWhenRule {
    fn id(&self) -> &'static str {
        "context-starts-with-when"
    }

    fn description(&self) -> &'static str {
        "Context descriptions start with 'when'"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Context]
    }

    fn check(
        &self,
        ctx: &RuleContext,
        node: &Node,
        out: &mut DiagnosticCollector,
    ) -> Result<(), RuleError> {
        // any string label has wording, `context "#save"` included
        if !matches!(
            node.label.kind,
            LabelKind::Description | LabelKind::InstanceMethod | LabelKind::ClassMethod
        ) {
            return Ok(());
        }

        let text = node.label.text.trim_start();
        let first_word = text.split_whitespace().next().unwrap_or("");
        let prefixes = &ctx.config.context_prefixes;
        if prefixes.iter().any(|p| first_word.eq_ignore_ascii_case(p)) {
            return Ok(());
        }

        let expected = prefixes.first().map(String::as_str).unwrap_or("when");
        out.report(
            format!("context '{}' does not start with '{}'", node.label.text, expected),
            node.location.clone(),
        )
        .suggestion = Some(format!("{} {}", expected, text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::LintConfig;
    use crate::analysis::rules::test_support::{lines, lint, lint_with};

    const RULE: &str = "context-starts-with-when";

    const SOURCE: &str = r#"
describe User do
  context "when user is unsubscribed" do
  end

  context "user is unsubscribed" do
  end

  context "with a coupon" do
  end

  context "When logged in" do
  end
end
"#;

    #[test]
    fn flags_contexts_without_when() {
        let violations = lint(RULE, SOURCE);
        assert_eq!(lines(&violations), vec![6, 9]);
        assert_eq!(
            violations[0].suggestion.as_deref(),
            Some("when user is unsubscribed")
        );
    }

    #[test]
    fn prefixes_are_configurable() {
        let config = LintConfig {
            context_prefixes: vec!["when".into(), "with".into()],
            ..Default::default()
        };
        let violations = lint_with(RULE, "spec/user_spec.rb", SOURCE, config);
        assert_eq!(lines(&violations), vec![6]);
    }

    #[test]
    fn method_style_context_labels_are_checked() {
        let source = r##"
describe User do
  context "#save" do
    it "persists" do
    end

    it "returns true" do
    end
  end

  context ".find" do
    it "loads" do
    end

    it "raises when missing" do
    end
  end

  context :admin do
  end
end
"##;
        let violations = lint(RULE, source);
        assert_eq!(lines(&violations), vec![3, 11]);
        assert_eq!(violations[0].suggestion.as_deref(), Some("when #save"));
    }
}
