use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity};
use crate::analysis::rule::{RuleError, StyleRule};
use crate::parser::ast::{LabelKind, Node, NodeKind};

/// Single words that name a group of examples rather than a method
const GROUP_WORDS: &[&str] = &[
    "associations",
    "attributes",
    "callbacks",
    "constants",
    "delegations",
    "factories",
    "factory",
    "relationships",
    "scopes",
    "validations",
];

// Rule to keep method describes as `#method` or `.method`
pub struct MethodLabelFormatRule;

fn is_method_like(word: &str) -> bool {
    let body = word.strip_suffix(['?', '!', '=']).unwrap_or(word);
    let mut chars = body.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The `#x` / `.x` form a label should have been written as, if it names a method
fn expected_label(kind: LabelKind, text: &str) -> Option<String> {
    match kind {
        LabelKind::Symbol if is_method_like(text) => Some(format!("#{}", text)),
        LabelKind::Description => {
            if let Some(method) = text.strip_prefix("self.") {
                return is_method_like(method).then(|| format!(".{}", method));
            }
            (is_method_like(text) && !GROUP_WORDS.contains(&text)).then(|| format!("#{}", text))
        }
        _ => None,
    }
}

impl StyleRule for MethodLabelFormatRule {
    fn id(&self) -> &'static str {
        "method-label-format"
    }

    fn description(&self) -> &'static str {
        "Describe blocks for methods use '#method' or '.method'"
    }

    fn severity(&self) -> Severity {
        Severity::Error
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
        let under_top_level_describe =
            ctx.depth() == 1 && ctx.parent().is_some_and(|p| p.kind == NodeKind::Describe);
        if !under_top_level_describe {
            return Ok(());
        }

        if let Some(expected) = expected_label(node.label.kind, &node.label.text) {
            out.report(
                format!(
                    "describe label '{}' names a method without '#' or '.'",
                    node.label.text
                ),
                node.location.clone(),
            )
            .suggestion = Some(format!("describe \"{}\"", expected));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::expected_label;
    use crate::analysis::rules::test_support::{lines, lint};
    use crate::parser::ast::LabelKind;
    use pretty_assertions::assert_eq;

    const RULE: &str = "method-label-format";

    #[test]
    fn flags_bare_method_names() {
        let source = r##"
describe User do
  describe "#save" do
  end

  describe "save" do
    describe "valid?" do
    end
  end

  describe :destroy do
  end

  describe "self.find" do
  end

  describe "validations" do
  end

  describe "with a name" do
  end
end
"##;
        let violations = lint(RULE, source);
        assert_eq!(lines(&violations), vec![6, 11, 14]);
        assert_eq!(violations[0].suggestion.as_deref(), Some("describe \"#save\""));
        assert_eq!(violations[2].suggestion.as_deref(), Some("describe \".find\""));
    }

    #[test]
    fn labels() {
        assert_eq!(expected_label(LabelKind::Description, "name="), Some("#name=".into()));
        assert_eq!(expected_label(LabelKind::Description, "Name"), None);
        assert_eq!(expected_label(LabelKind::InstanceMethod, "#name"), None);
        assert_eq!(expected_label(LabelKind::Constant, "Admin::User"), None);
    }
}
