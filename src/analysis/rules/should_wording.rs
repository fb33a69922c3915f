use crate::analysis::context::RuleContext;
use crate::analysis::diagnostic::{DiagnosticCollector, Severity};
use crate::analysis::rule::{RuleError, StyleRule};
use crate::parser::ast::{Node, NodeKind};

// Rule to keep examples in third person present tense
pub struct NoShouldWordingRule;

/// `should return true` -> `returns true`
fn rephrase(rest: &str) -> String {
    let (verb, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    let verb = match verb {
        "be" => "is".to_string(),
        "have" => "has".to_string(),
        "do" => "does".to_string(),
        "not" => "does not".to_string(),
        v if v.ends_with('s')
            || v.ends_with("sh")
            || v.ends_with("ch")
            || v.ends_with('x')
            || v.ends_with('z') =>
        {
            format!("{}es", v)
        }
        v if v.ends_with('y')
            && v.len() > 1
            && !v[..v.len() - 1].ends_with(['a', 'e', 'i', 'o', 'u']) =>
        {
            format!("{}ies", &v[..v.len() - 1])
        }
        v => format!("{}s", v),
    };
    if tail.is_empty() {
        verb
    } else {
        format!("{} {}", verb, tail)
    }
}

impl StyleRule for NoShouldWordingRule {
    fn id(&self) -> &'static str {
        "no-should-wording"
    }

    fn description(&self) -> &'static str {
        "Example descriptions must not start with 'should'"
    }

    fn severity(&self) -> Severity {
        Severity::Error
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
        let text = node.label.text.as_str();
        let rest = match text.get(..7) {
            Some(prefix) if prefix.eq_ignore_ascii_case("should ") => Some(text[7..].trim_start()),
            _ if text.eq_ignore_ascii_case("should") => None,
            _ => return Ok(()),
        };

        let violation = out.report(
            format!("example description '{}' starts with 'should'", text),
            node.location.clone(),
        );
        if let Some(rest) = rest.filter(|r| !r.is_empty()) {
            violation.suggestion = Some(rephrase(rest));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rephrase;
    use crate::analysis::rules::test_support::{lines, lint};
    use pretty_assertions::assert_eq;

    const RULE: &str = "no-should-wording";

    #[test]
    fn flags_should_labels() {
        let source = r#"
describe Thing do
  it "should return true" do
  end

  it "returns true" do
  end

  it "Should not crash" do
  end

  it "shoulders the load" do
  end
end
"#;
        let violations = lint(RULE, source);
        assert_eq!(lines(&violations), vec![3, 9]);
        assert_eq!(violations[0].suggestion.as_deref(), Some("returns true"));
        assert_eq!(violations[1].suggestion.as_deref(), Some("does not crash"));
    }

    #[test]
    fn rephrasing() {
        assert_eq!(rephrase("be valid"), "is valid");
        assert_eq!(rephrase("match the pattern"), "matches the pattern");
        assert_eq!(rephrase("apply discounts"), "applies discounts");
        assert_eq!(rephrase("destroy the record"), "destroys the record");
        assert_eq!(rephrase("work"), "works");
    }
}
