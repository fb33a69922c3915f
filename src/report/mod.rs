//! Rendering of violation lists and the exit code policy.
//!
//! Everything here is pure, writing the rendered report is up to the caller.

mod junit;

use crate::SpeclintError;
use crate::analysis::diagnostic::{Severity, Violation};
use std::fmt::Write;

/// Process exit code for a clean run
pub const EXIT_CLEAN: i32 = 0;
/// Process exit code when violations fail the run
pub const EXIT_VIOLATIONS: i32 = 1;
/// Process exit code when a file could not be parsed or a rule failed
pub const EXIT_FAILURE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Junit,
}

/// Decides which violations fail a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitPolicy {
    pub deny_warnings: bool,
}

/// Renders `violations` in the given format
pub fn format(violations: &[Violation], format: ReportFormat) -> Result<String, SpeclintError> {
    match format {
        ReportFormat::Text => Ok(format_text(violations)),
        ReportFormat::Json => format_json(violations),
        ReportFormat::Junit => Ok(junit::format_junit(violations)),
    }
}

pub fn format_text(violations: &[Violation]) -> String {
    let mut out = String::new();
    for violation in violations {
        let _ = writeln!(out, "{}: {}", violation.severity, violation.message);
        let _ = writeln!(out, "  --> {}", violation.location);
        let _ = writeln!(out, "   = rule: {}", violation.rule_id);
        if let Some(suggestion) = &violation.suggestion {
            let _ = writeln!(out, "   = suggestion: {}", suggestion);
        }
        out.push('\n');
    }
    out
}

pub fn format_json(violations: &[Violation]) -> Result<String, SpeclintError> {
    let mut json = serde_json::to_string_pretty(violations)?;
    json.push('\n');
    Ok(json)
}

/// One line tally, `Found 3 issue(s): 1 error(s), 2 warning(s)`
pub fn summary(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "No issues found".to_string();
    }
    let errors = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    format!(
        "Found {} issue(s): {} error(s), {} warning(s)",
        violations.len(),
        errors,
        violations.len() - errors
    )
}

pub fn exit_code(violations: &[Violation], policy: ExitPolicy) -> i32 {
    if violations.iter().any(Violation::is_failure) {
        return EXIT_FAILURE;
    }
    let fails = |v: &Violation| match v.severity {
        Severity::Error => true,
        Severity::Warning => policy.deny_warnings,
    };
    if violations.iter().any(fails) {
        EXIT_VIOLATIONS
    } else {
        EXIT_CLEAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{SourceLocation, SourcePosition, SourceSpan};
    use crate::{INTERNAL_RULE_ERROR, SYNTAX_ERROR_RULE};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn violation(rule_id: &str, severity: Severity, line: usize) -> Violation {
        let location = SourceLocation::new(
            Arc::from("spec/user_spec.rb"),
            SourceSpan::point(SourcePosition { line, column: 5 }),
        );
        Violation::new(rule_id, severity, "something is off", location)
    }

    #[test]
    fn text_report() {
        let violations = vec![
            violation("no-should-wording", Severity::Error, 3).with_suggestion("returns true"),
            violation("single-expectation", Severity::Warning, 7),
        ];
        let expected = "\
error: something is off
  --> spec/user_spec.rb:3:5
   = rule: no-should-wording
   = suggestion: returns true

warning: something is off
  --> spec/user_spec.rb:7:5
   = rule: single-expectation

";
        assert_eq!(format(&violations, ReportFormat::Text).unwrap(), expected);
        assert_eq!(
            summary(&violations),
            "Found 2 issue(s): 1 error(s), 1 warning(s)"
        );
    }

    #[test]
    fn json_report_keeps_locations() {
        let violations = vec![violation("no-should-wording", Severity::Error, 12)];
        let rendered = format(&violations, ReportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed[0]["file"], "spec/user_spec.rb");
        assert_eq!(parsed[0]["line"], 12);
        assert_eq!(parsed[0]["column"], 5);
        assert_eq!(parsed[0]["rule"], "no-should-wording");
    }

    #[test]
    fn json_report_matches_parsed_locations() {
        let source = "describe User do\n  context \"when saved\" do\n    it \"should work\" do\n    end\n\n      it \"should persist\" do\n      end\n  end\nend\n";
        let tree = crate::parser::parse(source, Arc::from("spec/user_spec.rb")).unwrap();
        let examples: Vec<&SourceLocation> = tree.nodes[0].children[0]
            .children
            .iter()
            .map(|example| &example.location)
            .collect();

        let config = crate::LintConfig {
            enabled_rules: vec!["no-should-wording".into()],
            ..Default::default()
        };
        let engine = crate::RuleEngine::new(&config).unwrap();
        let violations = crate::lint_source(source, "spec/user_spec.rb", &engine);
        let rendered = format(&violations, ReportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        let reported: Vec<(u64, u64)> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|v| (v["line"].as_u64().unwrap(), v["column"].as_u64().unwrap()))
            .collect();
        let expected: Vec<(u64, u64)> = examples
            .iter()
            .map(|l| (l.line() as u64, l.column() as u64))
            .collect();
        assert_eq!(reported, expected);
        assert_eq!(reported, vec![(3, 5), (6, 7)]);
    }

    #[test]
    fn exit_codes() {
        let warning = violation("single-expectation", Severity::Warning, 1);
        let error = violation("no-should-wording", Severity::Error, 1);
        let lenient = ExitPolicy::default();
        let strict = ExitPolicy { deny_warnings: true };

        assert_eq!(exit_code(&[], lenient), EXIT_CLEAN);
        assert_eq!(exit_code(&[warning.clone()], lenient), EXIT_CLEAN);
        assert_eq!(exit_code(&[warning.clone()], strict), EXIT_VIOLATIONS);
        assert_eq!(exit_code(&[warning, error], lenient), EXIT_VIOLATIONS);
        assert_eq!(
            exit_code(&[violation(SYNTAX_ERROR_RULE, Severity::Error, 1)], lenient),
            EXIT_FAILURE
        );
        assert_eq!(
            exit_code(&[violation(INTERNAL_RULE_ERROR, Severity::Error, 1)], lenient),
            EXIT_FAILURE
        );
    }
}
