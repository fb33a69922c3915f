use crate::parser::ast::SourceLocation;
use crate::{INTERNAL_RULE_ERROR, SYNTAX_ERROR_RULE};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single deviation from a rule, owned by the engine's result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
    pub suggestion: Option<String>,
}

impl Violation {
    pub fn new(
        rule_id: &str,
        severity: Severity,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    pub fn syntax_error(location: SourceLocation, reason: impl Into<String>) -> Self {
        Self::new(SYNTAX_ERROR_RULE, Severity::Error, reason, location)
    }

    pub fn internal_error(rule_id: &str, reason: &str, location: SourceLocation) -> Self {
        Self::new(
            INTERNAL_RULE_ERROR,
            Severity::Error,
            format!("rule '{}' failed: {}", rule_id, reason),
            location,
        )
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Syntax and rule failures mean the file was not fully checked
    pub fn is_failure(&self) -> bool {
        self.rule_id == SYNTAX_ERROR_RULE || self.rule_id == INTERNAL_RULE_ERROR
    }
}

/// File, start position, then rule id. The span end only breaks ties after that.
impl Ord for Violation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.location
            .file
            .cmp(&other.location.file)
            .then(self.location.span.start.cmp(&other.location.span.start))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then(self.location.span.end.cmp(&other.location.span.end))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.severity.cmp(&other.severity))
            .then_with(|| self.suggestion.cmp(&other.suggestion))
    }
}

impl PartialOrd for Violation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Flat wire shape, `{"rule": .., "severity": .., "file": .., "line": ..}`
impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flat<'a> {
            rule: &'a str,
            severity: Severity,
            message: &'a str,
            file: &'a str,
            line: usize,
            column: usize,
            end_line: usize,
            end_column: usize,
            #[serde(skip_serializing_if = "Option::is_none")]
            suggestion: Option<&'a str>,
        }

        Flat {
            rule: &self.rule_id,
            severity: self.severity,
            message: &self.message,
            file: &self.location.file,
            line: self.location.line(),
            column: self.location.column(),
            end_line: self.location.span.end.line,
            end_column: self.location.span.end.column,
            suggestion: self.suggestion.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Findings of one rule invocation, merged into the engine's results only when the rule succeeds
#[derive(Debug)]
pub struct DiagnosticCollector {
    rule_id: &'static str,
    severity: Severity,
    violations: Vec<Violation>,
}

impl DiagnosticCollector {
    pub fn new(rule_id: &'static str, severity: Severity) -> Self {
        Self {
            rule_id,
            severity,
            violations: Vec::new(),
        }
    }

    /// Records a finding of the running rule at its configured severity
    pub fn report(&mut self, message: impl Into<String>, location: SourceLocation) -> &mut Violation {
        self.violations
            .push(Violation::new(self.rule_id, self.severity, message, location));
        let last = self.violations.len() - 1;
        &mut self.violations[last]
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{SourcePosition, SourceSpan};
    use std::sync::Arc;

    fn at(line: usize, column: usize) -> SourceLocation {
        SourceLocation::new(
            Arc::from("user_spec.rb"),
            SourceSpan::point(SourcePosition { line, column }),
        )
    }

    #[test]
    fn ordering_is_location_then_rule() {
        let mut violations = vec![
            Violation::new("b-rule", Severity::Warning, "x", at(3, 1)),
            Violation::new("a-rule", Severity::Error, "x", at(3, 1)),
            Violation::new("a-rule", Severity::Error, "x", at(1, 9)),
        ];
        violations.sort();
        let order: Vec<(usize, &str)> = violations
            .iter()
            .map(|v| (v.location.line(), v.rule_id.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "a-rule"), (3, "a-rule"), (3, "b-rule")]);
    }

    #[test]
    fn span_end_does_not_outrank_rule_id() {
        let wide = SourceLocation::new(
            Arc::from("user_spec.rb"),
            SourceSpan::new(
                SourcePosition { line: 3, column: 3 },
                SourcePosition { line: 9, column: 5 },
            ),
        );
        let mut violations = vec![
            Violation::new("z-rule", Severity::Warning, "x", at(3, 3)),
            Violation::new("a-rule", Severity::Warning, "x", wide),
        ];
        violations.sort();
        let order: Vec<&str> = violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(order, vec!["a-rule", "z-rule"]);
    }

    #[test]
    fn collector_uses_rule_severity() {
        let mut collector = DiagnosticCollector::new("no-should-wording", Severity::Warning);
        collector.report("bad", at(2, 3)).suggestion = Some("good".into());
        let violations = collector.into_violations();
        assert_eq!(violations[0].rule_id, "no-should-wording");
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[0].suggestion.as_deref(), Some("good"));
    }

    #[test]
    fn serializes_flat() {
        let violation = Violation::syntax_error(at(4, 2), "unexpected `end`");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["rule"], "syntax-error");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["line"], 4);
        assert!(json.get("suggestion").is_none());
        assert!(violation.is_failure());
    }
}
