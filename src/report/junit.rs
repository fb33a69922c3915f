use crate::analysis::diagnostic::Violation;
use std::fmt::Write;

/// Escape a string for safe interpolation into XML attributes and text.
/// Control characters XML 1.0 cannot carry are dropped
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() || c == '\u{fffe}' || c == '\u{ffff}' => {}
            c => out.push(c),
        }
    }
    out
}

/// One `<testsuite>` per file, one failing `<testcase>` per violation.
/// Expects `violations` sorted so each file's entries are adjacent
pub fn format_junit(violations: &[Violation]) -> String {
    let mut files: Vec<(&str, Vec<&Violation>)> = Vec::new();
    for violation in violations {
        let file: &str = &violation.location.file;
        match files.last_mut() {
            Some((current, group)) if *current == file => group.push(violation),
            _ => files.push((file, vec![violation])),
        }
    }

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<testsuites name=\"speclint\" tests=\"{0}\" failures=\"{0}\">",
        violations.len()
    );
    for (file, group) in &files {
        let _ = writeln!(
            out,
            "  <testsuite name=\"{0}\" tests=\"{1}\" failures=\"{1}\">",
            xml_escape(file),
            group.len()
        );
        for violation in group {
            let _ = writeln!(
                out,
                "    <testcase name=\"{}\" classname=\"{}\">",
                xml_escape(&format!(
                    "{} at {}:{}",
                    violation.rule_id,
                    violation.location.line(),
                    violation.location.column()
                )),
                xml_escape(file)
            );
            let _ = writeln!(
                out,
                "      <failure type=\"{}\" message=\"{}\">{}: {}</failure>",
                violation.severity,
                xml_escape(&violation.message),
                xml_escape(&violation.location.to_string()),
                xml_escape(&violation.message)
            );
            out.push_str("    </testcase>\n");
        }
        out.push_str("  </testsuite>\n");
    }
    out.push_str("</testsuites>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diagnostic::Severity;
    use crate::parser::ast::{SourceLocation, SourcePosition, SourceSpan};
    use std::sync::Arc;

    fn violation(file: &str, message: &str) -> Violation {
        let location = SourceLocation::new(
            Arc::from(file),
            SourceSpan::point(SourcePosition { line: 2, column: 3 }),
        );
        Violation::new("no-should-wording", Severity::Error, message, location)
    }

    #[test]
    fn groups_by_file() {
        let report = format_junit(&[
            violation("a_spec.rb", "one"),
            violation("a_spec.rb", "two"),
            violation("b_spec.rb", "three"),
        ]);
        assert!(report.starts_with("<?xml version=\"1.0\""));
        assert!(report.contains("<testsuites name=\"speclint\" tests=\"3\" failures=\"3\">"));
        assert!(report.contains("<testsuite name=\"a_spec.rb\" tests=\"2\" failures=\"2\">"));
        assert!(report.contains("<testsuite name=\"b_spec.rb\" tests=\"1\" failures=\"1\">"));
        assert_eq!(report.matches("<testcase ").count(), 3);
    }

    #[test]
    fn xml_special_chars_are_escaped() {
        let report = format_junit(&[violation("<evil>_spec.rb", "label \"should\" & <b>")]);
        assert!(report.contains("&lt;evil&gt;_spec.rb"));
        assert!(report.contains("label &quot;should&quot; &amp; &lt;b&gt;"));
        assert!(!report.contains("<evil>"));
        assert!(!report.contains("<b>"));
    }

    #[test]
    fn control_characters_are_dropped() {
        let report = format_junit(&[violation("a_spec.rb", "it \"beeps\u{7}\u{0}\" at\tnight\u{1b}[0m")]);
        assert!(report.contains("it &quot;beeps&quot; at\tnight[0m"));
        assert!(!report.chars().any(|c| matches!(c, '\u{0}' | '\u{7}' | '\u{1b}')));
    }

    #[test]
    fn empty_report() {
        let report = format_junit(&[]);
        assert!(report.contains("tests=\"0\""));
        assert!(report.ends_with("</testsuites>\n"));
    }
}
