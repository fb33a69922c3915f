mod disable;

use crate::lexer::Comment;
use crate::preprocessor::disable::{DisableDirective, DisableScope};
use crate::{INTERNAL_RULE_ERROR, SpeclintError, Violation};
use log::trace;
use std::collections::{HashMap, HashSet};

/// Marker that starts an inline directive inside a comment
const DIRECTIVE_PREFIX: &str = "speclint:";

/// Wildcard accepted in place of a rule id
pub const ALL_RULES: &str = "all";

/// Reads `# speclint:<directive> <args>` comments and collects their effect
pub struct Preprocessor {
    directives: HashMap<String, Box<dyn DirectiveHandler>>,
    state: PreprocessorState,
}

/// Rule suppressions requested by inline directives
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreprocessorState {
    file: HashSet<String>,
    lines: HashMap<usize, HashSet<String>>,
}

impl PreprocessorState {
    pub fn suppress_file(&mut self, rule_id: &str) {
        self.file.insert(rule_id.to_string());
    }

    pub fn suppress_line(&mut self, line: usize, rule_id: &str) {
        self.lines.entry(line).or_default().insert(rule_id.to_string());
    }

    fn matches(set: &HashSet<String>, rule_id: &str) -> bool {
        set.contains(rule_id) || set.contains(ALL_RULES)
    }

    /// `internal-rule-error` is never suppressed
    pub fn suppresses(&self, violation: &Violation) -> bool {
        if violation.rule_id == INTERNAL_RULE_ERROR {
            return false;
        }
        Self::matches(&self.file, &violation.rule_id)
            || self
                .lines
                .get(&violation.location.line())
                .is_some_and(|rules| Self::matches(rules, &violation.rule_id))
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.lines.is_empty()
    }
}

pub trait DirectiveHandler {
    /// `line` is the 1-based line the directive comment sits on
    fn process(
        &self,
        line: usize,
        args: &str,
        state: &mut PreprocessorState,
    ) -> Result<(), SpeclintError>;
}

impl Preprocessor {
    pub fn new() -> Self {
        let mut p = Preprocessor {
            directives: HashMap::new(),
            state: PreprocessorState::default(),
        };
        p.register_directive("disable", Box::new(DisableDirective(DisableScope::File)));
        p.register_directive("disable-line", Box::new(DisableDirective(DisableScope::ThisLine)));
        p.register_directive(
            "disable-next-line",
            Box::new(DisableDirective(DisableScope::NextLine)),
        );
        p
    }

    pub fn register_directive(&mut self, name: &str, handler: Box<dyn DirectiveHandler>) {
        self.directives.insert(name.to_string(), handler);
    }

    /// Directive text of a comment, `disable foo` for `# speclint:disable foo`
    fn directive_text(comment: &Comment) -> Option<&str> {
        comment
            .text
            .trim_start()
            .strip_prefix(DIRECTIVE_PREFIX)
            .map(str::trim)
    }

    pub fn process(mut self, comments: &[Comment]) -> Result<PreprocessorState, SpeclintError> {
        for comment in comments {
            let Some(directive_line) = Self::directive_text(comment) else {
                continue;
            };
            let (directive_name, rest) = directive_line
                .split_once(char::is_whitespace)
                .unwrap_or((directive_line, ""));
            trace!("directive '{}' on line {}", directive_name, comment.line);

            match self.directives.get(directive_name) {
                Some(handler) => handler.process(comment.line, rest, &mut self.state)?,
                None => {
                    return Err(SpeclintError::UnknownDirective {
                        name: directive_name.to_string(),
                        line: comment.line,
                    });
                }
            }
        }
        Ok(self.state)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
