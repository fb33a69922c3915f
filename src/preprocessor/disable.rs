use crate::SpeclintError;
use crate::preprocessor::{ALL_RULES, DirectiveHandler, PreprocessorState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableScope {
    File,
    ThisLine,
    NextLine,
}

/// Handler for the `disable`, `disable-line` and `disable-next-line` directives.
/// Takes rule ids separated by commas or spaces, no ids means every rule
pub struct DisableDirective(pub DisableScope);

impl DirectiveHandler for DisableDirective {
    fn process(
        &self,
        line: usize,
        args: &str,
        state: &mut PreprocessorState,
    ) -> Result<(), SpeclintError> {
        let mut rule_ids: Vec<&str> = args
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|id| !id.is_empty())
            .collect();
        if rule_ids.is_empty() {
            rule_ids.push(ALL_RULES);
        }

        if let Some(bad) = rule_ids
            .iter()
            .find(|id| !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(SpeclintError::InvalidDirective {
                line,
                reason: format!("'{}' is not a rule id", bad),
            });
        }

        for rule_id in rule_ids {
            match self.0 {
                DisableScope::File => state.suppress_file(rule_id),
                DisableScope::ThisLine => state.suppress_line(line, rule_id),
                DisableScope::NextLine => state.suppress_line(line + 1, rule_id),
            }
        }
        Ok(())
    }
}
