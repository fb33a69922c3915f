use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub mod analysis;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod report;
pub mod workspace;

pub use analysis::RuleEngine;
pub use analysis::diagnostic::{Severity, Violation};
pub use config::LintConfig;
pub use parser::ast::{Node, NodeKind, SourceLocation, SpecTree};
pub use report::{ExitPolicy, ReportFormat};

use crate::parser::ast::{SourcePosition, SourceSpan};
use crate::preprocessor::Preprocessor;

/// Rule id used for files that failed to parse
pub const SYNTAX_ERROR_RULE: &str = "syntax-error";

/// Rule id used when a rule implementation itself fails
pub const INTERNAL_RULE_ERROR: &str = "internal-rule-error";

/// Malformed input, carries where it went wrong
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {reason}")]
pub struct SyntaxError {
    pub location: SourceLocation,
    pub reason: String,
}

impl SyntaxError {
    pub fn new(file: &Arc<str>, position: SourcePosition, reason: impl Into<String>) -> Self {
        Self {
            location: SourceLocation::new(file.clone(), SourceSpan::point(position)),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeclintError {
    #[error("syntax error at {0}")]
    Syntax(#[from] SyntaxError),
    #[error("rule '{0}' is already registered")]
    DuplicateRule(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown speclint directive '{name}' on line {line}")]
    UnknownDirective { name: String, line: usize },
    #[error("invalid speclint directive on line {line}: {reason}")]
    InvalidDirective { line: usize, reason: String },
}

/// Lints one source text and returns its violations, sorted.
///
/// A file that fails to parse contributes exactly one `syntax-error` violation
/// instead of rule findings.
pub fn lint_source(source: &str, file: &str, engine: &RuleEngine) -> Vec<Violation> {
    let file: Arc<str> = Arc::from(file);

    let tree = match parser::parse(source, file.clone()) {
        Ok(tree) => tree,
        Err(err) => {
            warn!("{}", err);
            return vec![Violation::syntax_error(err.location, err.reason)];
        }
    };
    debug!("{}: parsed {} nodes", file, tree.node_count());

    let suppressions = match Preprocessor::new().process(&tree.comments) {
        Ok(suppressions) => suppressions,
        Err(err) => {
            warn!("{}: {}", file, err);
            let line = match &err {
                SpeclintError::UnknownDirective { line, .. }
                | SpeclintError::InvalidDirective { line, .. } => *line,
                _ => 1,
            };
            let location = SourceLocation::new(
                file.clone(),
                SourceSpan::point(SourcePosition { line, column: 1 }),
            );
            return vec![Violation::syntax_error(location, err.to_string())];
        }
    };

    let mut violations = engine.evaluate(&tree);
    violations.retain(|violation| !suppressions.suppresses(violation));
    violations
}
