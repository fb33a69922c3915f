//! File discovery and batch linting.

use crate::analysis::RuleEngine;
use crate::analysis::diagnostic::Violation;
use crate::parser::ast::{SourceLocation, SourcePosition, SourceSpan};
use crate::{SpeclintError, lint_source};
use log::{debug, info};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Suffix of the files directory discovery picks up
pub const SPEC_FILE_SUFFIX: &str = "_spec.rb";

/// Directory names never descended into
const SKIPPED_DIRS: &[&str] = &["vendor", "node_modules", "tmp"];

pub fn is_spec_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(SPEC_FILE_SUFFIX))
}

/// Expands `paths` into the spec files to lint, sorted and deduplicated.
/// Files named explicitly are kept whatever their name, directories are searched recursively
pub fn collect_spec_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, SpeclintError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(SpeclintError::Io {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            });
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !(name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()))
            });
        for entry in walker {
            let entry = entry.map_err(|e| SpeclintError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| path.clone()),
                source: e.into(),
            })?;
            if entry.file_type().is_file() && is_spec_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    debug!("collected {} spec file(s)", files.len());
    Ok(files)
}

/// Lints one file. An unreadable file yields a single `syntax-error` violation
pub fn lint_file(path: &Path, engine: &RuleEngine) -> Vec<Violation> {
    let file = path.to_string_lossy();
    match fs::read_to_string(path) {
        Ok(source) => lint_source(&source, &file, engine),
        Err(err) => {
            let location = SourceLocation::new(
                Arc::from(file.as_ref()),
                SourceSpan::point(SourcePosition { line: 1, column: 1 }),
            );
            vec![Violation::syntax_error(location, format!("failed to read file: {}", err))]
        }
    }
}

/// Lints every file on the rayon pool, then merges and sorts once all of them finished
pub fn lint_files(files: &[PathBuf], engine: &RuleEngine) -> Vec<Violation> {
    let per_file: Vec<Vec<Violation>> = files
        .par_iter()
        .map(|path| lint_file(path, engine))
        .collect();

    let mut violations: Vec<Violation> = per_file.into_iter().flatten().collect();
    violations.sort();
    info!(
        "linted {} file(s), {} violation(s)",
        files.len(),
        violations.len()
    );
    violations
}
