//! Linter configuration.
//!
//! Loaded once at startup from `--config <path>` or, when that is absent, from the
//! nearest `.speclint.toml` / `speclint.toml` in the first input path's directory
//! or any parent directory.
//!
//! ```toml
//! disabled_rules = ["single-expectation"]
//! deny_warnings = true
//! context_prefixes = ["when", "with", "without"]
//!
//! [severity_overrides]
//! no-single-test-context = "error"
//! ```

use crate::analysis::diagnostic::Severity;
use crate::SpeclintError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names to search for, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[".speclint.toml", "speclint.toml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Rules that never run
    pub disabled_rules: Vec<String>,
    /// When non-empty only these rules run
    pub enabled_rules: Vec<String>,
    pub severity_overrides: BTreeMap<String, Severity>,
    /// Warnings fail the run too
    pub deny_warnings: bool,
    /// Accepted first words of a `context` label
    pub context_prefixes: Vec<String>,
    /// Directory names whose specs describe models
    pub model_paths: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            enabled_rules: Vec::new(),
            severity_overrides: BTreeMap::new(),
            deny_warnings: false,
            context_prefixes: vec!["when".to_string()],
            model_paths: vec!["models".to_string()],
        }
    }
}

impl LintConfig {
    /// Check if a rule should be run
    pub fn should_run(&self, rule: &str) -> bool {
        if self.disabled_rules.iter().any(|r| r == rule) {
            return false;
        }
        self.enabled_rules.is_empty() || self.enabled_rules.iter().any(|r| r == rule)
    }

    pub fn from_toml(contents: &str) -> Result<Self, SpeclintError> {
        toml::from_str(contents).map_err(|e| SpeclintError::Config(e.to_string()))
    }

    pub fn from_json(contents: &str) -> Result<Self, SpeclintError> {
        serde_json::from_str(contents).map_err(|e| SpeclintError::Config(e.to_string()))
    }

    /// Loads a config file, JSON when the extension says so and TOML otherwise
    pub fn from_file(path: &Path) -> Result<Self, SpeclintError> {
        let contents = fs::read_to_string(path).map_err(|source| SpeclintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&contents)
        } else {
            Self::from_toml(&contents)
        };
        parsed.map_err(|e| match e {
            SpeclintError::Config(reason) => {
                SpeclintError::Config(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Finds the nearest config file at or above `start`
    pub fn find_config_file(start: &Path) -> Option<PathBuf> {
        let mut current = if start.is_file() {
            start.parent()?.to_path_buf()
        } else {
            start.to_path_buf()
        };

        loop {
            for config_name in CONFIG_FILE_NAMES {
                let config_path = current.join(config_name);
                if config_path.is_file() {
                    return Some(config_path);
                }
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Loads the nearest config file or falls back to defaults.
    /// A config file that exists but does not parse is an error, not a fallback
    pub fn discover(start: &Path) -> Result<Self, SpeclintError> {
        match Self::find_config_file(start) {
            Some(path) => {
                debug!("using config {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Merge CLI options into this config, with CLI taking precedence
    pub fn merge_cli_options(&mut self, cli_rules: &[String], cli_deny_warnings: bool) {
        if !cli_rules.is_empty() {
            self.enabled_rules = cli_rules.to_vec();
        }
        if cli_deny_warnings {
            self.deny_warnings = true;
        }
    }

    /// Every rule id the config mentions, for validation against the registry
    pub fn referenced_rules(&self) -> impl Iterator<Item = &str> {
        self.disabled_rules
            .iter()
            .chain(&self.enabled_rules)
            .chain(self.severity_overrides.keys())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_toml() {
        let config = LintConfig::from_toml(
            r#"
disabled_rules = ["single-expectation"]
deny_warnings = true

[severity_overrides]
no-single-test-context = "error"
"#,
        )
        .unwrap();
        assert_eq!(config.disabled_rules, vec!["single-expectation"]);
        assert!(config.deny_warnings);
        assert_eq!(
            config.severity_overrides.get("no-single-test-context"),
            Some(&Severity::Error)
        );
        assert_eq!(config.context_prefixes, vec!["when"]);
        assert!(!config.should_run("single-expectation"));
        assert!(config.should_run("no-should-wording"));
    }

    #[test]
    fn parses_json() {
        let config =
            LintConfig::from_json(r#"{"enabled_rules": ["no-should-wording"]}"#).unwrap();
        assert!(config.should_run("no-should-wording"));
        assert!(!config.should_run("single-expectation"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = LintConfig::from_toml("min_level = \"warning\"\n");
        assert!(matches!(result, Err(SpeclintError::Config(_))));
    }

    #[test]
    fn rejects_unknown_severity() {
        let result = LintConfig::from_toml("[severity_overrides]\nfoo = \"fatal\"\n");
        assert!(matches!(result, Err(SpeclintError::Config(_))));
    }

    #[test]
    fn cli_rules_replace_enabled_rules() {
        let mut config = LintConfig {
            enabled_rules: vec!["a".into()],
            ..Default::default()
        };
        config.merge_cli_options(&["b".into(), "c".into()], true);
        assert_eq!(config.enabled_rules, vec!["b", "c"]);
        assert!(config.deny_warnings);
        assert_eq!(config.referenced_rules().collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
