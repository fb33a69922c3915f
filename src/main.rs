//! # speclint
//!
//! Checks RSpec style spec files against a set of style rules.
//!
//! ```sh
//! # Lint every *_spec.rb below spec/
//! speclint lint spec
//!
//! # Only some rules, machine readable output
//! speclint lint spec --rules no-should-wording,single-expectation --format json
//!
//! # List available rules
//! speclint rules
//! ```
//!
//! Exit codes: 0 clean, 1 violations found, 2 unparsable input, failing rule or fatal error.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::LevelFilter;
use speclint::config::LintConfig;
use speclint::report::{self, EXIT_FAILURE};
use speclint::workspace::{collect_spec_files, lint_files};
use speclint::{ExitPolicy, ReportFormat, RuleEngine};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Junit,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Junit => ReportFormat::Junit,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "speclint",
    version,
    about = "Lint RSpec style spec files for common style issues"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output, repeat for trace level
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lint spec files or directories
    Lint(LintArgs),
    /// List all available rules
    Rules {
        /// Configuration file used to resolve severities and enabled rules
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct LintArgs {
    /// Files or directories to lint
    #[arg(name = "PATHS", required = true)]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "text")]
    format: OutputFormat,

    /// Run only these rules (comma-separated)
    #[arg(short = 'r', long = "rules", value_delimiter = ',')]
    rules: Vec<String>,

    /// Configuration file, TOML or JSON
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Exit with an error code if any warnings are found
    #[arg(long = "deny-warnings")]
    deny_warnings: bool,

    /// Do not print the summary line
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.format_target(false).init();
}

/// Explicit `--config` wins, otherwise the nearest config file above `start`
fn load_config(explicit: Option<&Path>, start: &Path) -> Result<LintConfig> {
    match explicit {
        Some(path) => LintConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => LintConfig::discover(start).context("failed to load config"),
    }
}

fn run_lint(args: LintArgs) -> Result<i32> {
    let mut config = load_config(args.config.as_deref(), &args.paths[0])?;
    config.merge_cli_options(&args.rules, args.deny_warnings);
    let engine = RuleEngine::new(&config)?;
    log::debug!("enabled rules: {}", engine.enabled_rules().join(", "));

    let files = collect_spec_files(&args.paths)?;
    if files.is_empty() && !args.quiet {
        eprintln!("No spec files found");
    }

    let violations = lint_files(&files, &engine);
    let rendered = report::format(&violations, args.format.into())?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("failed to write report")?;
    stdout.flush()?;
    if !args.quiet && args.format == OutputFormat::Text {
        eprintln!("{}", report::summary(&violations));
    }

    let policy = ExitPolicy {
        deny_warnings: config.deny_warnings,
    };
    Ok(report::exit_code(&violations, policy))
}

fn run_rules(config: Option<PathBuf>) -> Result<i32> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = load_config(config.as_deref(), &cwd)?;
    let engine = RuleEngine::new(&config)?;

    println!("Available rules:\n");
    for rule in engine.registry().all() {
        let state = if engine.enabled_rules().contains(&rule.id()) {
            ""
        } else {
            " (disabled)"
        };
        println!(
            "  {:42} [{}] {}{}",
            rule.id(),
            engine.effective_severity(rule),
            rule.description(),
            state
        );
    }
    Ok(0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Lint(args) => run_lint(args),
        Command::Rules { config } => run_rules(config),
    };

    match outcome {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(EXIT_FAILURE as u8)
        }
    }
}
