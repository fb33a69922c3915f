use pretty_assertions::assert_eq;
use speclint::config::LintConfig;
use speclint::report::{self, EXIT_FAILURE, EXIT_VIOLATIONS};
use speclint::workspace::{collect_spec_files, lint_files};
use speclint::{ExitPolicy, ReportFormat, RuleEngine, SYNTAX_ERROR_RULE, Severity, Violation};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CLEAN_SPEC: &str = r##"
RSpec.describe Cart do
  describe "#total" do
    context "when empty" do
      it "is zero" do
        expect(Cart.new.total).to eq(0)
      end

      it "has no items" do
        expect(Cart.new.items).to be_empty
      end
    end
  end
end
"##;

const NOISY_SPEC: &str = r#"
RSpec.describe Order do
  context "paid" do
    it "should ship" do
      expect(order.ship).to be(true)
    end
  end
end
"#;

const BROKEN_SPEC: &str = r#"
describe Order do
  it "never ends" do
"#;

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            f.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

fn summary(violations: &[Violation]) -> Vec<(String, usize, String)> {
    violations
        .iter()
        .map(|v| {
            let file = Path::new(v.location.file.as_ref())
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string();
            (file, v.location.line(), v.rule_id.clone())
        })
        .collect()
}

#[test]
fn discovers_spec_files_recursively() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "spec/models/cart_spec.rb", CLEAN_SPEC);
    write(root, "spec/requests/orders_spec.rb", NOISY_SPEC);
    write(root, "spec/spec_helper.rb", "RSpec.configure { }\n");
    write(root, "spec/.hidden/ignored_spec.rb", NOISY_SPEC);
    write(root, "vendor/gems/thing_spec.rb", NOISY_SPEC);
    write(root, "tmp/cache_spec.rb", NOISY_SPEC);

    let files = collect_spec_files(&[root.to_path_buf()]).unwrap();
    assert_eq!(
        relative(root, &files),
        vec!["spec/models/cart_spec.rb", "spec/requests/orders_spec.rb"]
    );
}

#[test]
fn aggregates_sorted_results_across_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "spec/b_spec.rb", NOISY_SPEC);
    write(root, "spec/a_spec.rb", NOISY_SPEC);
    write(root, "spec/c_spec.rb", CLEAN_SPEC);

    let engine = RuleEngine::new(&LintConfig::default()).unwrap();
    let files = collect_spec_files(&[root.join("spec")]).unwrap();
    let violations = lint_files(&files, &engine);

    let per_file = vec![
        (3, "context-starts-with-when".to_string()),
        (3, "no-single-test-context".to_string()),
        (4, "no-should-wording".to_string()),
    ];
    let mut expected = Vec::new();
    for file in ["a_spec.rb", "b_spec.rb"] {
        for (line, rule) in &per_file {
            expected.push((file.to_string(), *line, rule.clone()));
        }
    }
    assert_eq!(summary(&violations), expected);
    assert_eq!(lint_files(&files, &engine), violations);
    assert_eq!(
        report::exit_code(&violations, ExitPolicy::default()),
        EXIT_VIOLATIONS
    );
}

#[test]
fn broken_files_do_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "broken_spec.rb", BROKEN_SPEC);
    write(root, "orders_spec.rb", NOISY_SPEC);

    let engine = RuleEngine::new(&LintConfig::default()).unwrap();
    let files = collect_spec_files(&[root.to_path_buf()]).unwrap();
    let violations = lint_files(&files, &engine);

    let broken: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.location.file.ends_with("broken_spec.rb"))
        .collect();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].rule_id, SYNTAX_ERROR_RULE);
    assert_eq!(broken[0].severity, Severity::Error);
    assert_eq!(violations.len(), 4);
    assert_eq!(
        report::exit_code(&violations, ExitPolicy::default()),
        EXIT_FAILURE
    );
}

#[test]
fn config_file_is_discovered_and_applied() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        ".speclint.toml",
        r#"
disabled_rules = ["no-should-wording"]
context_prefixes = ["when", "paid"]

[severity_overrides]
no-single-test-context = "error"
"#,
    );
    let spec = write(root, "spec/orders/orders_spec.rb", NOISY_SPEC);

    let config = LintConfig::discover(&spec).unwrap();
    let engine = RuleEngine::new(&config).unwrap();
    let violations = lint_files(&[spec], &engine);

    assert_eq!(
        summary(&violations),
        vec![("orders_spec.rb".to_string(), 3, "no-single-test-context".to_string())]
    );
    assert_eq!(violations[0].severity, Severity::Error);
}

#[test]
fn json_config_and_unknown_rules() {
    let dir = TempDir::new().unwrap();
    let good = write(dir.path(), "speclint.json", r#"{"enabled_rules": ["no-should-wording"]}"#);
    let bad = write(dir.path(), "bad.toml", "disabled_rules = [\"not-a-rule\"]\n");

    let config = LintConfig::from_file(&good).unwrap();
    let engine = RuleEngine::new(&config).unwrap();
    assert_eq!(engine.enabled_rules(), ["no-should-wording"]);

    let config = LintConfig::from_file(&bad).unwrap();
    assert!(RuleEngine::new(&config).is_err());
}

#[test]
fn inline_directives_suppress_findings() {
    let dir = TempDir::new().unwrap();
    let source = NOISY_SPEC.replace(
        "  it \"should ship\" do",
        "  # speclint:disable-next-line no-should-wording\n  it \"should ship\" do",
    );
    let spec = write(dir.path(), "orders_spec.rb", &source);

    let engine = RuleEngine::new(&LintConfig::default()).unwrap();
    let violations = lint_files(&[spec], &engine);
    assert!(violations.iter().all(|v| v.rule_id != "no-should-wording"));
    assert_eq!(violations.len(), 2);

    let junit = report::format(&violations, ReportFormat::Junit).unwrap();
    assert_eq!(junit.matches("<testcase ").count(), 2);
}

#[test]
fn directive_text_inside_labels_is_not_a_directive() {
    let source = "describe Order do\n  it 'documents # speclint:bogus' do\n    expect(1).to eq(1)\n  end\nend\n";
    let engine = RuleEngine::new(&LintConfig::default()).unwrap();
    let violations = speclint::lint_source(source, "order_spec.rb", &engine);
    assert!(violations.iter().all(|v| v.rule_id != SYNTAX_ERROR_RULE));
}

#[test]
fn unknown_directive_is_reported_on_its_line() {
    let source = "describe Order do\n  it 'ships' do\n    # speclint:bogus\n    expect(1).to eq(1)\n  end\nend\n";
    let engine = RuleEngine::new(&LintConfig::default()).unwrap();
    let violations = speclint::lint_source(source, "order_spec.rb", &engine);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_id, SYNTAX_ERROR_RULE);
    assert_eq!(violations[0].location.line(), 3);
}

#[test]
fn byte_order_mark_does_not_break_parsing() {
    let dir = TempDir::new().unwrap();
    let spec = write(dir.path(), "cart_spec.rb", &format!("\u{feff}{}", CLEAN_SPEC));

    let engine = RuleEngine::new(&LintConfig::default()).unwrap();
    assert_eq!(lint_files(&[spec], &engine), Vec::<Violation>::new());
}
