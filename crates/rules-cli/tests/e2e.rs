//! End-to-end tests for the `rules-cli` binary: write a document and an
//! input file to a temp dir, invoke the built binary, and assert on stdout.

use std::path::PathBuf;
use std::process::Command;

fn find_rules_cli() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();

    if path.file_name().map_or(false, |n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }

    let bin = path.join("rules-cli");
    assert!(bin.exists(), "rules-cli binary not found at {}. Run `cargo build -p rules-cli` first.", bin.display());
    bin
}

fn run_cli(document: &str, input: &str) -> std::process::Output {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let doc_path = temp_dir.path().join("rule.yaml");
    let input_path = temp_dir.path().join("input.json");
    std::fs::write(&doc_path, document).expect("failed to write rule.yaml");
    std::fs::write(&input_path, input).expect("failed to write input.json");

    Command::new(find_rules_cli())
        .args(["run", doc_path.to_str().unwrap(), "--input", input_path.to_str().unwrap(), "--cache", "none"])
        .output()
        .expect("failed to invoke rules-cli")
}

#[test]
fn simple_rule_approves_on_matching_credit_score() {
    let document = r#"
name: credit check
inputs:
  creditScore: number
output:
  approval: approval
when:
  - "creditScore at_least 650"
then:
  - "set approval to \"APPROVED\""
else:
  - "set approval to \"DECLINED\""
"#;
    let output = run_cli(document, r#"{"creditScore": 700}"#);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("approval = APPROVED"), "stdout: {stdout}");
}

#[test]
fn simple_rule_declines_on_failing_credit_score() {
    let document = r#"
name: credit check
inputs:
  creditScore: number
output:
  approval: approval
when:
  - "creditScore at_least 650"
then:
  - "set approval to \"APPROVED\""
else:
  - "set approval to \"DECLINED\""
"#;
    let output = run_cli(document, r#"{"creditScore": 400}"#);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("approval = DECLINED"), "stdout: {stdout}");
}

#[test]
fn validate_only_skips_evaluation_output() {
    let document = r#"
name: credit check
inputs:
  creditScore: number
when:
  - "creditScore at_least 650"
then:
  - "set approval to \"APPROVED\""
"#;
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let doc_path = temp_dir.path().join("rule.yaml");
    std::fs::write(&doc_path, document).expect("failed to write rule.yaml");

    let output = Command::new(find_rules_cli())
        .args(["run", doc_path.to_str().unwrap(), "--validate-only"])
        .output()
        .expect("failed to invoke rules-cli");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).is_empty());
}
