//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Runs the binary with HOME pointed at the fixtures, so no user settings leak in.
fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("clipblock");
    cmd.env("HOME", FIXTURES).env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> String {
    format!("{}/{}", FIXTURES, name)
}

#[test]
fn test_cli_plaintext_paragraph() {
    cmd()
        .args(["--target", "#lead", "-f", "plaintext", &fixture("article.html")])
        .assert()
        .success()
        .stdout("Rust makes fearless concurrency practical.\n");
}

#[test]
fn test_cli_cell_copies_table() {
    cmd()
        .args(["--target", "#cell", &fixture("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Crate").and(predicate::str::contains("serde")));
}

#[test]
fn test_cli_markdown_with_source() {
    cmd()
        .args([
            "--target",
            "#post",
            "--attach-title",
            "--attach-url",
            "--lang",
            "en",
            "--page-url",
            "https://x.test/notes",
            &fixture("article.html"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("> # Field Notes"))
        .stdout(predicate::str::ends_with("> Source: [Field Notes](https://x.test/notes)\n"))
        .stdout(predicate::str::contains("Ownership"))
        .stdout(predicate::str::contains("Skip to comments").not())
        .stdout(predicate::str::contains("decorative glyphs").not())
        .stdout(predicate::str::contains("Hidden item").not());
}

#[test]
fn test_cli_chinese_label() {
    cmd()
        .args(["--target", "#lead", "-f", "plaintext", "--attach-title", "--lang", "zh", &fixture("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("---\n来源: Field Notes\n"));
}

#[test]
fn test_cli_interactive_target_fails() {
    cmd()
        .args(["--target", "#submit", &fixture("article.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No copyable content block"));
}

#[test]
fn test_cli_editor_target_fails() {
    cmd().args(["--target", "#draft", &fixture("article.html")]).assert().failure();
}

#[test]
fn test_cli_promote() {
    cmd()
        .args(["--target", "#lead", "--promote", "-f", "plaintext", &fixture("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Field Notes\n\nRust makes"))
        .stdout(predicate::str::contains("Borrowing"));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(fixture("article.html")).unwrap();
    cmd()
        .args(["--target", "#lead", "-f", "plaintext", "-"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("fearless"));
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("clip.md");

    cmd()
        .args(["--target", "#lead", "-o", output.to_str().unwrap(), &fixture("article.html")])
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("fearless"));
}

#[test]
fn test_cli_settings_file() {
    let tmp = TempDir::new().unwrap();
    let settings = tmp.path().join("settings.json");
    let json = serde_json::json!({ "outputFormat": "plaintext", "attachTitle": true, "language": "en" });
    std::fs::write(&settings, json.to_string()).unwrap();

    cmd()
        .args(["--target", "#lead", "--settings", settings.to_str().unwrap(), &fixture("article.html")])
        .assert()
        .success()
        .stdout("Rust makes fearless concurrency practical.\n\n---\nSource: Field Notes\n");
}

#[test]
fn test_cli_flags_override_settings_file() {
    let tmp = TempDir::new().unwrap();
    let settings = tmp.path().join("settings.json");
    std::fs::write(&settings, r#"{"outputFormat":"plaintext"}"#).unwrap();

    cmd()
        .args(["--target", "#list", "-f", "markdown", "--settings", settings.to_str().unwrap()])
        .arg(fixture("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^-\s+Ownership").unwrap());
}

#[test]
fn test_cli_invalid_settings_file() {
    let tmp = TempDir::new().unwrap();
    let settings = tmp.path().join("settings.json");
    std::fs::write(&settings, r#"{"outputFormat":"html"}"#).unwrap();

    cmd()
        .args(["--target", "#lead", "--settings", settings.to_str().unwrap(), &fixture("article.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("settings"));
}

#[test]
fn test_cli_snapshot_point() {
    cmd()
        .args(["--snapshot", "--point", "20,70", "-f", "plaintext", &fixture("snapshot.json")])
        .assert()
        .success()
        .stdout("Visible paragraph.\n");
}

#[test]
fn test_cli_snapshot_prunes_hidden_and_offscreen() {
    cmd()
        .args(["--snapshot", "--point", "5,5", "-f", "plaintext", "--attach-url", "--lang", "en"])
        .arg(fixture("snapshot.json"))
        .assert()
        .success()
        .stdout("Welcome\n\nVisible paragraph.\n\n---\nSource: https://x.test/snapshot\n");
}

#[test]
fn test_cli_snapshot_editable_fails() {
    cmd()
        .args(["--snapshot", "--point", "10,1600", &fixture("snapshot.json")])
        .assert()
        .failure();
}

#[test]
fn test_cli_target_requires_html() {
    cmd()
        .args(["--snapshot", "--target", "p", &fixture("snapshot.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target needs HTML input"));
}

#[test]
fn test_cli_invalid_selector() {
    cmd().args(["--target", "p[", &fixture("article.html")]).assert().failure();
}

#[test]
fn test_cli_requires_target_or_point() {
    cmd().arg(fixture("article.html")).assert().failure();
}

#[test]
fn test_cli_invalid_point() {
    cmd()
        .args(["--point", "abc", &fixture("article.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("X,Y"));
}

#[test]
fn test_cli_missing_file() {
    cmd()
        .args(["--target", "p", "/nonexistent/page.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipblock"));
}
