use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("groqspec").unwrap();
    cmd.current_dir(dir.path()).env_remove("SANITY_TOKEN").env_remove("RUST_LOG");
    cmd
}

#[test]
fn index_renders_versions_from_stdin() {
    let dir = TempDir::new().unwrap();
    let out = cmd(&dir)
        .arg("index")
        .write_stdin("v1 1000\nv2 2000\n")
        .assert()
        .success()
        .stdout(contains("<title>GROQ Specification Versions</title>"))
        .stdout(contains("<em>Prerelease</em>"))
        .stdout(contains("<em>Latest release</em>"))
        .get_output()
        .stdout
        .clone();

    let html = String::from_utf8(out).unwrap();
    let draft = html.find("Working Draft").unwrap();
    let v1 = html.find(r#"<a href="v1">"#).unwrap();
    let v2 = html.find(r#"<a href="v2">"#).unwrap();
    assert!(draft < v1 && v1 < v2);
}

#[test]
fn index_with_empty_input_lists_draft_only() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("index")
        .write_stdin("")
        .assert()
        .success()
        .stdout(contains("Working Draft"))
        .stdout(contains("Latest release").not());
}

#[test]
fn generate_without_token_exits_with_instructions() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("generate")
        .assert()
        .code(1)
        .stdout(contains("ERR: SANITY_TOKEN is required."))
        .stdout(contains("ERR: Run `sanity debug --secrets` to retrieve it."));

    assert!(!dir.path().join("spec").exists());
}

#[test]
fn watch_without_token_exits_before_spawning() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["watch", "touch", "ran"])
        .assert()
        .code(1)
        .stdout(contains("SANITY_TOKEN is required"));

    assert!(!dir.path().join("ran").exists());
}

#[test]
fn token_env_var_follows_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("groqspec.toml"),
        "[content]\ntoken_env = \"GROQSPEC_TEST_TOKEN\"\n",
    )
    .unwrap();

    cmd(&dir)
        .env_remove("GROQSPEC_TEST_TOKEN")
        .arg("fetch")
        .assert()
        .code(1)
        .stdout(contains("ERR: GROQSPEC_TEST_TOKEN is required."));
}

#[test]
fn config_init_then_show() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(contains("Config initialized at"));
    assert!(dir.path().join("groqspec.toml").exists());

    cmd(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("3do82whm"))
        .stdout(contains("spec-md"));

    cmd(&dir).args(["config", "init"]).assert().failure();
}

#[test]
fn html_with_builtin_compiler() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("groqspec.toml"),
        "[html]\ncompiler = \"builtin\"\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("spec")).unwrap();
    fs::write(
        dir.path().join("spec/GROQ.md"),
        "GROQ\n-------\n\nIntro.\n\n# [Overview](Section%201%20--%20Overview.md)\n\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("spec/Section 1 -- Overview.md"),
        "Overview\n-------\n\nGraph-Relational Object Queries.\n\n",
    )
    .unwrap();

    cmd(&dir).arg("html").assert().success();

    let html = fs::read_to_string(dir.path().join("docs/index.html")).unwrap();
    assert!(html.contains("<h2>Overview</h2>"));
    assert!(html.contains("Graph-Relational Object Queries."));
}

#[test]
fn html_without_root_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("groqspec.toml"),
        "[html]\ncompiler = \"builtin\"\n",
    )
    .unwrap();

    cmd(&dir).arg("html").assert().failure();
    assert!(!dir.path().join("docs/index.html").exists());
}
