//! Integration tests for the `sitedeck` CLI binary.
//!
//! Argument parsing, help output and completions run without a platform.
//! Commands that talk to the platform run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `sitedeck` binary with env isolation.
///
/// Clears every variable the CLI reads and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn sitedeck_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sitedeck");
    cmd.env("HOME", "/tmp/sitedeck-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/sitedeck-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("SITEDECK_PROFILE")
        .env_remove("SITEDECK_API_URL")
        .env_remove("SITEDECK_OUTPUT")
        .env_remove("SITEDECK_TIMEOUT")
        .env_remove("NETLIFY_TOKEN")
        .env_remove("NETLIFY_ACCOUNT_SLUG")
        .env_remove("RUST_LOG");
    cmd
}

/// A command wired to `server` with a token and account slug.
fn platform_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = sitedeck_cmd();
    cmd.env("SITEDECK_API_URL", server.uri())
        .env("NETLIFY_TOKEN", "test-token")
        .env("NETLIFY_ACCOUNT_SLUG", "acme");
    cmd
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sitedeck_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    sitedeck_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("hosted sites")
            .and(predicate::str::contains("sites"))
            .and(predicate::str::contains("deploys"))
            .and(predicate::str::contains("builds")),
    );
}

#[test]
fn test_version_flag() {
    sitedeck_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitedeck"));
}

#[test]
fn test_invalid_subcommand() {
    sitedeck_cmd()
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_per_page_out_of_range_is_usage_error() {
    sitedeck_cmd()
        .args(["sites", "list", "--per-page", "500"])
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    sitedeck_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    sitedeck_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sitedeck"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_prints_toml_location() {
    sitedeck_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_unknown_profile_lists_available() {
    let output = sitedeck_cmd()
        .args(["--profile", "nope", "--token", "t", "builds", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Profile 'nope' not found"), "got:\n{text}");
}

// ── Credentials ─────────────────────────────────────────────────────

#[test]
fn test_missing_token_exits_with_auth_code() {
    let output = sitedeck_cmd()
        .args(["--api-url", "http://127.0.0.1:9", "sites", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(text.contains("No API token"), "got:\n{text}");
}

// ── Platform-backed commands ────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_sites_list_json_includes_last_deploy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "s1", "name": "alpha" },
            { "id": "s2", "name": "beta" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/deploys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "d1",
            "state": "ready",
            "created_at": "2024-06-15T10:30:00Z"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/s2/deploys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["sites", "list", "-o", "json"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let sites: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sites[0]["id"], json!("s1"));
    assert_eq!(sites[0]["lastDeploy"]["id"], json!("d1"));
    assert!(sites[1]["lastDeploy"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sites_get_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "Not Found"
        })))
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["sites", "get", "gone"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("site 'gone' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_refused_by_platform_reports_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploys/d1/cancel"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "Not Found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["deploys", "cancel", "s1", "d1", "--force"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(6));
    let text = combined_output(&output);
    assert!(
        text.contains("Deploy not found or cannot be cancelled"),
        "got:\n{text}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_finished_deploy_is_refused_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deploys/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d1",
            "site_id": "s1",
            "state": "ready"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/deploys/d1/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["deploys", "cancel", "s1", "d1"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(6));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_builds_list_plain_prints_site_and_deploy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "s1", "name": "alpha" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/s1/deploys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "d1", "state": "building" },
            { "id": "d0", "state": "ready" }
        ])))
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["builds", "list", "-o", "plain"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "s1\td1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_yes_in_pipeline_requires_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["sites", "delete", "s1"]).write_stdin("");
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

fn env_entry(key: &str, value: &str) -> serde_json::Value {
    json!({
        "key": key,
        "scopes": ["builds", "runtime", "post-processing"],
        "values": [{ "value": value, "context": "all" }]
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_env_set_keeps_variables_not_named() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/acme/env"))
        .and(query_param("site_id", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "key": "EXISTING", "values": [{ "value": "keep-me" }] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/acme/env"))
        .and(body_json(json!([
            env_entry("EXISTING", "keep-me"),
            env_entry("NEW", "1")
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["env", "set", "s1", "-e", "NEW=1"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_env_set_replace_sends_only_given_variables() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/acme/env"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/acme/env"))
        .and(body_json(json!([env_entry("NEW", "1")])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = platform_cmd(&server);
    cmd.args(["env", "set", "s1", "-e", "NEW=1", "--replace"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

fn write_profiles(dir: &std::path::Path) -> std::path::PathBuf {
    let config_dir = dir.join("sitedeck");
    std::fs::create_dir_all(&config_dir).unwrap();
    let file = config_dir.join("config.toml");
    std::fs::write(
        &file,
        r#"
default_profile = "agency"

[profiles.agency]
account_slug = "acme"

[profiles.staging]
account_slug = "acme-staging"
"#,
    )
    .unwrap();
    file
}

#[test]
fn test_config_use_saves_default_profile() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_profiles(dir.path());

    let output = sitedeck_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "use", "staging"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let saved = std::fs::read_to_string(&file).unwrap();
    assert!(saved.contains("default_profile = \"staging\""), "got:\n{saved}");
    assert!(saved.contains("acme-staging"));

    sitedeck_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* staging"));
}

#[test]
fn test_config_use_unknown_profile_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_profiles(dir.path());
    let before = std::fs::read_to_string(&file).unwrap();

    let output = sitedeck_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "use", "prod"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Profile 'prod' not found"), "got:\n{text}");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), before);
}

#[test]
fn test_config_show_reads_profile_and_masks_token() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("sitedeck");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        r#"
default_profile = "agency"

[profiles.agency]
account_slug = "acme"
token = "super-secret"

[profiles.agency.template]
repo = "acme/site-starter"
"#,
    )
    .unwrap();

    let output = sitedeck_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("profile       = \"agency\""), "got:\n{stdout}");
    assert!(stdout.contains("\"acme\""));
    assert!(stdout.contains("acme/site-starter"));
    assert!(!stdout.contains("super-secret"));
}
