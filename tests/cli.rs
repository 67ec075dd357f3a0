#![cfg(unix)]

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const TOKEN: &str = "integration-token-never-printed";

/// Isolated home directory plus a scriptable stand-in for wrangler.
struct TestEnv {
    tmp: TempDir,
    home: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        Self { tmp, home }
    }

    /// Write a fake `wrangler` that records that it ran, then prints `table`.
    fn wrangler(&self, table: &str) -> PathBuf {
        let path = self.tmp.path().join("wrangler");
        let script = format!(
            "#!/bin/sh\ntouch \"{}\"\ncat <<'EOF'\n{table}\nEOF\n",
            self.marker().display()
        );
        fs::write(&path, script).expect("write fake wrangler");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    fn write_config(&self, contents: &str) {
        let dir = self.home.join(".pages-reaper");
        fs::create_dir_all(&dir).expect("create config dir");
        fs::write(dir.join("config.toml"), contents).expect("write config");
    }

    fn marker(&self) -> PathBuf {
        self.tmp.path().join("wrangler-ran")
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("pages-reaper");
        cmd.env("HOME", &self.home)
            .env_remove("CF_ACCOUNT_ID")
            .env_remove("CF_API_TOKEN")
            .env_remove("CF_PAGES_PROJECT_NAME")
            .env_remove("PAGES_REAPER_LOG");
        cmd
    }

    fn authed(&self, wrangler: &Path) -> Command {
        let mut cmd = self.cmd();
        cmd.env("CF_ACCOUNT_ID", "acct-integration")
            .env("CF_API_TOKEN", TOKEN)
            .arg("--wrangler")
            .arg(wrangler);
        cmd
    }
}

#[test]
fn missing_credentials_fail_before_listing() {
    let env = TestEnv::new();
    let wrangler = env.wrangler("");

    env.cmd()
        .env("CF_API_TOKEN", TOKEN)
        .arg("--wrangler")
        .arg(&wrangler)
        .assert()
        .code(1)
        .stderr(contains("CF_ACCOUNT_ID"))
        .stderr(contains("CF_API_TOKEN"));

    assert!(!env.marker().exists(), "wrangler must not be spawned");
}

#[test]
fn empty_project_exits_cleanly() {
    let env = TestEnv::new();
    let wrangler = env.wrangler(
        "┌────┬─────────────┐\n│ Id │ Environment │\n└────┴─────────────┘",
    );

    env.authed(&wrangler)
        .assert()
        .success()
        .stdout(contains("No deployments found to delete"))
        .stdout(contains("Found 0 deployments"))
        .stdout(contains(TOKEN).not())
        .stderr(contains(TOKEN).not());

    assert!(env.marker().exists());
}

#[test]
fn single_deployment_is_kept_without_network() {
    let env = TestEnv::new();
    let wrangler =
        env.wrangler("│ aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa │ Production │ main │");

    env.authed(&wrangler)
        .arg("--project")
        .arg("manuscripts")
        .assert()
        .success()
        .stdout(contains("Cloudflare Pages reaper: project manuscripts"))
        .stdout(contains(
            "Keeping most recent deployment: aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa",
        ))
        .stdout(contains("Deleted: 0"))
        .stdout(contains("Failed:  0"))
        .stdout(contains("Kept:    1"));
}

#[test]
fn failing_wrangler_is_not_fatal() {
    let env = TestEnv::new();
    let path = env.tmp.path().join("broken-wrangler");
    fs::write(&path, "#!/bin/sh\necho 'not authenticated' >&2\nexit 1\n").expect("write");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");

    env.authed(&path)
        .assert()
        .success()
        .stderr(contains("could not list deployments"))
        .stdout(contains("No deployments found to delete"));
}

#[test]
fn dry_run_prints_plan_and_json_report() {
    let env = TestEnv::new();
    let wrangler = env.wrangler(
        "│ aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa │ Production │\n\
         │ bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb │ Preview    │",
    );

    env.authed(&wrangler)
        .args(["--dry-run", "--json"])
        .assert()
        .success()
        .stdout(contains("Would delete: 1"))
        .stdout(contains("  bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb"))
        .stdout(contains("\"dryRun\": true"))
        .stdout(contains(TOKEN).not());
}

#[test]
fn project_comes_from_environment() {
    let env = TestEnv::new();
    let wrangler = env.wrangler("");

    env.authed(&wrangler)
        .env("CF_PAGES_PROJECT_NAME", "from-env")
        .assert()
        .success()
        .stdout(contains("project from-env"));
}

#[test]
fn invalid_config_file_is_fatal() {
    let env = TestEnv::new();
    env.write_config("request-timeout-secs = \"soon\"\n");
    let wrangler = env.wrangler("");

    env.authed(&wrangler)
        .assert()
        .code(1)
        .stderr(contains("invalid config"));

    assert!(!env.marker().exists());
}

/// Answer `requests` DELETE calls, refusing any whose path contains `refuse`.
/// Returns the base URL and a handle yielding the request lines in order.
fn serve_deletes(requests: usize, refuse: &'static str) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local api");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..requests {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let request = String::from_utf8_lossy(&request).into_owned();
            let line = request.lines().next().unwrap_or_default().to_string();

            let (status, body) = if line.contains(refuse) {
                (
                    "409 Conflict",
                    r#"{"success":false,"errors":[{"code":8000034,"message":"deployment is locked"}]}"#,
                )
            } else {
                ("200 OK", r#"{"success":true,"errors":[],"result":null}"#)
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
            seen.push(line);
        }
        seen
    });

    (base, handle)
}

#[test]
fn mixed_outcomes_still_exit_zero() {
    const A: &str = "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa";
    const B: &str = "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb";
    const C: &str = "cccccccc-cccc-cccc-cccc-cccccccccccc";
    const D: &str = "dddddddd-dddd-dddd-dddd-dddddddddddd";

    let env = TestEnv::new();
    let (base, server) = serve_deletes(3, C);
    env.write_config(&format!("api-base = \"{base}\"\nrequest-timeout-secs = 5\n"));
    let wrangler = env.wrangler(&format!(
        "│ {A} │ Production │\n│ {B} │ Preview    │\n│ {C} │ Preview    │\n│ {D} │ Preview    │"
    ));

    env.authed(&wrangler)
        .args(["--project", "manuscripts"])
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .assert()
        .success()
        .stdout(contains(format!("✓ Deleted {B}")))
        .stdout(contains(format!("✗ Failed to delete {C}")))
        .stdout(contains(format!("✓ Deleted {D}")))
        .stdout(contains("Deleted: 2"))
        .stdout(contains("Failed:  1"))
        .stdout(contains(format!("Kept:    1 ({A})")))
        .stderr(contains(C))
        .stderr(contains("deployment is locked"))
        .stdout(contains(TOKEN).not())
        .stderr(contains(TOKEN).not());

    let seen = server.join().expect("server thread");
    let expected: Vec<String> = [B, C, D]
        .iter()
        .map(|id| {
            format!(
                "DELETE /accounts/acct-integration/pages/projects/manuscripts/deployments/{id} HTTP/1.1"
            )
        })
        .collect();
    assert_eq!(seen, expected);
}
