//! End-to-end tests for `brdemon serve` over stdio
//!
//! Run with: cargo test --test serve_protocol

#![cfg(unix)]

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use brdemon_daemon::test_utils::{write_fake_tool, write_pubspec};

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

struct Serve {
    child: Child,
    stdin: ChildStdin,
    events: Lines<BufReader<ChildStdout>>,
}

impl Serve {
    fn spawn(project: &Path, data_dir: &Path, dart: &Path, flutter: &Path) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_brdemon"))
            .arg("--project")
            .arg(project)
            .arg("serve")
            .env("XDG_DATA_HOME", data_dir)
            .env("BRDEMON_COMMAND", "dart")
            .env("BRDEMON_DART_PATH", dart)
            .env("BRDEMON_FLUTTER_PATH", flutter)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn brdemon");

        let stdin = child.stdin.take().unwrap();
        let events = BufReader::new(child.stdout.take().unwrap()).lines();
        Self {
            child,
            stdin,
            events,
        }
    }

    async fn send(&mut self, line: &str) {
        self.stdin
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
        self.stdin.flush().await.unwrap();
    }

    /// Read events until one with the given tag arrives
    async fn expect_event(&mut self, tag: &str) -> Value {
        tokio::time::timeout(EVENT_TIMEOUT, async {
            loop {
                let line = self
                    .events
                    .next_line()
                    .await
                    .unwrap()
                    .unwrap_or_else(|| panic!("stdout closed before a {} event", tag));
                let value: Value = serde_json::from_str(&line)
                    .unwrap_or_else(|e| panic!("not NDJSON: {} ({})", line, e));
                assert!(value["timestamp"].is_number(), "missing timestamp: {}", line);
                if value["event"] == tag {
                    return value;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for a {} event", tag))
    }

    async fn quit(mut self) {
        self.send("quit").await;
        let status = tokio::time::timeout(EVENT_TIMEOUT, self.child.wait())
            .await
            .expect("serve did not exit")
            .unwrap();
        assert!(status.success());
    }
}

#[tokio::test]
async fn test_build_reports_success_notification() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("app");
    std::fs::create_dir_all(&project).unwrap();
    write_pubspec(&project, false);
    let dart = write_fake_tool(
        temp.path(),
        "dart",
        "echo '[INFO] 5/10 actions completed.'\necho '[INFO] Succeeded after 0.1s'\nexit 0\n",
    );
    let flutter = write_fake_tool(temp.path(), "flutter", "exit 1\n");

    let mut serve = Serve::spawn(&project, temp.path(), &dart, &flutter);
    let status = serve.expect_event("status").await;
    assert_eq!(status["state"], "idle");
    assert_eq!(status["label"], "Watch");

    serve.send("build").await;
    let progress = serve.expect_event("progress").await;
    assert_eq!(progress["message"], "Initializing ...");
    let progress = serve.expect_event("progress").await;
    assert_eq!(progress["percent"], 50);

    let notification = serve.expect_event("notification").await;
    assert_eq!(notification["level"], "info");
    assert_eq!(notification["message"], "[INFO] Succeeded after 0.1s");

    serve.send("reload").await;
    let error = serve.expect_event("error").await;
    assert_eq!(error["message"], "Unknown command: reload");
    assert_eq!(error["fatal"], false);

    serve.quit().await;
}

#[tokio::test]
async fn test_build_remediation_prompt_is_answered_over_stdin() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("app");
    std::fs::create_dir_all(&project).unwrap();
    write_pubspec(&project, false);
    let dart = write_fake_tool(
        temp.path(),
        "dart",
        "echo 'Could not find a file named \"pubspec.yaml\"' >&2\nexit 66\n",
    );
    let flutter = write_fake_tool(temp.path(), "flutter", "echo 'built with flutter'\nexit 0\n");

    let mut serve = Serve::spawn(&project, temp.path(), &dart, &flutter);
    serve.send("build").await;

    let failed = serve.expect_event("notification").await;
    assert_eq!(failed["level"], "error");

    let prompt = serve.expect_event("prompt").await;
    assert_eq!(prompt["kind"], "offer");
    assert_eq!(prompt["action"], "Switch to flutter");
    let id = prompt["id"].as_u64().unwrap();
    serve.send(&format!("answer {} yes", id)).await;

    let done = serve.expect_event("notification").await;
    assert_eq!(done["level"], "info");
    assert_eq!(done["message"], "built with flutter");

    let config = std::fs::read_to_string(project.join(".brdemon/config.toml")).unwrap();
    assert!(config.contains("command_to_use = \"flutter\""));

    serve.quit().await;
}

#[tokio::test]
async fn test_end_of_input_exits_cleanly() {
    let temp = TempDir::new().unwrap();
    write_pubspec(temp.path(), false);
    let dart = write_fake_tool(temp.path(), "dart", "exit 0\n");

    let mut serve = Serve::spawn(temp.path(), temp.path(), &dart, &dart);
    serve.expect_event("status").await;
    drop(serve.stdin);

    let status = tokio::time::timeout(EVENT_TIMEOUT, serve.child.wait())
        .await
        .expect("serve did not exit on end of input")
        .unwrap();
    assert!(status.success());
}
