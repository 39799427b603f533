//! Shared integration-test harness for spawning the `quickdraw` binary as a
//! child process, feeding it driver commands, and reading its JSONL events.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

/// Default timeout for reading a single event from the driver.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A running `quickdraw play` process.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
#[allow(clippy::missing_panics_doc)]
pub struct QuickdrawProcess {
    child: Child,
    stdin: Option<tokio::process::ChildStdin>,
    reader: BufReader<tokio::process::ChildStdout>,
    seen: Vec<Value>,
}

impl QuickdrawProcess {
    /// Spawns `quickdraw play` with extra arguments.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_play(extra: &[&str]) -> Self {
        let mut child = Command::new(binary())
            .arg("--quiet")
            .arg("play")
            .args(extra)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn quickdraw");

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");

        Self {
            child,
            stdin: Some(stdin),
            reader: BufReader::new(stdout),
            seen: Vec::new(),
        }
    }

    /// Runs a one-shot command to completion and returns its output.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        std::process::Command::new(binary())
            .args(args)
            .output()
            .expect("failed to run quickdraw")
    }

    /// Writes one command line to the driver.
    #[allow(clippy::missing_panics_doc)]
    pub async fn send(&mut self, line: &str) {
        let stdin = self.stdin.as_mut().expect("stdin already closed");
        stdin
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("failed to write to stdin");
        stdin.flush().await.expect("failed to flush stdin");
    }

    /// Reads one JSONL event.
    ///
    /// Returns `None` on EOF. Panics on invalid JSON or timeout.
    #[allow(clippy::missing_panics_doc)]
    pub async fn read_event(&mut self, timeout: Duration) -> Option<Value> {
        let mut line = String::new();
        let result = tokio::time::timeout(timeout, async {
            loop {
                line.clear();
                let n = self
                    .reader
                    .read_line(&mut line)
                    .await
                    .expect("read_line I/O error");
                if n == 0 {
                    return None;
                }
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    return Some(
                        serde_json::from_str::<Value>(trimmed)
                            .unwrap_or_else(|e| panic!("invalid JSON event: {e}\nline: {line}")),
                    );
                }
            }
        })
        .await;
        let event = result.expect("timed out waiting for event")?;
        self.seen.push(event.clone());
        Some(event)
    }

    /// Returns the first event matching `pred`, looking at events already
    /// read before reading new ones.
    #[allow(clippy::missing_panics_doc)]
    pub async fn expect_event(&mut self, pred: impl Fn(&Value) -> bool) -> Value {
        if let Some(event) = self.seen.iter().find(|e| pred(e)) {
            return event.clone();
        }
        loop {
            let event = self
                .read_event(DEFAULT_TIMEOUT)
                .await
                .expect("unexpected EOF while waiting for event");
            if pred(&event) {
                return event;
            }
        }
    }

    /// Reads events until one of the given `type` arrives.
    pub async fn expect_type(&mut self, event_type: &str) -> Value {
        self.expect_event(|e| e["type"] == event_type).await
    }

    /// Every event read so far.
    #[must_use]
    pub fn seen(&self) -> &[Value] {
        &self.seen
    }

    /// Closes stdin and drains the remaining events until the process exits.
    #[allow(clippy::missing_panics_doc)]
    pub async fn finish(mut self) -> (Vec<Value>, std::process::ExitStatus) {
        drop(self.stdin.take());
        while self.read_event(DEFAULT_TIMEOUT).await.is_some() {}
        let status = tokio::time::timeout(DEFAULT_TIMEOUT, self.child.wait())
            .await
            .expect("timed out waiting for exit")
            .expect("failed to wait for child");
        (self.seen, status)
    }

    /// Returns the path to a test fixture.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }
}

fn binary() -> &'static str {
    env!("CARGO_BIN_EXE_quickdraw")
}
