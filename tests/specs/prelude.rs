//! Test helpers shared by the workspace-level behavioral specs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Resolves a binary built into this workspace's `target/debug`,
/// falling back to the directory the test binary itself was built into,
/// since `CARGO_MANIFEST_DIR` can go stale under some coverage /
/// worktree setups.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

pub fn brummer_binary() -> PathBuf {
    binary_path("brummer")
}

fn brummerd_binary() -> PathBuf {
    binary_path("brummerd")
}

/// An isolated `brummerd` instance, its state directory, and a handle to
/// the child process. Killed and its state directory removed on drop.
pub struct Daemon {
    child: Child,
    state_dir: tempfile::TempDir,
}

impl Daemon {
    /// Spawns `brummerd` with `BRUMMER_STATE_DIR` pointed at a fresh
    /// temporary directory and waits for its control socket to appear.
    pub fn spawn() -> Self {
        let state_dir = tempfile::tempdir().expect("tempdir");
        let child = Command::new(brummerd_binary())
            .env("BRUMMER_STATE_DIR", state_dir.path())
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("brummerd should spawn");

        let daemon = Self { child, state_dir };
        let socket = daemon.socket_path();
        let ready = wait_for(5_000, || socket.exists());
        assert!(ready, "brummerd did not create its control socket in time");
        daemon
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn socket_path(&self) -> PathBuf {
        self.state_dir.path().join("brummer.sock")
    }

    /// Runs the `brummer` CLI against this daemon's socket.
    pub fn cli(&self) -> CliBuilder {
        CliBuilder::new(self.socket_path())
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub struct CliBuilder {
    socket: PathBuf,
    args: Vec<String>,
}

impl CliBuilder {
    fn new(socket: PathBuf) -> Self {
        Self { socket, args: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(brummer_binary());
        cmd.arg("--socket").arg(&self.socket);
        cmd.args(&self.args);
        cmd
    }

    pub fn run(self) -> RunAssert {
        let output = self.command().output().expect("brummer should run");
        RunAssert { output }
    }

    pub fn passes(self) -> RunAssert {
        let assertion = self.run();
        assert!(
            assertion.output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            assertion.output.status.code(),
            assertion.stdout(),
            assertion.stderr()
        );
        assertion
    }

    pub fn fails(self) -> RunAssert {
        let assertion = self.run();
        assert!(
            !assertion.output.status.success(),
            "expected command to fail, but it passed\nstdout: {}",
            assertion.stdout()
        );
        assertion
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{}'\nstdout: {}", expected, stdout);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{}'\nstderr: {}", expected, stderr);
        self
    }
}

/// Polls `condition` every 10ms until it returns true or `timeout_ms`
/// elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}
