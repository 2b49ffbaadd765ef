//! Common test utilities for minitasks integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/minitasks/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `workspace_dir`: Acts as the workspace the user runs `mt` in
/// - `data_dir`: Holds minitasks data (via `MT_DATA_DIR` env var)
///
/// The `mt()` method returns a `Command` that sets `MT_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub workspace_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            workspace_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize storage.
    pub fn init() -> Self {
        let env = Self::new();
        env.mt().args(["system", "init"]).assert().success();
        env
    }

    /// Get a Command for the mt binary with isolated data directory.
    pub fn mt(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_mt"));
        cmd.current_dir(self.workspace_dir.path());
        cmd.env("MT_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Run an mt command expecting success and parse its JSON output.
    pub fn mt_json(&self, args: &[&str]) -> serde_json::Value {
        let assert = self.mt().args(args).assert().success();
        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("invalid JSON from `mt {}`: {}\n{}", args.join(" "), e, stdout))
    }

    /// Get the path to the workspace directory.
    pub fn path(&self) -> &std::path::Path {
        self.workspace_dir.path()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
