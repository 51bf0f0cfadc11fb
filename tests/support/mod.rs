use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// An isolated data directory plus an absent config file.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir().join("records.json")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("daybook").expect("binary");
        cmd.env("DAYBOOK_DATA_DIR", self.data_dir())
            .env("DAYBOOK_CONFIG", self.dir.path().join("config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--json`, assert success and return the `data` payload.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run daybook");
        assert!(
            output.status.success(),
            "daybook {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        let payload: Value = serde_json::from_slice(&output.stdout).expect("json output");
        assert_eq!(payload["status"], "success");
        payload["data"].clone()
    }

    pub fn add(&self, title: &str) -> String {
        let data = self.json(&["add", title]);
        data["id"].as_str().expect("id").to_string()
    }
}
