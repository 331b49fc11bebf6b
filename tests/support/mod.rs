use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".bytecraft.toml", contents)
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("bytecraft_db.json")
    }

    pub fn read_db_raw(&self) -> String {
        fs::read_to_string(self.db_path()).expect("read stored document")
    }

    pub fn read_db(&self) -> Value {
        serde_json::from_str(&self.read_db_raw()).expect("parse stored document")
    }

    /// `bytecraft` pointed at this data directory
    pub fn cmd(&self) -> Command {
        let mut cmd = bytecraft_cmd();
        cmd.arg("--data-dir").arg(self.path());
        cmd.current_dir(self.path());
        cmd
    }

    /// Run with `--json` and return the envelope
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run bytecraft");
        assert!(
            output.status.success(),
            "bytecraft {args:?} failed: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }
}

pub fn bytecraft_cmd() -> Command {
    let mut cmd = Command::cargo_bin("bytecraft").expect("binary");
    cmd.env_remove("BYTECRAFT_DATA_DIR");
    cmd.env_remove("RUST_LOG");
    cmd
}
