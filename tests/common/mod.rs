#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub work: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        let work = tmp.path().join("work");
        fs::create_dir_all(&home).expect("create isolated home");
        fs::create_dir_all(&work).expect("create work dir");
        Self {
            _tmp: tmp,
            home,
            work,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("fieldplan");
        cmd.env("HOME", &self.home)
            .env_remove("FIELDPLAN_LOG")
            .current_dir(&self.work);
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    /// Runs a command expected to fail and returns its JSON error envelope.
    pub fn run_json_err(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json error output")
    }

    pub fn login_admin(&self) {
        let v = self.run_json(&["login", "--username", "admin", "--password", "admin123"]);
        assert_eq!(v["data"]["role"], "coordonator");
    }

    pub fn login(&self, username: &str, password: &str) {
        self.run_json(&["login", "--username", username, "--password", password]);
    }

    pub fn state_path(&self) -> PathBuf {
        self.home.join(".config/fieldplan/state.json")
    }

    /// Adds an agent and returns its id.
    pub fn add_agent(&self, name: &str) -> String {
        let v = self.run_json(&["agent", "add", name]);
        v["data"]["id"].as_str().expect("agent id").to_string()
    }

    pub fn add_client(&self, name: &str, county: &str) -> String {
        let v = self.run_json(&["client", "add", name, "--county", county]);
        v["data"]["id"].as_str().expect("client id").to_string()
    }
}
