#![allow(dead_code)]

pub mod jira;

use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Environment variables that would leak a developer's real Jira setup.
const SCRUBBED_ENV: [&str; 8] = [
    "JIRA_URL",
    "JIRA_EMAIL",
    "JIRA_API_TOKEN",
    "JM_JIRA_URL",
    "JM_JIRA_EMAIL",
    "JM_JIRA_TOKEN",
    "JM_WORKERS",
    "JM_TIMEOUT",
];

#[derive(Debug)]
pub struct JmRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl JmRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// The `error` object printed to stderr for failures.
    pub fn error_json(&self) -> serde_json::Value {
        let payload = extract_json_payload(&self.stderr);
        let value: serde_json::Value = serde_json::from_str(&payload)
            .unwrap_or_else(|e| panic!("stderr is not JSON ({e}): {}", self.stderr));
        value["error"].clone()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&extract_json_payload(&self.stdout))
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", self.stdout))
    }
}

/// A temp directory holding the app home (`JM_HOME`) and a scratch area.
pub struct JmWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub home: PathBuf,
    pub log_dir: PathBuf,
}

impl JmWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let home = root.join("jm_home");
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            home,
            log_dir,
        }
    }
}

pub fn run_jm<I, S>(workspace: &JmWorkspace, args: I, label: &str) -> JmRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_jm_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_jm_with_env<I, S, E, K, V>(
    workspace: &JmWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> JmRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jm"));
    cmd.current_dir(&workspace.root);
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    cmd.args(args);
    cmd.env("JM_HOME", &workspace.home);
    cmd.env("HOME", &workspace.root);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "jira_metrics=debug");
    cmd.envs(env_vars);

    let start = Instant::now();
    let output = cmd.output().expect("run jm");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nduration: {duration:?}\nstatus: {}\nargs: {:?}\n\nstdout:\n{stdout}\n\nstderr:\n{stderr}\n",
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
    );
    fs::write(&log_path, log_body).expect("write log");

    JmRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// The first JSON document in `text`, skipping log lines before it.
pub fn extract_json_payload(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    text.trim().to_string()
}
