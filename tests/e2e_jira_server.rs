//! Full command runs against a mock Jira site.

mod common;

use common::jira::{BASIC_AUTH, MockJira};
use common::{JmWorkspace, run_jm};
use insta::assert_snapshot;
use serde_json::{Value, json};
use std::fs;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn args(jira: &MockJira, command: &[&str]) -> Vec<String> {
    let mut all: Vec<String> = command.iter().map(|s| (*s).to_string()).collect();
    all.extend(jira.auth_args());
    all
}

#[test]
fn e2e_login_saves_credentials_for_later_runs() {
    let jira = MockJira::start();
    jira.mount(
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "displayName": "Ana Lima",
                "emailAddress": "me@example.com",
                "accountId": "5b10ac8d82e05b22cc7d4ef5"
            }))),
    );
    let workspace = JmWorkspace::new();

    let login = run_jm(&workspace, args(&jira, &["login", "--json"]), "login");
    assert!(login.status.success(), "login failed: {}", login.stderr);
    assert_eq!(login.json()["verified"], true);

    let saved: Value = serde_json::from_str(
        &fs::read_to_string(workspace.home.join("credentials.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["base_url"], jira.uri());
    assert_eq!(saved["api_token"], "secret");

    let whoami = run_jm(&workspace, ["whoami", "--json"], "whoami_saved");
    assert!(whoami.status.success(), "whoami failed: {}", whoami.stderr);
    assert_eq!(whoami.json()["displayName"], "Ana Lima");

    let plain = run_jm(&workspace, ["whoami"], "whoami_plain");
    assert!(plain.stdout.contains("Name: Ana Lima"), "got: {}", plain.stdout);
}

#[test]
fn e2e_login_with_rejected_token_fails() {
    let jira = MockJira::start();
    jira.mount(
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .respond_with(ResponseTemplate::new(401)),
    );
    let workspace = JmWorkspace::new();

    let login = run_jm(&workspace, args(&jira, &["login"]), "login_rejected");
    assert!(!login.status.success());
    assert_eq!(login.code(), Some(2));
    assert_eq!(login.error_json()["code"], "AUTH_FAILED");
    assert!(!workspace.home.join("credentials.json").exists());
}

#[test]
fn e2e_search_lists_keys() {
    let jira = MockJira::start();
    jira.mount_ops_project();
    let workspace = JmWorkspace::new();

    let run = run_jm(
        &workspace,
        args(&jira, &["search", "--jql", "project = OPS", "--json"]),
        "search",
    );
    assert!(run.status.success(), "search failed: {}", run.stderr);
    let value = run.json();
    assert_eq!(value["total"], 2);
    assert_eq!(value["keys"], json!(["OPS-1", "OPS-2"]));
}

#[test]
fn e2e_export_csv_to_stdout() {
    let jira = MockJira::start();
    jira.mount_ops_project();
    let workspace = JmWorkspace::new();

    let run = run_jm(
        &workspace,
        args(
            &jira,
            &[
                "export",
                "csv",
                "--jql",
                "project = OPS",
                "--field",
                "Summary",
                "--rule",
                "Approved=Review>Done",
                "--comment-count",
                "--commenter-count",
            ],
        ),
        "export_csv",
    );
    assert!(run.status.success(), "export failed: {}", run.stderr);

    let mut lines = run.stdout.lines();
    assert_eq!(
        lines.next(),
        Some("key,Summary,Approved,comment_count,commenter_count")
    );
    assert_eq!(lines.next(), Some("OPS-1,Rotate certificates,1,2,2"));
    assert_eq!(lines.next(), Some("OPS-2,Update runbook,0,0,0"));
}

#[test]
fn e2e_export_csv_with_saved_profile_to_file() {
    let jira = MockJira::start();
    jira.mount_ops_project();
    let workspace = JmWorkspace::new();

    let save = run_jm(
        &workspace,
        ["profile", "save", "tis", "--field", "summary", "--time-in-status"],
        "profile_save",
    );
    assert!(save.status.success(), "profile save failed: {}", save.stderr);

    let output = workspace.root.join("out").join("ops.csv");
    let run = run_jm(
        &workspace,
        args(
            &jira,
            &[
                "export",
                "csv",
                "--jql",
                "project = OPS",
                "--profile",
                "tis",
                "-o",
                output.to_str().unwrap(),
                "--json",
            ],
        ),
        "export_csv_profile",
    );
    assert!(run.status.success(), "export failed: {}", run.stderr);
    assert_eq!(run.json()["rows"], 2);

    let csv = fs::read_to_string(&output).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("key,Summary,TIS: "), "got: {header}");
    assert!(header.contains("TIS: Review"));

    let again = run_jm(
        &workspace,
        args(
            &jira,
            &["export", "csv", "--jql", "x", "--profile", "tis", "-o", output.to_str().unwrap()],
        ),
        "export_csv_exists",
    );
    assert_eq!(again.error_json()["code"], "OUTPUT_EXISTS");
}

#[test]
fn e2e_export_json_writes_issue_files() {
    let jira = MockJira::start();
    jira.mount_ops_project();
    let workspace = JmWorkspace::new();
    let dir = workspace.root.join("dump");

    let run = run_jm(
        &workspace,
        args(
            &jira,
            &["export", "json", "--jql", "project = OPS", "-o", dir.to_str().unwrap(), "--json"],
        ),
        "export_json",
    );
    assert!(run.status.success(), "export failed: {}", run.stderr);
    assert_eq!(run.json()["written"].as_array().map(Vec::len), Some(2));

    let exported: Value =
        serde_json::from_str(&fs::read_to_string(dir.join("OPS-1.json")).unwrap()).unwrap();
    assert_eq!(exported["key"], "OPS-1");
    let markdown = fs::read_to_string(dir.join("OPS-1.md")).unwrap();
    assert!(markdown.contains("**edge**"), "got: {markdown}");
}

#[test]
fn e2e_timeline_report_then_recolor() {
    let jira = MockJira::start();
    jira.mount_ops_project();
    let workspace = JmWorkspace::new();
    let report = workspace.root.join("timeline.html");

    let run = run_jm(
        &workspace,
        args(
            &jira,
            &[
                "timeline",
                "--jql",
                "project = OPS",
                "--status",
                "In Progress=1",
                "--status",
                "Review=2",
                "--color",
                "Review=#aa00aa",
                "--end",
                "2024-03-10",
                "-o",
                report.to_str().unwrap(),
                "--save-config",
                "ops",
                "--json",
            ],
        ),
        "timeline",
    );
    assert!(run.status.success(), "timeline failed: {}", run.stderr);
    let summary = run.json();
    assert_eq!(summary["issues"], 2);
    assert_eq!(summary["statuses"], json!(["In Progress", "Review"]));

    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("OPS-1"));
    assert!(html.contains("#AA00AA"));
    assert!(html.contains("status-segment"));

    let saved = workspace.home.join("saved_timeline_configs").join("ops.json");
    assert!(saved.exists());
    assert!(workspace.home.join("timeline_last_config.json").exists());

    let recolor = run_jm(
        &workspace,
        [
            "recolor",
            report.to_str().unwrap(),
            "--color",
            "Review=#123456",
            "--json",
        ],
        "recolor",
    );
    assert!(recolor.status.success(), "recolor failed: {}", recolor.stderr);
    assert!(recolor.json()["segments"].as_u64().unwrap() >= 1);
    let recolored = fs::read_to_string(&report).unwrap();
    assert!(recolored.contains("background-color: #123456"));
}

#[test]
fn e2e_timeline_reuses_last_configuration() {
    let jira = MockJira::start();
    jira.mount_ops_project();
    let workspace = JmWorkspace::new();

    let first = run_jm(
        &workspace,
        args(
            &jira,
            &["timeline", "--project", "OPS", "--status", "In Progress=1", "--end", "2024-03-10"],
        ),
        "timeline_first",
    );
    assert!(first.status.success(), "timeline failed: {}", first.stderr);

    let last: Value = serde_json::from_str(
        &fs::read_to_string(workspace.home.join("timeline_last_config.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(last["jql"], "project = \"OPS\" ORDER BY created ASC");

    let second = run_jm(
        &workspace,
        args(&jira, &["timeline", "--last", "-o", "again.html", "--json"]),
        "timeline_last",
    );
    assert!(second.status.success(), "timeline --last failed: {}", second.stderr);
    assert_eq!(second.json()["statuses"], json!(["In Progress"]));
    assert!(workspace.root.join("again.html").exists());
}

#[test]
fn e2e_sprint_by_id_writes_transitions() {
    let jira = MockJira::start();
    jira.get_json(
        "/rest/agile/1.0/sprint/7",
        json!({
            "id": 7,
            "name": "Sprint 7",
            "state": "closed",
            "startDate": "2024-03-04T00:00:00.000Z",
            "endDate": "2024-03-08T00:00:00.000Z"
        }),
    );
    jira.get_json(
        "/rest/agile/1.0/sprint/7/issue",
        json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 1,
            "issues": [common::jira::fixture("issue_ops_1.json")]
        }),
    );
    let workspace = JmWorkspace::new();

    let run = run_jm(&workspace, args(&jira, &["sprint", "--sprint-id", "7"]), "sprint");
    assert!(run.status.success(), "sprint failed: {}", run.stderr);

    let lines: Vec<&str> = run.stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].ends_with(",1,0,4,0.0"));
    assert_snapshot!(run.stdout.replace("\r\n", "\n"), @r"
    issue_key,from_status,to_status,transition_date,sprint_day,days_from_sprint_start,days_to_sprint_end,sprint_progress_percent
    OPS-1,To Do,In Progress,2024-03-04T12:00:00+00:00,1,0,4,0.0
    OPS-1,In Progress,Review,2024-03-05T12:00:00+00:00,2,1,3,25.0
    OPS-1,Review,Done,2024-03-06T12:00:00+00:00,3,2,2,50.0
    ");
}

#[test]
fn e2e_sprint_without_dates_is_a_sprint_error() {
    let jira = MockJira::start();
    jira.get_json(
        "/rest/agile/1.0/sprint/9",
        json!({"id": 9, "name": "Future", "state": "future"}),
    );
    let workspace = JmWorkspace::new();

    let run = run_jm(&workspace, args(&jira, &["sprint", "--sprint-id", "9"]), "sprint_future");
    assert!(!run.status.success());
    assert_eq!(run.code(), Some(5));
    assert_eq!(run.error_json()["code"], "SPRINT_ERROR");
}
