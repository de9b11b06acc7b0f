//! Saved queries, export profiles and timeline configurations.

mod common;

use common::{JmWorkspace, run_jm};
use serde_json::Value;

#[test]
fn e2e_query_lifecycle() {
    let workspace = JmWorkspace::new();

    let add = run_jm(
        &workspace,
        [
            "query",
            "add",
            "open-bugs",
            "project = OPS AND type = Bug",
            "--description",
            "Open bugs",
            "--json",
        ],
        "query_add",
    );
    assert!(add.status.success(), "add failed: {}", add.stderr);
    assert_eq!(add.json()["jql"], "project = OPS AND type = Bug");

    let duplicate = run_jm(
        &workspace,
        ["query", "add", "open-bugs", "project = X"],
        "query_add_duplicate",
    );
    assert!(!duplicate.status.success());
    assert_eq!(duplicate.code(), Some(3));
    assert_eq!(duplicate.error_json()["code"], "QUERY_EXISTS");

    let update = run_jm(
        &workspace,
        ["query", "update", "open-bugs", "project = OPS", "--json"],
        "query_update",
    );
    assert!(update.status.success(), "update failed: {}", update.stderr);

    let list = run_jm(&workspace, ["query", "list", "--json"], "query_list");
    assert!(list.status.success());
    let queries = list.json();
    assert_eq!(queries.as_array().map(Vec::len), Some(1));
    assert_eq!(queries[0]["name"], "open-bugs");
    assert_eq!(queries[0]["jql"], "project = OPS");

    let show = run_jm(&workspace, ["query", "show", "open-bugs"], "query_show");
    assert!(show.status.success());
    assert!(show.stdout.contains("JQL: project = OPS"), "got: {}", show.stdout);

    let delete = run_jm(&workspace, ["query", "delete", "open-bugs"], "query_delete");
    assert!(delete.status.success(), "delete failed: {}", delete.stderr);

    let missing = run_jm(&workspace, ["query", "show", "open-bugs"], "query_missing");
    assert!(!missing.status.success());
    assert_eq!(missing.error_json()["code"], "QUERY_NOT_FOUND");
}

#[test]
fn e2e_unknown_saved_query_fails_before_connecting() {
    let workspace = JmWorkspace::new();
    let run = run_jm(
        &workspace,
        ["search", "--query", "nope", "--url", "http://127.0.0.1:9", "--email", "a@b.c", "--token", "t"],
        "search_unknown_query",
    );
    assert!(!run.status.success());
    assert_eq!(run.error_json()["code"], "QUERY_NOT_FOUND");
}

#[test]
fn e2e_profile_lifecycle() {
    let workspace = JmWorkspace::new();

    let save = run_jm(
        &workspace,
        [
            "profile",
            "save",
            "weekly",
            "--field",
            "summary",
            "--field",
            "Story Points",
            "--rule",
            "Reopened=Done>In Progress",
            "--time-in-status",
            "--comment-count",
            "--business-start",
            "09:00",
            "--business-end",
            "17:00",
            "--timezone",
            "Europe/Berlin",
        ],
        "profile_save",
    );
    assert!(save.status.success(), "save failed: {}", save.stderr);

    let file = workspace.home.join("configs").join("weekly.json");
    let stored: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(stored["selected_field_ids"][1], "Story Points");
    assert_eq!(stored["transition_rules"][0]["sequence"][0], "Done");
    assert_eq!(stored["business_hours"]["timezone"], "Europe/Berlin");

    let show = run_jm(&workspace, ["profile", "show", "weekly", "--json"], "profile_show");
    assert!(show.status.success());
    let profile = show.json();
    assert_eq!(profile["name"], "weekly");
    assert_eq!(profile["metrics"]["time_in_status"], true);
    assert_eq!(profile["metrics"]["comment_length"], false);

    let list = run_jm(&workspace, ["profile", "list", "--json"], "profile_list");
    assert_eq!(list.json()["profiles"][0], "weekly");

    let delete = run_jm(&workspace, ["profile", "delete", "weekly"], "profile_delete");
    assert!(delete.status.success());
    assert!(!file.exists());

    let missing = run_jm(&workspace, ["profile", "show", "weekly"], "profile_missing");
    assert_eq!(missing.error_json()["code"], "PROFILE_NOT_FOUND");
}

#[test]
fn e2e_profile_rejects_bad_rule() {
    let workspace = JmWorkspace::new();
    let run = run_jm(
        &workspace,
        ["profile", "save", "bad", "--rule", "OnlyOne=Done"],
        "profile_bad_rule",
    );
    assert!(!run.status.success());
    assert_eq!(run.code(), Some(4));
    assert_eq!(run.error_json()["code"], "VALIDATION_FAILED");
}

#[test]
fn e2e_timeline_config_show_and_delete() {
    let workspace = JmWorkspace::new();
    let dir = workspace.home.join("saved_timeline_configs");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("ops.json"),
        r##"{"config_name":"ops","project":"OPS","jql":"project = OPS","status_order":{"In Progress":"1","Review":2},"status_colors":{"Review":"#112233"}}"##,
    )
    .unwrap();

    let list = run_jm(&workspace, ["timeline-config", "list", "--json"], "tc_list");
    assert!(list.status.success(), "list failed: {}", list.stderr);
    assert_eq!(list.json()["configs"][0], "ops");
    assert_eq!(list.json()["has_last"], false);

    let show = run_jm(&workspace, ["timeline-config", "show", "ops", "--json"], "tc_show");
    assert!(show.status.success(), "show failed: {}", show.stderr);
    let config = show.json();
    assert_eq!(config["status_order"]["In Progress"], 1);
    assert_eq!(config["status_colors"]["Review"], "#112233");

    let last = run_jm(&workspace, ["timeline-config", "show", "last"], "tc_show_last");
    assert_eq!(last.error_json()["code"], "TIMELINE_CONFIG_NOT_FOUND");

    let delete = run_jm(&workspace, ["timeline-config", "delete", "ops"], "tc_delete");
    assert!(delete.status.success());
    let again = run_jm(&workspace, ["timeline-config", "delete", "ops"], "tc_delete_again");
    assert_eq!(again.code(), Some(3));
}
