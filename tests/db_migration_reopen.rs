use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar_with(seed_sample: bool) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .env_remove("SCHOOLD_WORKSPACE")
        .env("SCHOOLD_SEED_SAMPLE", if seed_sample { "true" } else { "false" })
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_sidecar_with(false)
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value["error"]["code"].as_str().unwrap_or("unknown").to_string()
}

fn open_and_login(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, workspace: &Path) {
    let _ = request_ok(
        stdin,
        reader,
        "open",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "login",
        "auth.login",
        json!({ "username": "admin", "password": "admin" }),
    );
}

fn user_version(workspace: &Path) -> i64 {
    let conn = rusqlite::Connection::open(workspace.join("school.sqlite3")).expect("open sqlite");
    conn.query_row("PRAGMA user_version", [], |r| r.get(0))
        .expect("user_version")
}

#[test]
fn reopening_workspace_keeps_data_and_schema_version() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_and_login(&mut stdin, &mut reader, workspace.path());

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "create",
        "students.create",
        json!({ "firstName": "Ola", "admissionNo": "RE1" }),
    );
    let health = request_ok(&mut stdin, &mut reader, "health", "health", json!({}));
    assert_eq!(health["user"], json!("admin"));

    // Selecting the same workspace again re-runs initialization.
    open_and_login(&mut stdin, &mut reader, workspace.path());
    let users = request_ok(&mut stdin, &mut reader, "users", "users.list", json!({}));
    assert_eq!(users["users"].as_array().map(|u| u.len()), Some(1));
    let students = request_ok(&mut stdin, &mut reader, "students", "students.list", json!({}));
    assert_eq!(students["students"].as_array().map(|s| s.len()), Some(1));

    drop(stdin);
    let _ = child.wait();

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_and_login(&mut stdin, &mut reader, workspace.path());
    let health = request_ok(&mut stdin, &mut reader, "health", "health", json!({}));
    assert_eq!(health["schemaVersion"], json!(2));
    drop(stdin);
    let _ = child.wait();

    assert_eq!(user_version(workspace.path()), 2);
}

#[test]
fn sample_students_are_seeded_once_when_enabled() {
    let workspace = tempfile::tempdir().expect("temp dir");
    for _ in 0..2 {
        let (mut child, mut stdin, mut reader) = spawn_sidecar_with(true);
        open_and_login(&mut stdin, &mut reader, workspace.path());
        let students = request_ok(&mut stdin, &mut reader, "list", "students.list", json!({}));
        let list = students["students"].as_array().expect("students");
        assert_eq!(list.len(), 3);
        let mut adms: Vec<&str> = list.iter().filter_map(|s| s["admissionNo"].as_str()).collect();
        adms.sort();
        assert_eq!(adms, vec!["ADM001", "ADM002", "ADM003"]);
        drop(stdin);
        let _ = child.wait();
    }
}

#[test]
fn newer_schema_is_refused() {
    let workspace = tempfile::tempdir().expect("temp dir");
    {
        let conn =
            rusqlite::Connection::open(workspace.path().join("school.sqlite3")).expect("open sqlite");
        conn.execute_batch("PRAGMA user_version = 99").expect("bump version");
    }
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let code = request_err(
        &mut stdin,
        &mut reader,
        "open",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    assert_eq!(code, "db_open_failed");
    drop(stdin);
    let _ = child.wait();
}
