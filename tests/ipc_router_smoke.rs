use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .env_remove("SCHOOLD_WORKSPACE")
        .env_remove("SCHOOLD_SEED_SAMPLE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
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
    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(resp: &serde_json::Value) -> &str {
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false), "{}", resp);
    resp.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
}

#[test]
fn health_reports_schema_version_without_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(resp["ok"], json!(true));
    assert_eq!(resp["result"]["schemaVersion"], json!(2));
    assert!(resp["result"]["workspacePath"].is_null());
    assert!(resp["result"]["user"].is_null());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn workspace_and_session_gates() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(&mut stdin, &mut reader, "1", "students.list", json!({}));
    assert_eq!(error_code(&resp), "no_workspace");

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    assert_eq!(resp["ok"], json!(true), "{}", resp);

    let resp = request(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(error_code(&resp), "unauthorized");
    let resp = request(&mut stdin, &mut reader, "4", "dashboard.summary", json!({}));
    assert_eq!(error_code(&resp), "unauthorized");

    let resp = request(
        &mut stdin,
        &mut reader,
        "5",
        "auth.login",
        json!({ "username": "admin", "password": "wrong" }),
    );
    assert_eq!(error_code(&resp), "unauthorized");

    let resp = request(
        &mut stdin,
        &mut reader,
        "6",
        "auth.login",
        json!({ "username": "admin", "password": "admin" }),
    );
    assert_eq!(resp["ok"], json!(true), "{}", resp);
    assert_eq!(resp["result"]["session"]["username"], json!("admin"));
    assert_eq!(resp["result"]["session"]["role"], json!("admin"));

    let resp = request(&mut stdin, &mut reader, "7", "students.list", json!({}));
    assert_eq!(resp["ok"], json!(true), "{}", resp);
    assert_eq!(resp["result"]["students"], json!([]));

    let resp = request(&mut stdin, &mut reader, "8", "auth.logout", json!({}));
    assert_eq!(resp["result"]["loggedOut"], json!(true));
    let resp = request(&mut stdin, &mut reader, "9", "auth.whoami", json!({}));
    assert_eq!(error_code(&resp), "unauthorized");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "admin" }),
    );

    let methods = [
        "auth.whoami",
        "users.list",
        "students.list",
        "students.roster",
        "attendance.recent",
        "fees.list",
        "payments.list",
        "exams.list",
        "dashboard.summary",
    ];
    for (i, method) in methods.iter().enumerate() {
        let id = format!("m{}", i);
        let resp = request(&mut stdin, &mut reader, &id, method, json!({}));
        assert_eq!(resp["ok"], json!(true), "{} failed: {}", method, resp);
    }

    let resp = request(&mut stdin, &mut reader, "x", "grades.compute", json!({}));
    assert_eq!(error_code(&resp), "not_implemented");

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let resp = read_response(&mut reader);
    assert_eq!(error_code(&resp), "bad_json");

    let resp = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(resp["ok"], json!(true));

    drop(stdin);
    let _ = child.wait();
}
