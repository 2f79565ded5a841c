use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "schemaVersion": db::schema_version(),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "user": state.session.as_ref().map(|s| s.username.clone()),
        }),
    )
}

/// Open (creating if needed) the workspace and run schema initialization.
/// Switching workspace ends the current session.
pub fn open_workspace(state: &mut AppState, path: PathBuf) -> anyhow::Result<()> {
    let conn = db::open_db(&path, state.init)?;
    state.db = Some(conn);
    state.workspace = Some(path);
    state.session = None;
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, path.clone()) {
        Ok(()) => {
            info!(path = %path.display(), "workspace selected");
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => {
            error!(path = %path.display(), error = ?e, "workspace open failed");
            err(&req.id, "db_open_failed", format!("{e:#}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
