use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::core::open_workspace;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, warn};

fn path_param(req: &Request, key: &str) -> Option<PathBuf> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

/// Workspace path and session gate shared by export and import.
fn require_session(state: &AppState, req: &Request) -> Result<PathBuf, serde_json::Value> {
    let Some(workspace) = state.workspace.clone().filter(|_| state.db.is_some()) else {
        return Err(err(&req.id, "no_workspace", "select a workspace first", None));
    };
    if state.session.is_none() {
        return Err(err(&req.id, "unauthorized", "log in first", None));
    }
    Ok(workspace)
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let workspace_path = match require_session(state, req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let Some(out) = path_param(req, "outPath") else {
        return err(&req.id, "bad_params", "missing outPath", None);
    };

    match backup::export_workspace_bundle(&workspace_path, &out) {
        Ok(export) => ok(
            &req.id,
            json!({
                "path": out.to_string_lossy(),
                "bundleFormat": export.bundle_format,
                "entryCount": export.entry_count,
                "dbSha256": export.db_sha256,
            }),
        ),
        Err(e) => {
            error!(out = %out.display(), error = ?e, "backup export failed");
            err(
                &req.id,
                "backup_failed",
                format!("{e:#}"),
                Some(json!({ "path": out.to_string_lossy() })),
            )
        }
    }
}

/// Replaces the workspace database. The session ends either way since the
/// imported users table may not contain the caller.
fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let workspace_path = match require_session(state, req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let Some(src) = path_param(req, "inPath") else {
        return err(&req.id, "bad_params", "missing inPath", None);
    };
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "backup file not found",
            Some(json!({ "path": src.to_string_lossy() })),
        );
    }

    // Drop open handle before replacing file.
    state.db = None;

    let imported = backup::import_workspace_bundle(&src, &workspace_path);
    let reopened = open_workspace(state, workspace_path.clone());

    let import = match imported {
        Ok(v) => v,
        Err(e) => {
            error!(from = %src.display(), error = ?e, "backup import failed");
            if let Err(reopen) = reopened {
                warn!(error = ?reopen, "could not reopen workspace after failed import");
            }
            return err(
                &req.id,
                "backup_failed",
                format!("{e:#}"),
                Some(json!({ "path": src.to_string_lossy() })),
            );
        }
    };
    if let Err(e) = reopened {
        return err(&req.id, "db_open_failed", format!("{e:#}"), None);
    }

    ok(
        &req.id,
        json!({
            "workspacePath": workspace_path.to_string_lossy(),
            "bundleFormatDetected": import.bundle_format_detected,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
