pub mod attendance;
pub mod auth;
pub mod backup;
pub mod core;
pub mod dashboard;
pub mod exams;
pub mod fees;
pub mod students;

use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Session;
use rusqlite::Connection;

/// Run `f` against the open workspace on behalf of the logged-in user.
pub(crate) fn with_session<F>(state: &AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&Connection, &Session, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "unauthorized", "log in first", None);
    };
    match f(conn, session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}
