use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::with_session;
use crate::ipc::params::get_date_or_today;
use crate::ipc::types::{AppState, Request};
use crate::model::Session;
use crate::records::dashboard;
use rusqlite::Connection;
use serde_json::Value;

fn dashboard_summary(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    // `today` is accepted so the front end (and tests) can pin the clock.
    let today = get_date_or_today(params, "today")?;
    Ok(serde_json::to_value(dashboard::summary(conn, today)?)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(with_session(state, req, dashboard_summary)),
        _ => None,
    }
}
