use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::with_session;
use crate::ipc::params::{get_date_or_today, get_opt_i64, get_required_date, get_required_i64, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{DateRange, Session};
use crate::records::attendance;
use rusqlite::Connection;
use serde_json::{json, Value};

fn attendance_mark(conn: &Connection, session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_i64(params, "studentId")?;
    let status = get_required_str(params, "status")?;
    let date = get_date_or_today(params, "date")?;
    let rec = attendance::mark_attendance(conn, session, student_id, date, &status)?;
    Ok(json!({ "record": rec }))
}

fn attendance_get(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_i64(params, "studentId")?;
    let date = get_date_or_today(params, "date")?;
    Ok(json!({ "record": attendance::get_attendance(conn, student_id, date)? }))
}

fn attendance_list(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let range = DateRange::new(
        get_required_date(params, "from")?,
        get_required_date(params, "to")?,
    );
    Ok(json!({ "records": attendance::list_attendance(conn, range)? }))
}

fn attendance_recent(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let days = match get_opt_i64(params, "days")? {
        None => attendance::RECENT_DAYS,
        Some(d) if d >= 0 => d as u64,
        Some(_) => return Err(HandlerErr::bad_params("days must not be negative")),
    };
    let today = get_date_or_today(params, "today")?;
    let entries = attendance::recent_attendance(conn, today, days)?;
    Ok(json!({ "entries": entries }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(with_session(state, req, attendance_mark)),
        "attendance.get" => Some(with_session(state, req, attendance_get)),
        "attendance.list" => Some(with_session(state, req, attendance_list)),
        "attendance.recent" => Some(with_session(state, req, attendance_recent)),
        _ => None,
    }
}
