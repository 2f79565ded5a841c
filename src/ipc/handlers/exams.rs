use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::with_session;
use crate::ipc::params::{get_required_i64, get_str_or_empty};
use crate::ipc::types::{AppState, Request};
use crate::model::{ExamSlotInput, Session};
use crate::records::exams;
use rusqlite::Connection;
use serde_json::{json, Value};

fn parse_exam_input(params: &Value) -> Result<ExamSlotInput, HandlerErr> {
    Ok(ExamSlotInput {
        exam_title: get_str_or_empty(params, "examTitle")?,
        class_name: get_str_or_empty(params, "className")?,
        subject: get_str_or_empty(params, "subject")?,
        exam_date: get_str_or_empty(params, "examDate")?,
        start_time: get_str_or_empty(params, "startTime")?,
        end_time: get_str_or_empty(params, "endTime")?,
        room: get_str_or_empty(params, "room")?,
    })
}

fn exams_list(conn: &Connection, _session: &Session, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "exams": exams::list_exams(conn)? }))
}

fn exams_create(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let exam = exams::create_exam(conn, &parse_exam_input(params)?)?;
    Ok(json!({ "exam": exam }))
}

fn exams_update(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_i64(params, "examId")?;
    let exam = exams::update_exam(conn, id, &parse_exam_input(params)?)?;
    Ok(json!({ "exam": exam }))
}

fn exams_delete(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_i64(params, "examId")?;
    exams::delete_exam(conn, id)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "exams.list" => Some(with_session(state, req, exams_list)),
        "exams.create" => Some(with_session(state, req, exams_create)),
        "exams.update" => Some(with_session(state, req, exams_update)),
        "exams.delete" => Some(with_session(state, req, exams_delete)),
        _ => None,
    }
}
